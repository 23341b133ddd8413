//! Authentication request/response models

use crate::api::models::{is_valid_email, normalize_email, FieldErrors, Validate};
use crate::api::models::BookSummary;
use crate::auth::password::MAX_PASSWORD_BYTES;
use crate::core::error::Result;
use crate::db::models::User;
use serde::{Deserialize, Serialize};

pub const MIN_PASSWORD_BYTES: usize = 8;

fn name_is_valid(name: &str) -> bool {
    (3..=100).contains(&name.trim().chars().count())
}

fn password_is_valid(password: &str) -> bool {
    (MIN_PASSWORD_BYTES..=MAX_PASSWORD_BYTES).contains(&password.len())
}

const NAME_MSG: &str = "name must be between 3 and 100 characters";
const EMAIL_MSG: &str = "email must be a valid email address";
const PASSWORD_MSG: &str = "password must be between 8 and 72 bytes";

/// Register request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check(name_is_valid(&self.name), NAME_MSG);
        errors.check(is_valid_email(&self.email), EMAIL_MSG);
        errors.check(password_is_valid(&self.password), PASSWORD_MSG);
        errors.finish()
    }
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check(is_valid_email(&self.email), EMAIL_MSG);
        errors.check(!self.password.is_empty(), "password is required");
        errors.check(
            self.password.len() <= MAX_PASSWORD_BYTES,
            "password must be at most 72 bytes",
        );
        errors.finish()
    }
}

/// Profile update; an absent or empty password keeps the current one
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
}

impl UpdateProfileRequest {
    /// The new password, if one was actually supplied
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    pub fn email(&self) -> String {
        normalize_email(&self.email)
    }
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check(name_is_valid(&self.name), NAME_MSG);
        errors.check(is_valid_email(&self.email), EMAIL_MSG);
        if let Some(password) = self.new_password() {
            errors.check(password_is_valid(password), PASSWORD_MSG);
        }
        errors.finish()
    }
}

/// User as returned to clients; never carries the password hash
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub books: Option<Vec<BookSummary>>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            token: None,
            books: None,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl UserResponse {
    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_books(mut self, books: Vec<BookSummary>) -> Self {
        self.books = Some(books);
        self
    }
}
