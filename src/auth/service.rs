//! Authentication check
//!
//! Credential lookup and verification, registration and profile changes,
//! written against the [`CredentialStore`] capability so the persistence
//! layer can be swapped out in tests.

use crate::auth::models::{RegisterRequest, UpdateProfileRequest};
use crate::auth::password::PasswordHasher;
use crate::api::models::normalize_email;
use crate::core::error::{Result, ShelfError};
use crate::db::models::User;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

/// Storage of user credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    async fn email_exists(&self, email: &str) -> Result<bool>;

    /// Insert a new user; a duplicate email must fail with `Conflict`
    async fn insert(&self, user: &User) -> Result<()>;

    /// Persist changed fields of an existing user; a taken email must fail with `Conflict`
    async fn update(&self, user: &User) -> Result<()>;
}

/// Result of checking an email/password pair
#[derive(Debug)]
pub enum AuthOutcome {
    Authenticated(User),
    Denied,
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    /// Verified against when the email is unknown, so both denial paths cost one bcrypt check
    dummy_hash: String,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher) -> Result<Self> {
        let dummy_hash = hasher.hash(&Uuid::new_v4().to_string())?;
        Ok(Self {
            store,
            hasher,
            dummy_hash,
        })
    }

    /// Check an email/password pair.
    ///
    /// Unknown email and wrong password produce the same `Denied` outcome.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthOutcome> {
        let email = normalize_email(email);

        let (hash, user) = match self.store.find_by_email(&email).await? {
            Some(user) => (user.password_hash.clone(), Some(user)),
            None => (self.dummy_hash.clone(), None),
        };

        let matches = self.verify(hash, password.to_string()).await?;

        Ok(match user {
            Some(user) if matches && user.email == email => AuthOutcome::Authenticated(user),
            _ => AuthOutcome::Denied,
        })
    }

    pub async fn is_duplicate_email(&self, email: &str) -> Result<bool> {
        self.store.email_exists(&normalize_email(email)).await
    }

    /// Create a user from a validated registration request
    pub async fn register(&self, req: &RegisterRequest) -> Result<User> {
        let email = normalize_email(&req.email);

        if self.is_duplicate_email(&email).await? {
            return Err(ShelfError::Conflict("Duplicate email".to_string()));
        }

        let password_hash = self.hash(req.password.clone()).await?;
        let now = chrono::Utc::now().to_rfc3339();

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: req.name.trim().to_string(),
            email,
            password_hash,
            created_at: now.clone(),
            updated_at: now,
        };

        // The store's unique constraint settles races the pre-check cannot see
        self.store.insert(&user).await?;

        tracing::info!(user_id = %user.id, email = %user.email, "User registered");
        Ok(user)
    }

    /// Apply a profile update to the user identified by `user_id`
    pub async fn update_profile(&self, user_id: &str, req: &UpdateProfileRequest) -> Result<User> {
        let mut user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ShelfError::NotFound("User not found".to_string()))?;

        let email = req.email();
        if email != user.email && self.is_duplicate_email(&email).await? {
            return Err(ShelfError::Conflict("Duplicate email".to_string()));
        }

        user.name = req.name.trim().to_string();
        user.email = email;
        if let Some(password) = req.new_password() {
            user.password_hash = self.hash(password.to_string()).await?;
        }
        user.updated_at = chrono::Utc::now().to_rfc3339();

        self.store.update(&user).await?;

        tracing::info!(user_id = %user.id, "User profile updated");
        Ok(user)
    }

    pub async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        self.store.find_by_id(user_id).await
    }

    async fn hash(&self, password: String) -> Result<String> {
        let hasher = self.hasher;
        task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ShelfError::TaskError(format!("Hashing task panicked: {}", e)))?
    }

    async fn verify(&self, hash: String, password: String) -> Result<bool> {
        let hasher = self.hasher;
        task::spawn_blocking(move || hasher.verify(&hash, &password))
            .await
            .map_err(|e| ShelfError::TaskError(format!("Verification task panicked: {}", e)))
    }
}
