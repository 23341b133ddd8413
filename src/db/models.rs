//! Database models
//!
//! Data structures representing database tables

use serde::{Deserialize, Serialize};
use std::fmt;

/// Registered user; doubles as the stored credential
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Book record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    /// Owning user; written once at creation from the authenticated subject
    pub user_id: String,
    pub title: String,
    pub author: String,
    pub price: i64,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Book joined with its owner's public fields
#[derive(Debug, Clone)]
pub struct BookWithOwner {
    pub book: Book,
    pub owner_name: String,
    pub owner_email: String,
}
