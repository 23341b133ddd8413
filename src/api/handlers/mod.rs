pub mod books;
pub mod users;

pub use books::*;
pub use users::*;

use crate::auth::{AuthService, JwtService, OwnershipGuard, PasswordHasher, TokenService};
use crate::core::config::AuthConfig;
use crate::core::error::Result;
use crate::db::manager::DatabaseManager;
use crate::db::repository::{BookRepository, UserRepository};
use std::sync::Arc;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repo: Arc<UserRepository>,
    pub book_repo: Arc<BookRepository>,
    pub auth_service: Arc<AuthService>,
    pub token_service: Arc<dyn TokenService>,
    pub ownership: OwnershipGuard,
}

impl AppState {
    /// Build every service once from configuration and the shared database
    pub fn new(auth: &AuthConfig, db: Arc<DatabaseManager>) -> Result<Self> {
        let user_repo = Arc::new(UserRepository::new(db.clone()));
        let book_repo = Arc::new(BookRepository::new(db));

        let hasher = PasswordHasher::new(auth.bcrypt_cost);
        let auth_service = Arc::new(AuthService::new(user_repo.clone(), hasher)?);
        let token_service: Arc<dyn TokenService> = Arc::new(JwtService::from_config(auth)?);
        let ownership = OwnershipGuard::new(book_repo.clone());

        Ok(Self {
            user_repo,
            book_repo,
            auth_service,
            token_service,
            ownership,
        })
    }
}
