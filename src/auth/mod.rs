//! Authentication module
//!
//! This module provides authentication functionality including:
//! - Password hashing and verification
//! - JWT token issuance and validation
//! - Credential checks, registration and profile updates
//! - Ownership checks on owned resources
//! - The request gate middleware

pub mod jwt;
pub mod password;
pub mod service;
pub mod authorization;
pub mod handlers;
pub mod middleware;
pub mod models;

pub use jwt::{Claims, JwtService, TokenError, TokenService};
pub use password::PasswordHasher;
pub use service::{AuthOutcome, AuthService, CredentialStore};
pub use authorization::{OwnershipGuard, ResourceStore};
pub use middleware::{authenticate, AuthUser};
pub use handlers::{register, login};
