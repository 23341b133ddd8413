//! Bookshelf Library
//!
//! User accounts and an owned book collection behind a JSON REST API,
//! with bearer-token authentication and per-book ownership checks.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use api::ApiServer;
pub use crate::core::Config;
pub use db::DatabaseManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
