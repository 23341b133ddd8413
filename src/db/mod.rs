//! Database module
//!
//! This module provides database management functionality including:
//! - SQLite connection pool management
//! - Schema migrations
//! - Data models
//! - Repository implementations of the credential and resource stores

pub mod manager;
pub mod models;
pub mod repository;
pub mod migrations;

pub use manager::DatabaseManager;
pub use models::{Book, BookWithOwner, User};
pub use repository::{BookRepository, UserRepository};
