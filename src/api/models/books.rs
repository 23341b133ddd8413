use serde::{Deserialize, Serialize};
use crate::db::models::{Book, BookWithOwner};
use crate::core::error::Result;
use super::common::{FieldErrors, Validate};

// Book API models

/// Request body for creating a new book.
///
/// There is no owner field: the owner is always the authenticated caller,
/// and unknown fields such as `user_id` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub price: i64,
    pub description: String,
}

/// Request body for updating a book
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookRequest {
    pub title: String,
    pub author: String,
    pub price: i64,
    pub description: String,
}

fn check_book_fields(title: &str, author: &str, price: i64, description: &str) -> Result<()> {
    let mut errors = FieldErrors::new();
    errors.check(!title.trim().is_empty(), "title is required");
    errors.check(!author.trim().is_empty(), "author is required");
    errors.check(price >= 0, "price must not be negative");
    errors.check(!description.trim().is_empty(), "description is required");
    errors.finish()
}

impl Validate for CreateBookRequest {
    fn validate(&self) -> Result<()> {
        check_book_fields(&self.title, &self.author, self.price, &self.description)
    }
}

impl Validate for UpdateBookRequest {
    fn validate(&self) -> Result<()> {
        check_book_fields(&self.title, &self.author, self.price, &self.description)
    }
}

/// Public fields of a book's owner
#[derive(Debug, Serialize)]
pub struct OwnerSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Book as listed under its owner's profile
#[derive(Debug, Serialize)]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    pub price: i64,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Book> for BookSummary {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            price: book.price,
            description: book.description,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// Response for book operations
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub author: String,
    pub price: i64,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<OwnerSummary>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            user_id: book.user_id,
            title: book.title,
            author: book.author,
            price: book.price,
            description: book.description,
            created_at: book.created_at,
            updated_at: book.updated_at,
            user: None,
        }
    }
}

impl From<BookWithOwner> for BookResponse {
    fn from(row: BookWithOwner) -> Self {
        let owner = OwnerSummary {
            id: row.book.user_id.clone(),
            name: row.owner_name,
            email: row.owner_email,
        };
        let mut response = BookResponse::from(row.book);
        response.user = Some(owner);
        response
    }
}
