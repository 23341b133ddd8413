//! SQLite repositories for users and books
//!
//! Each repository backs one of the auth core's capabilities: users are the
//! `CredentialStore`, books the `ResourceStore`. Book mutations are only
//! exposed in owner-scoped form.

use crate::auth::authorization::ResourceStore;
use crate::auth::service::CredentialStore;
use crate::core::error::{Result, ShelfError};
use crate::db::manager::DatabaseManager;
use crate::db::models::{Book, BookWithOwner, User};
use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row};
use std::sync::Arc;

/// True when `err` is a violation of a UNIQUE constraint
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn map_duplicate_email(err: rusqlite::Error) -> ShelfError {
    if is_unique_violation(&err) {
        ShelfError::Conflict("Duplicate email".to_string())
    } else {
        ShelfError::DatabaseError(err)
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Repository for User entities
pub struct UserRepository {
    db: Arc<DatabaseManager>,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();
        self.db.execute(move |conn| {
            Ok(conn.query_row(
                &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                [&email],
                user_from_row,
            ).optional()?)
        }).await
    }

    /// Check whether a user with this email exists
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let email = email.to_string();
        self.db.execute(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE email = ?",
                [&email],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        }).await
    }

    /// Find a user by id
    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let id = id.to_string();
        self.db.execute(move |conn| {
            Ok(conn.query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                [&id],
                user_from_row,
            ).optional()?)
        }).await
    }

    /// Insert a user; a taken email is a `Conflict`
    pub async fn insert(&self, user: &User) -> Result<()> {
        let user = user.clone();
        self.db.execute(move |conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, password_hash, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    &user.id,
                    &user.name,
                    &user.email,
                    &user.password_hash,
                    &user.created_at,
                    &user.updated_at,
                ],
            ).map_err(map_duplicate_email)?;
            Ok(())
        }).await
    }

    /// Rewrite a user's mutable columns; a taken email is a `Conflict`
    pub async fn update(&self, user: &User) -> Result<()> {
        let user = user.clone();
        self.db.execute(move |conn| {
            let affected = conn.execute(
                "UPDATE users SET name = ?, email = ?, password_hash = ?, updated_at = ? WHERE id = ?",
                rusqlite::params![
                    &user.name,
                    &user.email,
                    &user.password_hash,
                    &user.updated_at,
                    &user.id,
                ],
            ).map_err(map_duplicate_email)?;
            if affected == 0 {
                return Err(ShelfError::NotFound(format!("User with id {} not found", user.id)));
            }
            Ok(())
        }).await
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64> {
        self.db.execute(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
        }).await
    }
}

#[async_trait]
impl CredentialStore for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        UserRepository::find_by_email(self, email).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        UserRepository::find_by_id(self, id).await
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        UserRepository::email_exists(self, email).await
    }

    async fn insert(&self, user: &User) -> Result<()> {
        UserRepository::insert(self, user).await
    }

    async fn update(&self, user: &User) -> Result<()> {
        UserRepository::update(self, user).await
    }
}

const BOOK_COLUMNS: &str = "b.id, b.user_id, b.title, b.author, b.price, b.description, b.created_at, b.updated_at";

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        author: row.get(3)?,
        price: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn book_with_owner_from_row(row: &Row<'_>) -> rusqlite::Result<BookWithOwner> {
    Ok(BookWithOwner {
        book: book_from_row(row)?,
        owner_name: row.get(8)?,
        owner_email: row.get(9)?,
    })
}

/// Repository for Book entities
pub struct BookRepository {
    db: Arc<DatabaseManager>,
}

impl BookRepository {
    /// Create a new BookRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Insert a book; `user_id` must name an existing user
    pub async fn create(&self, book: &Book) -> Result<()> {
        let book = book.clone();
        self.db.execute(move |conn| {
            conn.execute(
                "INSERT INTO books (id, user_id, title, author, price, description, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    &book.id,
                    &book.user_id,
                    &book.title,
                    &book.author,
                    book.price,
                    &book.description,
                    &book.created_at,
                    &book.updated_at,
                ],
            )?;
            Ok(())
        }).await
    }

    /// All books joined with their owners, newest first
    pub async fn find_all_with_owner(&self) -> Result<Vec<BookWithOwner>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {}, u.name, u.email FROM books b \
                 JOIN users u ON u.id = b.user_id \
                 ORDER BY b.created_at DESC",
                BOOK_COLUMNS
            ))?;
            let books = stmt
                .query_map([], book_with_owner_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(books)
        }).await
    }

    /// One book joined with its owner
    pub async fn find_with_owner(&self, id: &str) -> Result<Option<BookWithOwner>> {
        let id = id.to_string();
        self.db.execute(move |conn| {
            Ok(conn.query_row(
                &format!(
                    "SELECT {}, u.name, u.email FROM books b \
                     JOIN users u ON u.id = b.user_id WHERE b.id = ?",
                    BOOK_COLUMNS
                ),
                [&id],
                book_with_owner_from_row,
            ).optional()?)
        }).await
    }

    /// Books owned by a user, newest first
    pub async fn find_by_owner(&self, user_id: &str) -> Result<Vec<Book>> {
        let user_id = user_id.to_string();
        self.db.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM books b WHERE b.user_id = ? ORDER BY b.created_at DESC",
                BOOK_COLUMNS
            ))?;
            let books = stmt
                .query_map([&user_id], book_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(books)
        }).await
    }

    /// Update a book only if `owner_id` still owns it, in one statement.
    ///
    /// Returns false when no row matched (book gone or owned by someone else).
    /// The owner column itself is never rewritten.
    pub async fn update_owned(&self, book: &Book, owner_id: &str) -> Result<bool> {
        let book = book.clone();
        let owner_id = owner_id.to_string();
        self.db.execute(move |conn| {
            let affected = conn.execute(
                "UPDATE books SET title = ?, author = ?, price = ?, description = ?, updated_at = ? \
                 WHERE id = ? AND user_id = ?",
                rusqlite::params![
                    &book.title,
                    &book.author,
                    book.price,
                    &book.description,
                    &book.updated_at,
                    &book.id,
                    &owner_id,
                ],
            )?;
            Ok(affected > 0)
        }).await
    }

    /// Delete a book only if `owner_id` still owns it
    pub async fn delete_owned(&self, id: &str, owner_id: &str) -> Result<bool> {
        let id = id.to_string();
        let owner_id = owner_id.to_string();
        self.db.execute(move |conn| {
            let affected = conn.execute(
                "DELETE FROM books WHERE id = ? AND user_id = ?",
                [&id, &owner_id],
            )?;
            Ok(affected > 0)
        }).await
    }
}

#[async_trait]
impl ResourceStore for BookRepository {
    async fn find_owner(&self, resource_id: &str) -> Result<Option<String>> {
        let id = resource_id.to_string();
        self.db.execute(move |conn| {
            Ok(conn.query_row(
                "SELECT user_id FROM books WHERE id = ?",
                [&id],
                |row| row.get(0),
            ).optional()?)
        }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            name: format!("user {}", id),
            email: email.to_string(),
            password_hash: "$2b$04$placeholder".to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn book(id: &str, owner: &str) -> Book {
        Book {
            id: id.to_string(),
            user_id: owner.to_string(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            price: 20,
            description: "Spice".to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn repos() -> (UserRepository, BookRepository) {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        (UserRepository::new(db.clone()), BookRepository::new(db))
    }

    #[tokio::test]
    async fn test_user_create_and_find_by_email() {
        let (users, _) = repos();
        users.insert(&user("u1", "a@x.com")).await.unwrap();

        let found = users.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, "u1");
        assert!(users.email_exists("a@x.com").await.unwrap());
        assert!(!users.email_exists("b@x.com").await.unwrap());
        assert_eq!(users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_insert_is_conflict() {
        let (users, _) = repos();
        users.insert(&user("u1", "a@x.com")).await.unwrap();

        let err = users.insert(&user("u2", "a@x.com")).await.unwrap_err();
        assert!(matches!(err, ShelfError::Conflict(_)));
        assert_eq!(users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_to_taken_email_is_conflict() {
        let (users, _) = repos();
        users.insert(&user("u1", "a@x.com")).await.unwrap();
        users.insert(&user("u2", "b@x.com")).await.unwrap();

        let mut second = user("u2", "a@x.com");
        second.name = "renamed".to_string();
        let err = users.update(&second).await.unwrap_err();
        assert!(matches!(err, ShelfError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_owner() {
        let (users, books) = repos();
        users.insert(&user("u1", "a@x.com")).await.unwrap();
        books.create(&book("b1", "u1")).await.unwrap();

        assert_eq!(books.find_owner("b1").await.unwrap(), Some("u1".to_string()));
        assert_eq!(books.find_owner("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_owned_checks_owner() {
        let (users, books) = repos();
        users.insert(&user("u1", "a@x.com")).await.unwrap();
        users.insert(&user("u2", "b@x.com")).await.unwrap();
        books.create(&book("b1", "u1")).await.unwrap();

        let mut changed = book("b1", "u2");
        changed.title = "Children of Dune".to_string();

        assert!(!books.update_owned(&changed, "u2").await.unwrap());
        assert!(books.update_owned(&changed, "u1").await.unwrap());

        let stored = books.find_with_owner("b1").await.unwrap().unwrap().book;
        assert_eq!(stored.title, "Children of Dune");
        assert_eq!(stored.user_id, "u1");
    }

    #[tokio::test]
    async fn test_delete_owned_checks_owner() {
        let (users, books) = repos();
        users.insert(&user("u1", "a@x.com")).await.unwrap();
        users.insert(&user("u2", "b@x.com")).await.unwrap();
        books.create(&book("b1", "u1")).await.unwrap();

        assert!(!books.delete_owned("b1", "u2").await.unwrap());
        assert!(books.delete_owned("b1", "u1").await.unwrap());
        assert!(books.find_with_owner("b1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_books_with_owner() {
        let (users, books) = repos();
        users.insert(&user("u1", "a@x.com")).await.unwrap();
        books.create(&book("b1", "u1")).await.unwrap();
        books.create(&book("b2", "u1")).await.unwrap();

        let all = books.find_all_with_owner().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|b| b.owner_email == "a@x.com"));

        let one = books.find_with_owner("b2").await.unwrap().unwrap();
        assert_eq!(one.book.id, "b2");
        assert_eq!(one.owner_name, "user u1");

        assert_eq!(books.find_by_owner("u1").await.unwrap().len(), 2);
        assert!(books.find_by_owner("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_user_cascades_books() {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        let users = UserRepository::new(db.clone());
        let books = BookRepository::new(db.clone());
        users.insert(&user("u1", "a@x.com")).await.unwrap();
        books.create(&book("b1", "u1")).await.unwrap();

        db.execute(|conn| {
            conn.execute("DELETE FROM users WHERE id = 'u1'", [])?;
            Ok(())
        }).await.unwrap();

        assert!(books.find_by_owner("u1").await.unwrap().is_empty());
        assert_eq!(books.find_owner("b1").await.unwrap(), None);
    }
}
