use crate::api::models::{ApiResponse, BookResponse, CreateBookRequest, UpdateBookRequest, ValidJson};
use crate::auth::middleware::AuthUser;
use crate::core::error::{Result, ShelfError};
use crate::db::models::Book;
use axum::extract::{Path, State};
use uuid::Uuid;
use super::AppState;

fn not_owner() -> ShelfError {
    ShelfError::PermissionDenied("You are not the owner of this book".to_string())
}

/// Handler for GET /api/books - List all books
pub async fn list_books(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<BookResponse>>> {
    let books = state.book_repo.find_all_with_owner().await?;
    let books: Vec<BookResponse> = books.into_iter().map(BookResponse::from).collect();

    Ok(ApiResponse::ok("Get All Data Book", books))
}

/// Handler for GET /api/books/:id - Get book by ID
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<BookResponse>> {
    let book = state
        .book_repo
        .find_with_owner(&id)
        .await?
        .ok_or_else(|| ShelfError::NotFound(format!("Book with id {} not found", id)))?;

    Ok(ApiResponse::ok("Get Data Book", BookResponse::from(book)))
}

/// Handler for POST /api/books - Create a book owned by the caller
pub async fn create_book(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(req): ValidJson<CreateBookRequest>,
) -> Result<ApiResponse<BookResponse>> {
    let now = chrono::Utc::now().to_rfc3339();

    let book = Book {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        title: req.title.trim().to_string(),
        author: req.author.trim().to_string(),
        price: req.price,
        description: req.description,
        created_at: now.clone(),
        updated_at: now,
    };

    state.book_repo.create(&book).await?;

    tracing::info!(user_id = %user.id, book_id = %book.id, "Book created");

    Ok(ApiResponse::created("Create Data Book", BookResponse::from(book)))
}

/// Handler for PUT /api/books/:id - Update a book the caller owns
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
    ValidJson(req): ValidJson<UpdateBookRequest>,
) -> Result<ApiResponse<BookResponse>> {
    if !state.ownership.is_owner(&user.id, &id).await {
        tracing::warn!(user_id = %user.id, book_id = %id, "Book update denied");
        return Err(not_owner());
    }

    let book = Book {
        id: id.clone(),
        user_id: user.id.clone(),
        title: req.title.trim().to_string(),
        author: req.author.trim().to_string(),
        price: req.price,
        description: req.description,
        created_at: String::new(),
        updated_at: chrono::Utc::now().to_rfc3339(),
    };

    // Ownership is re-checked by the write itself
    if !state.book_repo.update_owned(&book, &user.id).await? {
        return Err(not_owner());
    }

    let updated = state
        .book_repo
        .find_with_owner(&id)
        .await?
        .ok_or_else(|| ShelfError::NotFound(format!("Book with id {} not found", id)))?;

    tracing::info!(user_id = %user.id, book_id = %id, "Book updated");

    Ok(ApiResponse::ok("Update Data Book", BookResponse::from(updated)))
}

/// Handler for DELETE /api/books/:id - Delete a book the caller owns
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
) -> Result<ApiResponse<serde_json::Value>> {
    if !state.ownership.is_owner(&user.id, &id).await {
        tracing::warn!(user_id = %user.id, book_id = %id, "Book delete denied");
        return Err(not_owner());
    }

    if !state.book_repo.delete_owned(&id, &user.id).await? {
        return Err(not_owner());
    }

    tracing::info!(user_id = %user.id, book_id = %id, "Book deleted");

    Ok(ApiResponse::ok("Delete Data Book", serde_json::json!({})))
}
