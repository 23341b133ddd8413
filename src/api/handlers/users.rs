use crate::api::models::{ApiResponse, BookSummary, ValidJson};
use crate::auth::middleware::AuthUser;
use crate::auth::models::{UpdateProfileRequest, UserResponse};
use crate::core::error::{Result, ShelfError};
use axum::extract::State;
use super::AppState;

/// Handler for GET /api/user/profile - The caller and the books they own
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<UserResponse>> {
    let db_user = state
        .auth_service
        .find_user(&user.id)
        .await?
        .ok_or_else(|| ShelfError::NotFound("User not found".to_string()))?;

    let books: Vec<BookSummary> = state
        .book_repo
        .find_by_owner(&user.id)
        .await?
        .into_iter()
        .map(BookSummary::from)
        .collect();

    Ok(ApiResponse::ok("Get Profile", UserResponse::from(db_user).with_books(books)))
}

/// Handler for PUT /api/user/profile - Update the caller's own profile
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(req): ValidJson<UpdateProfileRequest>,
) -> Result<ApiResponse<UserResponse>> {
    let updated = state.auth_service.update_profile(&user.id, &req).await?;

    Ok(ApiResponse::ok("Update Profile", UserResponse::from(updated)))
}
