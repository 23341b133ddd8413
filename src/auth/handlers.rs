//! Authentication API handlers

use crate::api::handlers::AppState;
use crate::api::models::{ApiResponse, ValidJson};
use crate::auth::models::{LoginRequest, RegisterRequest, UserResponse};
use crate::auth::service::AuthOutcome;
use crate::core::error::{Result, ShelfError};
use axum::extract::State;

/// Handler for POST /api/auth/register - User registration
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<ApiResponse<UserResponse>> {
    tracing::info!(email = %req.email, "User registration attempt");

    let user = state.auth_service.register(&req).await?;
    let token = state.token_service.issue(&user.id)?;

    Ok(ApiResponse::created(
        "Register Success",
        UserResponse::from(user).with_token(token),
    ))
}

/// Handler for POST /api/auth/login - User login
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<ApiResponse<UserResponse>> {
    tracing::info!(email = %req.email, "Login attempt");

    let user = match state.auth_service.authenticate(&req.email, &req.password).await? {
        AuthOutcome::Authenticated(user) => user,
        AuthOutcome::Denied => {
            tracing::warn!(email = %req.email, "Login denied");
            return Err(ShelfError::AuthenticationError("Invalid credentials".to_string()));
        }
    };

    let token = state.token_service.issue(&user.id)?;

    tracing::info!(user_id = %user.id, "Login successful");

    Ok(ApiResponse::ok(
        "Login Success",
        UserResponse::from(user).with_token(token),
    ))
}
