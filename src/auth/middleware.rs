//! Authentication middleware
//!
//! The request gate: every protected route passes through [`authenticate`],
//! which validates the bearer token and attaches the subject to the request
//! as an [`AuthUser`] extension. Ownership is checked later, in handlers.

use crate::auth::jwt::TokenService;
use crate::core::error::{Result, ShelfError};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Authenticated subject, taken from a validated token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
}

/// Token carried by the `Authorization` header.
///
/// Clients send either the raw token or `Bearer <token>`.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Authentication middleware
pub async fn authenticate(
    State(tokens): State<Arc<dyn TokenService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_token(request.headers()) {
        Some(t) => t,
        None => {
            tracing::debug!(path = %request.uri().path(), "Request without token rejected");
            return ShelfError::AuthenticationError("No token found".to_string()).into_response();
        }
    };

    let user_id = match tokens.validate(token) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(path = %request.uri().path(), reason = %e, "Invalid token rejected");
            return ShelfError::Token(e).into_response();
        }
    };

    request.extensions_mut().insert(AuthUser { id: user_id });

    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ShelfError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ShelfError::AuthenticationError("User not authenticated".to_string()))
    }
}
