use crate::core::error::{Result, ShelfError};
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};

/// Response envelope shared by every endpoint
///
/// Success: `{code, message, errors: null, data}`.
/// Failure: `{code, message, errors: [..], data: {}}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip)]
    status: StatusCode,
    pub code: u16,
    pub message: String,
    pub errors: Option<Vec<String>>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status,
            code: status.as_u16(),
            message: message.into(),
            errors: None,
            data,
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::success(StatusCode::OK, message, data)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::success(StatusCode::CREATED, message, data)
    }
}

impl ApiResponse<serde_json::Value> {
    pub fn failure(status: StatusCode, message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            status,
            code: status.as_u16(),
            message: message.into(),
            errors: Some(errors),
            data: serde_json::json!({}),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Field-level validation for request bodies.
///
/// Implementations report every failing field, one message per line.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Collects field errors and turns them into a single `ValidationError`
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, message: &str) {
        if !ok {
            self.0.push(message.to_string());
        }
    }

    pub fn finish(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ShelfError::ValidationError(self.0.join("\n")))
        }
    }
}

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("valid email regex");
}

/// Canonical form used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(&normalize_email(email))
}

/// JSON body extractor that rejects malformed bodies and failed validation with a 400 envelope
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ShelfError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ShelfError::ValidationError(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("  Someone.Else+tag@Mail.Example.org "));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }

    #[test]
    fn test_field_errors_join() {
        let mut errors = FieldErrors::new();
        errors.check(true, "never shown");
        errors.check(false, "title is required");
        errors.check(false, "price must not be negative");

        match errors.finish() {
            Err(ShelfError::ValidationError(msg)) => {
                assert_eq!(msg, "title is required\nprice must not be negative")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_success_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::created("Created", serde_json::json!({"id": "1"})))
            .unwrap();
        assert_eq!(body["code"], 201);
        assert_eq!(body["message"], "Created");
        assert!(body["errors"].is_null());
        assert_eq!(body["data"]["id"], "1");
        assert!(body.get("status").is_none());
    }
}
