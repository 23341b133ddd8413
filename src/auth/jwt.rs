//! JWT token issuance and validation
//!
//! Tokens are compact HS256 JWTs with a flat claim set:
//! `user_id` (subject), `iss`, `iat` and `exp`, the latter two in unix seconds.
//! Only HS256 is accepted on validation.

use crate::core::config::AuthConfig;
use crate::core::error::{Result, ShelfError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Why a presented token was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Token signature mismatch")]
    SignatureMismatch,

    #[error("Token expired")]
    Expired,

    #[error("Unexpected token algorithm")]
    UnexpectedAlgorithm,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::SignatureMismatch,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::UnexpectedAlgorithm
            }
            _ => TokenError::Malformed,
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates bearer tokens for a subject
pub trait TokenService: Send + Sync {
    /// Sign a token for `subject_id`, valid from now for the configured lifetime
    fn issue(&self, subject_id: &str) -> Result<String>;

    /// Return the embedded subject if the token is authentic and unexpired
    fn validate(&self, token: &str) -> std::result::Result<String, TokenError>;
}

/// HS256 implementation of [`TokenService`]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    lifetime: Duration,
}

impl JwtService {
    pub fn new(secret: &str, issuer: &str, lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer: issuer.to_string(),
            lifetime,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let lifetime = Duration::try_seconds(config.token_lifetime_secs).ok_or_else(|| {
            ShelfError::ConfigError(format!(
                "token_lifetime_secs out of range: {}",
                config.token_lifetime_secs
            ))
        })?;

        Ok(Self::new(config.secret(), &config.issuer, lifetime))
    }

    /// Sign a token as if it had been issued at `issued_at`
    pub fn issue_at(&self, subject_id: &str, issued_at: DateTime<Utc>) -> Result<String> {
        let expires_at = issued_at
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| ShelfError::TokenSigningError("Token expiry out of range".to_string()))?;

        let claims = Claims {
            user_id: subject_id.to_string(),
            iss: self.issuer.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ShelfError::TokenSigningError(e.to_string()))
    }
}

impl TokenService for JwtService {
    fn issue(&self, subject_id: &str) -> Result<String> {
        self.issue_at(subject_id, Utc::now())
    }

    fn validate(&self, token: &str) -> std::result::Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims.user_id)
    }
}
