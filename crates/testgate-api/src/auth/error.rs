//! Authentication and authorization errors
//!
//! Every failure of the session manager and the guard is one of these
//! variants. They are mapped to HTTP status codes only in `IntoResponse`.

use super::jwt::JwtError;
use crate::error::ApiError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use testgate_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown login or wrong password; the two are never distinguished
    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Bad signature, malformed, wrong purpose or expired
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token is missing the login claim")]
    MissingClaim,

    /// The refresh token can no longer be redeemed; log in again
    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// Storage or hashing failure; details are logged, never returned
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable code for the response body
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AlreadyExists(_) => "ALREADY_EXISTS",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::MissingClaim => "MISSING_CLAIM",
            AuthError::SessionExpired => "SESSION_EXPIRED",
            AuthError::Forbidden(_) => "FORBIDDEN",
            AuthError::NotFound(_) => "NOT_FOUND",
            AuthError::MissingAuthHeader | AuthError::InvalidAuthHeader => "UNAUTHORIZED",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::MissingClaim
            | AuthError::SessionExpired
            | AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader => StatusCode::UNAUTHORIZED,
            AuthError::AlreadyExists(_) => StatusCode::BAD_REQUEST,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::MissingClaim => AuthError::MissingClaim,
            JwtError::InvalidToken => AuthError::InvalidToken,
            // Signing failures (bad secret, clock) look like any other bad token
            other => {
                tracing::error!(error = %other, "token codec failure");
                AuthError::InvalidToken
            }
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => AuthError::AlreadyExists(what),
            StoreError::NotFound(what) => AuthError::NotFound(what),
            StoreError::Database(msg) => AuthError::Internal(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AuthError::Internal(detail) => {
                tracing::error!(%detail, "internal error while handling request");
                ApiError::internal_error()
            }
            other => ApiError::new(other.code(), other.to_string()),
        };

        (status, Json(body)).into_response()
    }
}
