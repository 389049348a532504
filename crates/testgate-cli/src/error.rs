//! Client errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not logged in, run `testgate login` first")]
    NotLoggedIn,

    /// Refresh failed; the stored session has been cleared
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// Error body returned by the server
    #[error("{message} ({code}, HTTP {status})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Session file {path} is unreadable: {reason}")]
    CorruptSession { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Server error code, if the server produced this error
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}
