//! Client-side session state
//!
//! A session is just the last token pair the server handed out. Transitions
//! are pure functions on [`Session`]; [`SessionFile`] persists the current
//! value between invocations.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Session {
    /// Logged-out session
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session holding a freshly issued pair
    pub fn with_tokens(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Token to send as the bearer credential
    pub fn bearer(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Token to redeem at the refresh endpoint
    pub fn refresh_credential(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Back to anonymous
    pub fn cleared(&self) -> Self {
        Self::anonymous()
    }
}

/// JSON file holding the persisted session
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.testgate/session.json`, or the working directory without a home
    pub fn default_location() -> Self {
        match std::env::var_os("HOME") {
            Some(home) => Self::new(Path::new(&home).join(".testgate").join("session.json")),
            None => Self::new(".testgate-session.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session; a missing file is an anonymous session
    pub fn load(&self) -> Result<Session, ClientError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Session::anonymous()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| ClientError::CorruptSession {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Write the session, readable by the owner only on unix
    pub fn save(&self, session: &Session) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(session)?;
        let mut file = open_private(&self.path)?;
        file.write_all(content.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation; tighten files left by older writes
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
