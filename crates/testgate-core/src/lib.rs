//! TestGate Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout TestGate:
//! - User accounts and the closed set of roles
//! - The protected "test" resource
//! - Storage traits for credentials and tests (in-memory and PostgreSQL)
//! - Configuration management

pub mod config;
pub mod store;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig};
pub use store::{CredentialStore, StoreError, StoreResult, TestStore};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

// ============================================================================
// Roles
// ============================================================================

/// Role attached to every account and embedded in issued tokens
///
/// The set is closed: authorization decisions match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May create and delete tests
    Teacher,
    /// Read-only access to tests
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// Profile fields carried alongside an account
///
/// Opaque to authentication; stored and returned as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    /// Full name of the account holder
    pub full_name: String,
    /// Institution-issued identification number
    pub identification_number: i64,
}

/// A stored user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identifier
    pub id: i64,
    /// Unique login name
    pub login: String,
    /// Argon2 PHC string, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
}

/// A user account that has not been persisted yet
///
/// The password must already be hashed when this is constructed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
    pub role: Role,
    pub profile: UserProfile,
}

// ============================================================================
// Tests (the protected resource)
// ============================================================================

/// A test published by a teacher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Test {
    /// Store-assigned identifier
    #[schema(example = 5)]
    pub id: i64,
    /// Title, unique across all tests
    #[schema(example = "Quiz1")]
    pub title: String,
    pub theme: String,
    pub description: String,
    pub answer: String,
    /// Login of the teacher who created the test
    pub teacher_id: String,
    pub date_deadline: NaiveDate,
}

/// A test that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTest {
    pub title: String,
    pub theme: String,
    pub description: String,
    pub answer: String,
    pub teacher_id: String,
    pub date_deadline: NaiveDate,
}

impl NewTest {
    /// Attach the store-assigned id
    pub fn into_test(self, id: i64) -> Test {
        Test {
            id,
            title: self.title,
            theme: self.theme,
            description: self.description,
            answer: self.answer,
            teacher_id: self.teacher_id,
            date_deadline: self.date_deadline,
        }
    }
}
