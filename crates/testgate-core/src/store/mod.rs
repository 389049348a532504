//! Storage collaborators
//!
//! The authentication core only needs lookup/creation of credentials and
//! lookup/mutation of tests by id. Both are expressed as object-safe traits
//! so the API can run on the in-memory stores or on PostgreSQL.

mod memory;
mod postgres;

pub use memory::{InMemoryCredentialStore, InMemoryTestStore};
pub use postgres::{connect, migrate, PgCredentialStore, PgTestStore};

use crate::{NewTest, NewUser, Test, User};
use async_trait::async_trait;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated (login or test title)
    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence of user accounts
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an account by its login
    async fn find_by_login(&self, login: &str) -> StoreResult<Option<User>>;

    /// Persist a new account; fails with `Duplicate` if the login is taken
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    /// Remove an account; fails with `NotFound` if it does not exist
    async fn delete(&self, login: &str) -> StoreResult<()>;
}

/// Persistence of tests
#[async_trait]
pub trait TestStore: Send + Sync {
    async fn find(&self, id: i64) -> StoreResult<Option<Test>>;

    /// Persist a new test; fails with `Duplicate` if the title is taken
    async fn create(&self, test: NewTest) -> StoreResult<Test>;

    /// Remove a test; fails with `NotFound` if it does not exist
    async fn delete(&self, id: i64) -> StoreResult<()>;
}
