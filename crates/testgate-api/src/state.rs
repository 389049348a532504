//! Application state management

use crate::auth::{AuthService, AuthorizationGuard, PasswordConfig};
use crate::resources::TestService;
use std::sync::Arc;
use std::time::Instant;
use testgate_core::config::AppConfig;
use testgate_core::store::{InMemoryCredentialStore, InMemoryTestStore};
use testgate_core::{CredentialStore, TestStore};

/// Which storage backend the state was built over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    Postgres,
}

impl StorageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKind::Memory => "memory",
            StorageKind::Postgres => "postgres",
        }
    }
}

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Session manager
    pub auth: AuthService,
    /// Role-gated access to tests
    pub tests: TestService,
    pub storage: StorageKind,
}

impl AppState {
    /// Wire the services over the given stores
    pub fn new(
        config: AppConfig,
        users: Arc<dyn CredentialStore>,
        tests: Arc<dyn TestStore>,
        storage: StorageKind,
    ) -> Self {
        let auth = AuthService::from_config(users, &config.auth);
        Self::with_auth(config, auth, tests, storage)
    }

    /// State backed by fresh in-memory stores
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(InMemoryTestStore::new()),
            StorageKind::Memory,
        )
    }

    /// In-memory state with the cheapest password hashing settings
    pub fn for_testing(config: AppConfig) -> Self {
        let auth = AuthService::new(
            Arc::new(InMemoryCredentialStore::new()),
            (&config.auth).into(),
            PasswordConfig::insecure_fast(),
        );
        Self::with_auth(
            config,
            auth,
            Arc::new(InMemoryTestStore::new()),
            StorageKind::Memory,
        )
    }

    fn with_auth(
        config: AppConfig,
        auth: AuthService,
        tests: Arc<dyn TestStore>,
        storage: StorageKind,
    ) -> Self {
        let guard = AuthorizationGuard::new(auth.clone());
        Self {
            config,
            start_time: Instant::now(),
            tests: TestService::new(guard, tests),
            auth,
            storage,
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory(AppConfig::default())
    }
}
