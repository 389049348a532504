//! In-memory stores for single-instance deployments and tests

use super::{CredentialStore, StoreError, StoreResult, TestStore};
use crate::{NewTest, NewUser, Test, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Credential store backed by a `HashMap` keyed by login
#[derive(Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<UserTable>,
}

#[derive(Default)]
struct UserTable {
    next_id: i64,
    by_login: HashMap<String, User>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_login.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.by_login.get(login).cloned())
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut table = self.inner.write().await;
        if table.by_login.contains_key(&user.login) {
            return Err(StoreError::Duplicate(user.login));
        }

        table.next_id += 1;
        let stored = User {
            id: table.next_id,
            login: user.login,
            password_hash: user.password_hash,
            role: user.role,
            profile: user.profile,
            created_at: Utc::now(),
        };
        table.by_login.insert(stored.login.clone(), stored.clone());
        Ok(stored)
    }

    async fn delete(&self, login: &str) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .by_login
            .remove(login)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("user {login}")))
    }
}

/// Test store backed by a `BTreeMap` keyed by id
///
/// Ids are assigned sequentially starting at 1 and never reused.
#[derive(Default)]
pub struct InMemoryTestStore {
    inner: RwLock<TestTable>,
}

#[derive(Default)]
struct TestTable {
    next_id: i64,
    by_id: BTreeMap<i64, Test>,
}

impl InMemoryTestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tests
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TestStore for InMemoryTestStore {
    async fn find(&self, id: i64) -> StoreResult<Option<Test>> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn create(&self, test: NewTest) -> StoreResult<Test> {
        let mut table = self.inner.write().await;
        if table.by_id.values().any(|t| t.title == test.title) {
            return Err(StoreError::Duplicate(test.title));
        }

        table.next_id += 1;
        let id = table.next_id;
        let stored = test.into_test(id);
        table.by_id.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .by_id
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("test {id}")))
    }
}
