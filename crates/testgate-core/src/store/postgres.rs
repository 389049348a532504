//! PostgreSQL stores
//!
//! Users and tests live in two tables created by [`migrate`]. Uniqueness of
//! logins and titles is enforced by the database, so concurrent duplicate
//! inserts surface as `StoreError::Duplicate`.

use super::{CredentialStore, StoreError, StoreResult, TestStore};
use crate::{NewTest, NewUser, Role, Test, User, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;

/// Open a connection pool
pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| StoreError::Database(format!("PostgreSQL connection failed: {e}")))
}

/// Create the `users` and `tests` tables if they do not exist
pub async fn migrate(pool: &PgPool) -> StoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            login TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            full_name TEXT NOT NULL,
            identification_number BIGINT NOT NULL,
            role TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StoreError::Database(format!("Failed to create users table: {e}")))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tests (
            id BIGSERIAL PRIMARY KEY,
            title TEXT NOT NULL UNIQUE,
            theme TEXT NOT NULL,
            description TEXT NOT NULL,
            answer TEXT NOT NULL,
            teacher_id TEXT NOT NULL,
            date_deadline DATE NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StoreError::Database(format!("Failed to create tests table: {e}")))?;

    Ok(())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

/// User row from database
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    login: String,
    password_hash: String,
    full_name: String,
    identification_number: i64,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| StoreError::Database(format!("Corrupt user row {}: {e}", row.id)))?;

        Ok(User {
            id: row.id,
            login: row.login,
            password_hash: row.password_hash,
            role,
            profile: UserProfile {
                full_name: row.full_name,
                identification_number: row.identification_number,
            },
            created_at: row.created_at,
        })
    }
}

/// Test row from database
#[derive(Debug, FromRow)]
struct TestRow {
    id: i64,
    title: String,
    theme: String,
    description: String,
    answer: String,
    teacher_id: String,
    date_deadline: NaiveDate,
}

impl From<TestRow> for Test {
    fn from(row: TestRow) -> Self {
        Test {
            id: row.id,
            title: row.title,
            theme: row.theme,
            description: row.description,
            answer: row.answer,
            teacher_id: row.teacher_id,
            date_deadline: row.date_deadline,
        }
    }
}

/// PostgreSQL credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, login, password_hash, full_name, identification_number, role, created_at
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to fetch user: {e}")))?;

        row.map(User::try_from).transpose()
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (login, password_hash, full_name, identification_number, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, login, password_hash, full_name, identification_number, role, created_at
            "#,
        )
        .bind(&user.login)
        .bind(&user.password_hash)
        .bind(&user.profile.full_name)
        .bind(user.profile.identification_number)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(user.login.clone())
            } else {
                StoreError::Database(format!("Failed to create user: {e}"))
            }
        })?;

        User::try_from(row)
    }

    async fn delete(&self, login: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE login = $1")
            .bind(login)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to delete user: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {login}")));
        }
        Ok(())
    }
}

/// PostgreSQL test store
#[derive(Clone)]
pub struct PgTestStore {
    pool: PgPool,
}

impl PgTestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TestStore for PgTestStore {
    async fn find(&self, id: i64) -> StoreResult<Option<Test>> {
        let row: Option<TestRow> = sqlx::query_as(
            r#"
            SELECT id, title, theme, description, answer, teacher_id, date_deadline
            FROM tests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to fetch test: {e}")))?;

        Ok(row.map(Test::from))
    }

    async fn create(&self, test: NewTest) -> StoreResult<Test> {
        let row: TestRow = sqlx::query_as(
            r#"
            INSERT INTO tests (title, theme, description, answer, teacher_id, date_deadline)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, theme, description, answer, teacher_id, date_deadline
            "#,
        )
        .bind(&test.title)
        .bind(&test.theme)
        .bind(&test.description)
        .bind(&test.answer)
        .bind(&test.teacher_id)
        .bind(test.date_deadline)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(test.title.clone())
            } else {
                StoreError::Database(format!("Failed to create test: {e}"))
            }
        })?;

        Ok(Test::from(row))
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM tests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to delete test: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("test {id}")));
        }
        Ok(())
    }
}
