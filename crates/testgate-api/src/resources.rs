//! Test resource service
//!
//! Reads are public. Creation and deletion go through the authorization
//! guard first; the store is touched only once the caller is authorized.

use crate::audit::{audit_log, AuditEvent};
use crate::auth::{AuthError, AuthorizationGuard, Operation};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use testgate_core::{NewTest, Test, TestStore};
use utoipa::ToSchema;

/// Request body for creating a test
///
/// The owning teacher is taken from the caller's token, not the body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTestRequest {
    #[schema(example = "Quiz1")]
    pub title: String,
    pub theme: String,
    pub description: String,
    pub answer: String,
    #[schema(value_type = String, format = Date, example = "2026-12-01")]
    pub date_deadline: NaiveDate,
}

#[derive(Clone)]
pub struct TestService {
    guard: AuthorizationGuard,
    store: Arc<dyn TestStore>,
}

impl TestService {
    pub fn new(guard: AuthorizationGuard, store: Arc<dyn TestStore>) -> Self {
        Self { guard, store }
    }

    /// Fetch a test by id; no credentials required
    pub async fn get(&self, id: i64) -> Result<Test, AuthError> {
        self.guard.authorize_operation(None, Operation::ReadTest)?;

        self.store
            .find(id)
            .await?
            .ok_or_else(|| AuthError::NotFound(format!("test {id}")))
    }

    /// Create a test owned by the calling teacher
    pub async fn create(
        &self,
        token: Option<&str>,
        request: CreateTestRequest,
    ) -> Result<Test, AuthError> {
        let claims = self
            .guard
            .authorize_operation(token, Operation::CreateTest)?
            .ok_or(AuthError::MissingAuthHeader)?;

        let test = self
            .store
            .create(NewTest {
                title: request.title,
                theme: request.theme,
                description: request.description,
                answer: request.answer,
                teacher_id: claims.login().to_string(),
                date_deadline: request.date_deadline,
            })
            .await?;

        audit_log(&AuditEvent::TestCreated {
            login: claims.sub,
            test_id: test.id,
            title: test.title.clone(),
        });

        Ok(test)
    }

    /// Delete a test by id
    ///
    /// Authorization happens before the existence check, so a student
    /// learns nothing about which ids exist.
    pub async fn delete(&self, token: Option<&str>, id: i64) -> Result<(), AuthError> {
        let claims = self
            .guard
            .authorize_operation(token, Operation::DeleteTest)?
            .ok_or(AuthError::MissingAuthHeader)?;

        if self.store.find(id).await?.is_none() {
            return Err(AuthError::NotFound(format!("test {id}")));
        }

        self.store.delete(id).await?;

        audit_log(&AuditEvent::TestDeleted {
            login: claims.sub,
            test_id: id,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_access_token, AuthService, JwtConfig, PasswordConfig};
    use testgate_core::store::{InMemoryCredentialStore, InMemoryTestStore};
    use testgate_core::Role;

    struct Fixture {
        service: TestService,
        store: Arc<InMemoryTestStore>,
        teacher: String,
        student: String,
    }

    fn fixture() -> Fixture {
        let jwt = JwtConfig::default();
        let sessions = AuthService::new(
            Arc::new(InMemoryCredentialStore::new()),
            jwt.clone(),
            PasswordConfig::insecure_fast(),
        );
        let store = Arc::new(InMemoryTestStore::new());

        Fixture {
            service: TestService::new(AuthorizationGuard::new(sessions), store.clone()),
            store,
            teacher: generate_access_token(&jwt, "alice", Some(Role::Teacher)).unwrap(),
            student: generate_access_token(&jwt, "bob", Some(Role::Student)).unwrap(),
        }
    }

    fn quiz(title: &str) -> CreateTestRequest {
        CreateTestRequest {
            title: title.to_string(),
            theme: "Algebra".to_string(),
            description: "Linear equations".to_string(),
            answer: "x = 2".to_string(),
            date_deadline: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_teacher_creates_and_anyone_reads() {
        let f = fixture();

        let created = f
            .service
            .create(Some(&f.teacher), quiz("Quiz1"))
            .await
            .unwrap();
        assert_eq!(created.teacher_id, "alice");

        let fetched = f.service.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_duplicate_title_already_exists() {
        let f = fixture();
        f.service
            .create(Some(&f.teacher), quiz("Quiz1"))
            .await
            .unwrap();

        let result = f.service.create(Some(&f.teacher), quiz("Quiz1")).await;
        assert!(matches!(result, Err(AuthError::AlreadyExists(_))));
        assert_eq!(f.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_student_cannot_mutate() {
        let f = fixture();
        let created = f
            .service
            .create(Some(&f.teacher), quiz("Quiz1"))
            .await
            .unwrap();

        assert!(matches!(
            f.service.create(Some(&f.student), quiz("Quiz2")).await,
            Err(AuthError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.delete(Some(&f.student), created.id).await,
            Err(AuthError::Forbidden(_))
        ));

        assert_eq!(f.store.len().await, 1);
        assert!(f.store.find(created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_student_delete_of_missing_id_is_still_forbidden() {
        let f = fixture();

        assert!(matches!(
            f.service.delete(Some(&f.student), 404).await,
            Err(AuthError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_teacher_deletes() {
        let f = fixture();
        let created = f
            .service
            .create(Some(&f.teacher), quiz("Quiz1"))
            .await
            .unwrap();

        f.service.delete(Some(&f.teacher), created.id).await.unwrap();

        assert!(f.store.find(created.id).await.unwrap().is_none());
        assert!(matches!(
            f.service.get(created.id).await,
            Err(AuthError::NotFound(_))
        ));
        assert!(matches!(
            f.service.delete(Some(&f.teacher), created.id).await,
            Err(AuthError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_fifth_of_five_tests() {
        let f = fixture();
        for n in 1..=5 {
            f.service
                .create(Some(&f.teacher), quiz(&format!("Quiz{n}")))
                .await
                .unwrap();
        }
        assert_eq!(f.store.find(5).await.unwrap().unwrap().title, "Quiz5");

        assert!(matches!(
            f.service.delete(Some(&f.student), 5).await,
            Err(AuthError::Forbidden(_))
        ));
        assert_eq!(f.store.len().await, 5);
        assert!(f.store.find(5).await.unwrap().is_some());

        f.service.delete(Some(&f.teacher), 5).await.unwrap();
        assert!(f.store.find(5).await.unwrap().is_none());
        assert_eq!(f.store.len().await, 4);
    }

    #[tokio::test]
    async fn test_mutation_without_token() {
        let f = fixture();

        assert!(matches!(
            f.service.create(None, quiz("Quiz1")).await,
            Err(AuthError::MissingAuthHeader)
        ));
        assert!(f.store.is_empty().await);
    }
}
