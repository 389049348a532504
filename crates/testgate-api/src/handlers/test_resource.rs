//! Test resource handlers
//!
//! Reads are public. Create and delete take the caller's bearer token
//! straight to the authorization guard.

use crate::auth::bearer_token;
use crate::error::AppError;
use crate::resources::CreateTestRequest;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Response for test mutations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TestMutationResponse {
    pub id: i64,
    pub message: String,
}

/// Get a test by id
#[utoipa::path(
    get,
    path = "/tests/{id}",
    tag = "tests",
    params(("id" = i64, Path, description = "Test id")),
    responses(
        (status = 200, description = "The test", body = testgate_core::Test),
        (status = 404, description = "No such test", body = crate::error::ApiError),
    )
)]
pub async fn get_test(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let test = state.tests.get(id).await?;

    Ok(Json(test))
}

/// Create a test
///
/// Teacher only. The owning teacher is the login in the bearer token.
#[utoipa::path(
    post,
    path = "/tests/new",
    tag = "tests",
    request_body = CreateTestRequest,
    responses(
        (status = 201, description = "Test created", body = TestMutationResponse),
        (status = 400, description = "Title already exists", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 403, description = "Caller is not a teacher", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_test(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&headers)?;
    let test = state.tests.create(token, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(TestMutationResponse {
            id: test.id,
            message: format!("Test {} created", test.title),
        }),
    ))
}

/// Delete a test by id
///
/// Teacher only.
#[utoipa::path(
    delete,
    path = "/tests/delete/{id}",
    tag = "tests",
    params(("id" = i64, Path, description = "Test id")),
    responses(
        (status = 200, description = "Test deleted", body = TestMutationResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 403, description = "Caller is not a teacher", body = crate::error::ApiError),
        (status = 404, description = "No such test", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_test(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&headers)?;
    state.tests.delete(token, id).await?;

    Ok(Json(TestMutationResponse {
        id,
        message: format!("Test {id} deleted"),
    }))
}
