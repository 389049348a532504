//! API Integration Tests
//!
//! Every test drives the full router over in-memory stores with
//! `tower::ServiceExt::oneshot`.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use testgate_api::create_router_for_testing;
use tower::ServiceExt;

/// Helper to create a test request
fn create_json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };

    (status, json)
}

async fn register(app: &Router, login: &str, password: &str, role: &str) -> StatusCode {
    let (status, _) = send(
        app,
        create_json_request(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "login": login,
                "password": password,
                "full_name": format!("{login} Example"),
                "identification_number": 1001,
                "role": role,
            })),
        ),
    )
    .await;
    status
}

async fn login(app: &Router, login: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        create_json_request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "login": login, "password": password })),
        ),
    )
    .await
}

/// Register and log in, returning (access_token, refresh_token)
async fn session(app: &Router, user: &str, role: &str) -> (String, String) {
    assert_eq!(register(app, user, "pw1", role).await, StatusCode::CREATED);
    let (status, json) = login(app, user, "pw1").await;
    assert_eq!(status, StatusCode::OK);

    (
        json["access_token"].as_str().unwrap().to_string(),
        json["refresh_token"].as_str().unwrap().to_string(),
    )
}

fn quiz(title: &str) -> Value {
    json!({
        "title": title,
        "theme": "Algebra",
        "description": "Linear equations",
        "answer": "x = 2",
        "date_deadline": "2026-12-01",
    })
}

async fn create_quiz(app: &Router, token: &str, title: &str) -> (StatusCode, Value) {
    send(
        app,
        create_json_request("POST", "/tests/new", Some(token), Some(quiz(title))),
    )
    .await
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["storage"], "memory");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/auth/login"].is_object());
}

// =============================================================================
// Registration and Login Tests
// =============================================================================

#[tokio::test]
async fn test_register_and_login() {
    let app = create_router_for_testing();

    assert_eq!(
        register(&app, "alice", "pw1", "teacher").await,
        StatusCode::CREATED
    );

    let (status, json) = login(&app, "alice", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["token_type"], "bearer");
    assert_eq!(json["expires_in"], 1800);
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
}

#[tokio::test]
async fn test_register_duplicate_login() {
    let app = create_router_for_testing();

    assert_eq!(
        register(&app, "alice", "pw1", "teacher").await,
        StatusCode::CREATED
    );

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "login": "alice",
                "password": "other",
                "full_name": "Another Alice",
                "identification_number": 7,
                "role": "student",
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "ALREADY_EXISTS");

    // The original password still works
    let (status, _) = login(&app, "alice", "pw1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_empty_login_rejected() {
    let app = create_router_for_testing();

    assert_eq!(
        register(&app, "  ", "pw1", "student").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_register_unknown_role_rejected() {
    let app = create_router_for_testing();

    let status = register(&app, "mallory", "pw1", "admin").await;
    assert!(status.is_client_error());

    let (status, _) = login(&app, "mallory", "pw1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = create_router_for_testing();
    assert_eq!(
        register(&app, "alice", "pw1", "student").await,
        StatusCode::CREATED
    );

    let (unknown_status, unknown_body) = login(&app, "nobody", "pw1").await;
    let (wrong_status, wrong_body) = login(&app, "alice", "wrong").await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_body, wrong_body);
    assert_eq!(unknown_body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_me_returns_profile() {
    let app = create_router_for_testing();
    let (access, _) = session(&app, "bob", "student").await;

    let (status, json) = send(
        &app,
        create_json_request("GET", "/auth/users/me", Some(&access), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["login"], "bob");
    assert_eq!(json["role"], "student");
    assert_eq!(json["full_name"], "bob Example");
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        create_json_request("GET", "/auth/users/me", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let (status, json) = send(
        &app,
        create_json_request("GET", "/auth/users/me", Some("not-a-jwt"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "INVALID_TOKEN");
}

// =============================================================================
// Token Refresh Tests
// =============================================================================

#[tokio::test]
async fn test_refresh_token_works() {
    let app = create_router_for_testing();
    let (_, refresh) = session(&app, "alice", "teacher").await;

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/auth/token/refresh",
            None,
            Some(json!({ "refresh_token": refresh })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The new access token carries the teacher role
    let access = json["access_token"].as_str().unwrap();
    let (status, _) = create_quiz(&app, access, "Quiz1").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_refresh_with_garbage_is_session_expired() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/auth/token/refresh",
            None,
            Some(json!({ "refresh_token": "garbage" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "SESSION_EXPIRED");
}

#[tokio::test]
async fn test_access_token_cannot_refresh() {
    let app = create_router_for_testing();
    let (access, _) = session(&app, "alice", "teacher").await;

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/auth/token/refresh",
            None,
            Some(json!({ "refresh_token": access })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "SESSION_EXPIRED");
}

#[tokio::test]
async fn test_refresh_token_is_not_a_bearer_credential() {
    let app = create_router_for_testing();
    let (_, refresh) = session(&app, "alice", "teacher").await;

    let (status, json) = create_quiz(&app, &refresh, "Quiz1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "INVALID_TOKEN");

    let (status, _) = send(
        &app,
        create_json_request("GET", "/auth/users/me", Some(&refresh), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Test Resource Tests
// =============================================================================

#[tokio::test]
async fn test_teacher_creates_and_anyone_reads() {
    let app = create_router_for_testing();
    let (teacher, _) = session(&app, "alice", "teacher").await;

    let (status, json) = create_quiz(&app, &teacher, "Quiz1").await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json["id"].as_i64().unwrap();

    let (status, json) = send(
        &app,
        create_json_request("GET", &format!("/tests/{id}"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Quiz1");
    assert_eq!(json["teacher_id"], "alice");
    assert_eq!(json["date_deadline"], "2026-12-01");
}

#[tokio::test]
async fn test_duplicate_title_rejected() {
    let app = create_router_for_testing();
    let (teacher, _) = session(&app, "alice", "teacher").await;

    let (status, _) = create_quiz(&app, &teacher, "Quiz1").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = create_quiz(&app, &teacher, "Quiz1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_student_cannot_create_or_delete() {
    let app = create_router_for_testing();
    let (teacher, _) = session(&app, "alice", "teacher").await;
    let (student, _) = session(&app, "bob", "student").await;

    let (_, json) = create_quiz(&app, &teacher, "Quiz1").await;
    let id = json["id"].as_i64().unwrap();

    let (status, json) = create_quiz(&app, &student, "Quiz2").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");

    let (status, _) = send(
        &app,
        create_json_request("DELETE", &format!("/tests/delete/{id}"), Some(&student), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Still there
    let (status, _) = send(
        &app,
        create_json_request("GET", &format!("/tests/{id}"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_teacher_deletes_test() {
    let app = create_router_for_testing();
    let (teacher, _) = session(&app, "alice", "teacher").await;

    let (_, json) = create_quiz(&app, &teacher, "Quiz1").await;
    let id = json["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        create_json_request("DELETE", &format!("/tests/delete/{id}"), Some(&teacher), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(
        &app,
        create_json_request("GET", &format!("/tests/{id}"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_delete_missing_test_is_not_found() {
    let app = create_router_for_testing();
    let (teacher, _) = session(&app, "alice", "teacher").await;

    let (status, _) = send(
        &app,
        create_json_request("DELETE", "/tests/delete/99", Some(&teacher), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mutations_require_token() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        create_json_request("POST", "/tests/new", None, Some(quiz("Quiz1"))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let (status, _) = send(
        &app,
        create_json_request("DELETE", "/tests/delete/1", Some("garbage"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_bearer_scheme_rejected() {
    let app = create_router_for_testing();

    let request = Request::builder()
        .method("POST")
        .uri("/tests/new")
        .header("Content-Type", "application/json")
        .header("Authorization", "Basic YWxpY2U6cHcx")
        .body(Body::from(quiz("Quiz1").to_string()))
        .unwrap();

    let (status, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}
