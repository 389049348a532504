//! Authentication API handlers
//!
//! Provides HTTP endpoints for registration, login, token refresh and the
//! caller's own profile.

use crate::auth::{
    AuthenticatedUser, LoginRequest, RefreshRequest, RegisterRequest, TokenPair, UserInfo,
};
use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use testgate_core::Role;
use utoipa::ToSchema;

/// Registration response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub login: String,
    pub role: Role,
    pub message: String,
}

/// Register a new user account
///
/// # Responses
///
/// * `201 Created` - User successfully registered
/// * `400 Bad Request` - Empty login or password, or login already exists
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Invalid input or login taken", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.login.trim().is_empty() {
        return Err(AppError::BadRequest("login must not be empty".to_string()));
    }
    if request.password.is_empty() {
        return Err(AppError::BadRequest("password must not be empty".to_string()));
    }

    let user = state.auth.register(request).await?;

    let response = RegisterResponse {
        login: user.login,
        role: user.role,
        message: "Registration successful".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with login name and password
///
/// Returns an access and refresh token pair. Unknown logins and wrong
/// passwords produce the same 401 response.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenPair),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.auth.login(request).await?;

    Ok(Json(pair))
}

/// Refresh access token
///
/// Exchanges a valid refresh token for a new token pair. The previous pair
/// stays valid until it expires.
#[utoipa::path(
    post,
    path = "/auth/token/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = TokenPair),
        (status = 401, description = "Session expired or account gone", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.auth.refresh(&request.refresh_token).await?;

    Ok(Json(pair))
}

/// Get current user profile
#[utoipa::path(
    get,
    path = "/auth/users/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user profile", body = UserInfo),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Account no longer exists", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let info = state.auth.current_user(&user.login).await?;

    Ok(Json(info))
}
