//! API route definitions

use crate::auth::middleware::auth_middleware;
use crate::handlers::{auth, health, test_resource};
use crate::openapi;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Create API routes
///
/// The test mutations are not behind `auth_middleware`: their handlers hand
/// the bearer token to the authorization guard, which needs to see it.
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/token/refresh", post(auth::refresh_handler))
        .route("/tests/:id", get(test_resource::get_test))
        .route("/tests/new", post(test_resource::create_test))
        .route("/tests/delete/:id", delete(test_resource::delete_test));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/auth/users/me", get(auth::me_handler))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
