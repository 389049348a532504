//! TestGate API - REST server
//!
//! Registration, login and token refresh, plus role-gated access to tests.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod resources;
pub mod routes;
pub mod state;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use state::AppState;
use std::sync::Arc;
use testgate_core::config::{AppConfig, ServerConfig};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router over `state`
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = routes::api_routes(state.clone())
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors_layer(&state.config.server) {
        router = router.layer(cors);
    }

    router
}

/// Router over fresh in-memory stores with fast password hashing
pub fn create_router_for_testing() -> Router {
    create_router(Arc::new(AppState::for_testing(AppConfig::default())))
}

/// CORS is off unless enabled with an explicit origin list
fn cors_layer(config: &ServerConfig) -> Option<CorsLayer> {
    if !config.cors_enabled || config.cors_origins.is_empty() {
        return None;
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS origins configured but none are valid");
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}
