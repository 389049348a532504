//! TestGate API Server

use anyhow::Context;
use std::sync::Arc;
use testgate_api::{
    create_router,
    state::{AppState, StorageKind},
};
use testgate_core::config::{AppConfig, LoggingConfig};
use testgate_core::store::{self, PgCredentialStore, PgTestStore};

fn init_tracing(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("{level},audit=info,tower_http=debug", level = config.level).into()
    });

    if config.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    if config.database.is_in_memory() {
        tracing::warn!("DATABASE_URL not set, accounts and tests live in memory only");
        return Ok(AppState::in_memory(config));
    }

    let pool = store::connect(&config.database.postgres_url, config.database.pool_size)
        .await
        .context("failed to connect to PostgreSQL")?;
    store::migrate(&pool)
        .await
        .context("failed to create schema")?;
    tracing::info!("Connected to PostgreSQL");

    Ok(AppState::new(
        config,
        Arc::new(PgCredentialStore::new(pool.clone())),
        Arc::new(PgTestStore::new(pool)),
        StorageKind::Postgres,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::load().context("invalid configuration")?;

    init_tracing(&config.logging);

    if config.auth.uses_development_secret() {
        tracing::warn!("JWT_SECRET not set, signing tokens with the development secret");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = Arc::new(build_state(config).await?);
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("TestGate API Server starting on http://{}", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
