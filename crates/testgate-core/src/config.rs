//! TestGate Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Signing secret used when nothing else is configured
pub const DEVELOPMENT_SECRET: &str = "development-secret-key-change-in-production";

/// Longest token lifetime accepted from configuration (10 years)
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database connection
    pub database: DatabaseConfig,

    /// Token and password settings
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Load the file named by `TESTGATE_CONFIG` (if any), then apply env overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("TESTGATE_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from a key lookup (env takes precedence over file values)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            self.server.port = parse_value("API_PORT", port)?;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // PostgreSQL
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.postgres_url = url;
        }
        if let Some(size) = lookup("DATABASE_POOL_SIZE") {
            self.database.pool_size = parse_value("DATABASE_POOL_SIZE", size)?;
        }

        // Tokens
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(issuer) = lookup("JWT_ISSUER") {
            self.auth.issuer = issuer;
        }
        if let Some(ttl) = lookup("JWT_ACCESS_EXPIRATION_SECS") {
            self.auth.access_token_ttl_secs = parse_value("JWT_ACCESS_EXPIRATION_SECS", ttl)?;
        }
        if let Some(ttl) = lookup("JWT_REFRESH_EXPIRATION_SECS") {
            self.auth.refresh_token_ttl_secs = parse_value("JWT_REFRESH_EXPIRATION_SECS", ttl)?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("LOG_JSON") {
            self.logging.json_format = parse_value("LOG_JSON", json)?;
        }

        Ok(())
    }

    /// Reject settings the auth core cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        check_ttl("JWT_ACCESS_EXPIRATION_SECS", self.auth.access_token_ttl_secs)?;
        check_ttl("JWT_REFRESH_EXPIRATION_SECS", self.auth.refresh_token_ttl_secs)?;
        Ok(())
    }
}

fn check_ttl(key: &str, ttl: u64) -> Result<(), ConfigError> {
    if ttl == 0 || ttl > MAX_TOKEN_TTL_SECS {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: ttl.to_string(),
        });
    }
    Ok(())
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_enabled: true,
            // Empty by default - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; empty selects the in-memory stores
    pub postgres_url: String,

    /// PostgreSQL connection pool size
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: String::new(),
            pool_size: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.postgres_url.trim().is_empty()
    }
}

/// Token signing and password hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Symmetric HMAC secret shared by every token
    pub jwt_secret: String,

    /// Token issuer identifier
    pub issuer: String,

    /// Access token lifetime in seconds (default: 30 minutes)
    pub access_token_ttl_secs: u64,

    /// Refresh token lifetime in seconds (default: 24 hours)
    pub refresh_token_ttl_secs: u64,

    /// Argon2 memory cost in KB
    pub password_memory_cost: u32,

    /// Argon2 iterations
    pub password_time_cost: u32,

    /// Argon2 lanes
    pub password_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEVELOPMENT_SECRET.to_string(),
            issuer: "testgate".to_string(),
            access_token_ttl_secs: 30 * 60,
            refresh_token_ttl_secs: 24 * 60 * 60,
            password_memory_cost: 19456, // 19 MB
            password_time_cost: 2,
            password_parallelism: 1,
        }
    }
}

impl AuthConfig {
    /// Whether the built-in development secret is still in use
    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEVELOPMENT_SECRET
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
