//! Security audit logging for authentication events
//!
//! Logins, registrations, refreshes, rejected tokens, access denials and
//! test mutations are recorded as structured events on the `audit` target,
//! so they can be filtered and routed separately from application logs
//! (`RUST_LOG=audit=info`).
//!
//! Passwords and token strings are never part of an event.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use testgate_core::Role;
use tracing::{info, warn};

/// Security audit events for authentication and authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    LoginSuccess {
        login: String,
        role: Role,
    },

    /// Failed login; the reason is internal and never returned to the client
    LoginFailure {
        login: String,
        reason: String,
    },

    RegistrationSuccess {
        login: String,
        role: Role,
    },

    RegistrationFailure {
        login: String,
        reason: String,
    },

    TokenRefresh {
        login: String,
    },

    RefreshFailure {
        reason: String,
    },

    /// Invalid, expired or wrong-purpose token presented as a bearer credential
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },

    AccessDenied {
        login: String,
        role: Option<Role>,
        operation: String,
        required_role: Role,
    },

    TestCreated {
        login: String,
        test_id: i64,
        title: String,
    },

    TestDeleted {
        login: String,
        test_id: i64,
    },
}

impl AuditEvent {
    fn summary(&self) -> &'static str {
        match self {
            AuditEvent::LoginSuccess { .. } => "Login successful",
            AuditEvent::LoginFailure { .. } => "Login failed",
            AuditEvent::RegistrationSuccess { .. } => "User registered",
            AuditEvent::RegistrationFailure { .. } => "Registration failed",
            AuditEvent::TokenRefresh { .. } => "Token refresh",
            AuditEvent::RefreshFailure { .. } => "Token refresh rejected",
            AuditEvent::InvalidToken { .. } => "Invalid token presented",
            AuditEvent::AccessDenied { .. } => "Access denied",
            AuditEvent::TestCreated { .. } => "Test created",
            AuditEvent::TestDeleted { .. } => "Test deleted",
        }
    }

    /// Failures are logged at WARN, everything else at INFO
    fn is_failure(&self) -> bool {
        matches!(
            self,
            AuditEvent::LoginFailure { .. }
                | AuditEvent::RegistrationFailure { .. }
                | AuditEvent::RefreshFailure { .. }
                | AuditEvent::InvalidToken { .. }
                | AuditEvent::AccessDenied { .. }
        )
    }
}

/// Log a security audit event with structured fields
///
/// The event is serialized to JSON so log aggregators can index it:
///
/// ```json
/// {"event_type":"login_failure","login":"alice","reason":"wrong password"}
/// ```
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    if event.is_failure() {
        warn!(target: "audit", timestamp = %timestamp, event = %event_json, "{}", event.summary());
    } else {
        info!(target: "audit", timestamp = %timestamp, event = %event_json, "{}", event.summary());
    }
}

/// Extract IP address from request headers
///
/// Checks X-Forwarded-For, then X-Real-IP.
pub fn extract_ip_address(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            // First IP in the chain is the client
            if let Some(first_ip) = xff_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

/// Extract user agent from request headers
pub fn extract_user_agent(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}
