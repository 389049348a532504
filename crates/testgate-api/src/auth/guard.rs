//! Role-based authorization
//!
//! Every protected operation is validated through the session manager first;
//! the role carried by the token is then compared against the role the
//! operation requires. Roles are matched exactly, there is no hierarchy.

use super::error::AuthError;
use super::jwt::Claims;
use super::service::AuthService;
use crate::audit::{audit_log, AuditEvent};
use testgate_core::Role;

/// Operations on the test resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ReadTest,
    CreateTest,
    DeleteTest,
}

impl Operation {
    /// Role a caller must hold, `None` for operations open to everyone
    pub fn required_role(self) -> Option<Role> {
        match self {
            Operation::ReadTest => None,
            Operation::CreateTest | Operation::DeleteTest => Some(Role::Teacher),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::ReadTest => "read_test",
            Operation::CreateTest => "create_test",
            Operation::DeleteTest => "delete_test",
        }
    }
}

/// Whether a token's role satisfies a required role
fn role_permits(actual: Option<Role>, required: Role) -> bool {
    match (required, actual) {
        (Role::Teacher, Some(Role::Teacher)) => true,
        (Role::Teacher, Some(Role::Student) | None) => false,
        (Role::Student, Some(Role::Student)) => true,
        (Role::Student, Some(Role::Teacher) | None) => false,
    }
}

/// Gatekeeper in front of protected operations
#[derive(Clone)]
pub struct AuthorizationGuard {
    sessions: AuthService,
}

impl AuthorizationGuard {
    pub fn new(sessions: AuthService) -> Self {
        Self { sessions }
    }

    /// Validate `token` and check it carries `required_role`
    ///
    /// With no required role any valid access token is accepted.
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - The caller's claims
    /// * `Err(AuthError::InvalidToken | MissingClaim)` - Token rejected
    /// * `Err(AuthError::Forbidden)` - Valid token, wrong or absent role
    pub fn authorize(&self, token: &str, required_role: Option<Role>) -> Result<Claims, AuthError> {
        self.check(token, required_role, "authorize")
    }

    /// Authorize a concrete operation
    ///
    /// Operations without a required role need no token and return
    /// `Ok(None)`. All others need one and return the caller's claims.
    pub fn authorize_operation(
        &self,
        token: Option<&str>,
        operation: Operation,
    ) -> Result<Option<Claims>, AuthError> {
        let Some(required) = operation.required_role() else {
            return Ok(None);
        };
        let token = token.ok_or(AuthError::MissingAuthHeader)?;

        self.check(token, Some(required), operation.as_str())
            .map(Some)
    }

    fn check(
        &self,
        token: &str,
        required_role: Option<Role>,
        operation: &str,
    ) -> Result<Claims, AuthError> {
        let claims = match self.sessions.validate(token) {
            Ok(claims) => claims,
            Err(e) => {
                audit_log(&AuditEvent::InvalidToken {
                    ip_address: None,
                    user_agent: None,
                    reason: format!("{operation}: {e}"),
                });
                return Err(e);
            }
        };

        let Some(required) = required_role else {
            return Ok(claims);
        };

        if role_permits(claims.role, required) {
            return Ok(claims);
        }

        audit_log(&AuditEvent::AccessDenied {
            login: claims.login().to_string(),
            role: claims.role,
            operation: operation.to_string(),
            required_role: required,
        });

        Err(AuthError::Forbidden(format!(
            "{} requires the {required} role",
            operation
        )))
    }
}
