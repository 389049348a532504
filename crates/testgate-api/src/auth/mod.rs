//! Authentication and authorization module
//!
//! This module provides token-based authentication with the following components:
//! - Password hashing with Argon2id
//! - Token encoding and validation (HS256, access and refresh purposes)
//! - Session manager for registration, login and refresh
//! - Role guard for protected operations
//! - Middleware for request authentication

pub mod error;
pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use error::AuthError;
pub use guard::{AuthorizationGuard, Operation};
pub use jwt::{decode_token, generate_access_token, Claims, JwtConfig, JwtError, TokenPurpose};
pub use middleware::{auth_middleware, bearer_token, AuthenticatedUser};
pub use password::{hash_password, verify_password, PasswordConfig};
pub use service::{
    AuthService, LoginRequest, RefreshRequest, RegisterRequest, TokenPair, UserInfo,
};
