//! JWT token generation and validation
//!
//! Implements the token codec with HMAC-SHA256 signing. Every token carries a
//! `purpose` claim so an access token can never be redeemed as a refresh token
//! and a refresh token can never be presented as a bearer credential.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use testgate_core::{AuthConfig, Role};
use thiserror::Error;
use uuid::Uuid;

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    /// Short-lived bearer credential for API calls
    Access,
    /// Long-lived credential redeemable only at the refresh endpoint
    Refresh,
}

/// JWT Claims structure containing user information
///
/// These claims are embedded in every token and extracted during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - the user's login
    pub sub: String,
    /// JWT ID - unique per issued token
    pub jti: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
    /// User's role, absent for role-less subjects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Access or refresh
    pub purpose: TokenPurpose,
}

impl Claims {
    /// The login this token was issued to
    pub fn login(&self) -> &str {
        &self.sub
    }
}

/// Wire shape used while decoding, before the mandatory subject is checked
#[derive(Debug, Deserialize)]
struct RawClaims {
    iss: String,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    jti: String,
    #[serde(default)]
    iat: u64,
    exp: u64,
    #[serde(default)]
    role: Option<Role>,
    purpose: TokenPurpose,
}

/// JWT token generation and validation errors
///
/// Signature, structure, issuer, purpose and expiry failures all collapse into
/// `InvalidToken` so callers cannot tell a forged token from an expired one.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Token lifetime must be positive and representable")]
    InvalidTtl,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token is missing the login claim")]
    MissingClaim,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// JWT Configuration
///
/// Built once from [`AuthConfig`] and handed to every component that signs or
/// verifies tokens.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Token issuer identifier
    pub issuer: String,
    /// Access token expiration time in seconds
    pub access_expiration_secs: u64,
    /// Refresh token expiration time in seconds
    pub refresh_expiration_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            issuer: config.issuer.clone(),
            access_expiration_secs: config.access_token_ttl_secs,
            refresh_expiration_secs: config.refresh_token_ttl_secs,
        }
    }
}

impl JwtConfig {
    /// Lifetime configured for tokens of the given purpose
    pub fn ttl_for(&self, purpose: TokenPurpose) -> u64 {
        match purpose {
            TokenPurpose::Access => self.access_expiration_secs,
            TokenPurpose::Refresh => self.refresh_expiration_secs,
        }
    }
}

fn now_secs() -> Result<u64, JwtError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Encode a token for `login` that expires `ttl_secs` from now
///
/// # Arguments
///
/// * `config` - JWT configuration containing the signing secret and issuer
/// * `login` - The user's login, stored as the subject
/// * `role` - The user's role (optional)
/// * `purpose` - Whether this is an access or refresh token
/// * `ttl_secs` - Lifetime in seconds, must be greater than zero
///
/// # Example
///
/// ```no_run
/// use testgate_api::auth::jwt::{encode_token, JwtConfig, TokenPurpose};
/// use testgate_core::Role;
///
/// let config = JwtConfig::default();
/// let token = encode_token(&config, "alice", Some(Role::Teacher), TokenPurpose::Access, 1800)
///     .expect("Failed to generate token");
/// ```
pub fn encode_token(
    config: &JwtConfig,
    login: &str,
    role: Option<Role>,
    purpose: TokenPurpose,
    ttl_secs: u64,
) -> Result<String, JwtError> {
    if ttl_secs == 0 {
        return Err(JwtError::InvalidTtl);
    }

    let now = now_secs()?;
    let exp = now.checked_add(ttl_secs).ok_or(JwtError::InvalidTtl)?;
    let claims = Claims {
        iss: config.issuer.clone(),
        sub: login.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now,
        exp,
        role,
        purpose,
    };

    encode_claims(config, &claims)
}

/// Sign pre-built claims without touching their timestamps
pub fn encode_claims(config: &JwtConfig, claims: &Claims) -> Result<String, JwtError> {
    let token = encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Generate an access token using the configured access lifetime
pub fn generate_access_token(
    config: &JwtConfig,
    login: &str,
    role: Option<Role>,
) -> Result<String, JwtError> {
    let purpose = TokenPurpose::Access;
    encode_token(config, login, role, purpose, config.ttl_for(purpose))
}

/// Generate a refresh token using the configured refresh lifetime
pub fn generate_refresh_token(
    config: &JwtConfig,
    login: &str,
    role: Option<Role>,
) -> Result<String, JwtError> {
    let purpose = TokenPurpose::Refresh;
    encode_token(config, login, role, purpose, config.ttl_for(purpose))
}

/// Validate a token and extract its claims
///
/// # Returns
///
/// * `Ok(Claims)` - Decoded and validated claims
/// * `Err(JwtError::InvalidToken)` - Bad signature, malformed, wrong issuer,
///   wrong purpose, or `now >= exp`
/// * `Err(JwtError::MissingClaim)` - Signature valid but no login in the token
pub fn decode_token(
    config: &JwtConfig,
    token: &str,
    expected: TokenPurpose,
) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_required_spec_claims(&["exp", "iss"]);
    validation.leeway = 0;

    let token_data = decode::<RawClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(kind = ?e.kind(), "token rejected");
        JwtError::InvalidToken
    })?;
    let raw = token_data.claims;

    // jsonwebtoken accepts exp == now; expiry is exclusive here
    if now_secs()? >= raw.exp {
        return Err(JwtError::InvalidToken);
    }

    if raw.purpose != expected {
        tracing::debug!(?expected, actual = ?raw.purpose, "token purpose mismatch");
        return Err(JwtError::InvalidToken);
    }

    let sub = match raw.sub {
        Some(sub) if !sub.is_empty() => sub,
        _ => return Err(JwtError::MissingClaim),
    };

    Ok(Claims {
        iss: raw.iss,
        sub,
        jti: raw.jti,
        iat: raw.iat,
        exp: raw.exp,
        role: raw.role,
        purpose: raw.purpose,
    })
}
