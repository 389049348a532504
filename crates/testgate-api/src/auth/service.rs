//! Authentication service layer
//!
//! The session manager: registration, login, access-token validation and
//! token refresh. Sessions are stateless; the token pair handed to the
//! client is the whole session and nothing is revoked server-side.

use super::error::AuthError;
use super::jwt::{
    decode_token, generate_access_token, generate_refresh_token, Claims, JwtConfig, TokenPurpose,
};
use super::password::{hash_password_with_config, verify_password, PasswordConfig};
use crate::audit::{audit_log, AuditEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use testgate_core::{AuthConfig, CredentialStore, NewUser, Role, User, UserProfile};
use utoipa::ToSchema;

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
    pub full_name: String,
    pub identification_number: i64,
    pub role: Role,
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Access and refresh token issued together
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "bearer"
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

/// Public profile of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub login: String,
    pub role: Role,
    pub full_name: String,
    pub identification_number: i64,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            login: user.login,
            role: user.role,
            full_name: user.profile.full_name,
            identification_number: user.profile.identification_number,
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    jwt_config: JwtConfig,
    password_config: PasswordConfig,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        users: Arc<dyn CredentialStore>,
        jwt_config: JwtConfig,
        password_config: PasswordConfig,
    ) -> Self {
        Self {
            users,
            jwt_config,
            password_config,
        }
    }

    /// Create a service whose token and hashing settings come from `config`
    pub fn from_config(users: Arc<dyn CredentialStore>, config: &AuthConfig) -> Self {
        Self::new(users, JwtConfig::from(config), PasswordConfig::from(config))
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    /// Register a new user
    ///
    /// # Returns
    ///
    /// * `Ok(UserInfo)` - Newly created user
    /// * `Err(AuthError::AlreadyExists)` - The login is taken
    pub async fn register(&self, request: RegisterRequest) -> Result<UserInfo, AuthError> {
        let RegisterRequest {
            login,
            password,
            full_name,
            identification_number,
            role,
        } = request;

        if self.users.find_by_login(&login).await?.is_some() {
            audit_log(&AuditEvent::RegistrationFailure {
                login: login.clone(),
                reason: "login already registered".to_string(),
            });
            return Err(AuthError::AlreadyExists(login));
        }

        // Hash fully before anything is persisted
        let password_hash = self.hash(password).await?;

        let user = self
            .users
            .create(NewUser {
                login: login.clone(),
                password_hash,
                role,
                profile: UserProfile {
                    full_name,
                    identification_number,
                },
            })
            .await
            .map_err(|e| {
                let err = AuthError::from(e);
                if matches!(err, AuthError::AlreadyExists(_)) {
                    audit_log(&AuditEvent::RegistrationFailure {
                        login: login.clone(),
                        reason: "login registered concurrently".to_string(),
                    });
                }
                err
            })?;

        audit_log(&AuditEvent::RegistrationSuccess {
            login: user.login.clone(),
            role: user.role,
        });

        Ok(UserInfo::from(user))
    }

    /// Login with login name and password
    ///
    /// Unknown logins and wrong passwords both yield `InvalidCredentials`.
    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair, AuthError> {
        let user = match self.users.find_by_login(&request.login).await? {
            Some(user) => user,
            None => {
                audit_log(&AuditEvent::LoginFailure {
                    login: request.login,
                    reason: "unknown login".to_string(),
                });
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.verify(request.password, user.password_hash.clone()).await? {
            audit_log(&AuditEvent::LoginFailure {
                login: user.login,
                reason: "wrong password".to_string(),
            });
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issue_pair(&user)?;

        audit_log(&AuditEvent::LoginSuccess {
            login: user.login,
            role: user.role,
        });

        Ok(pair)
    }

    /// Validate an access token and return its claims
    ///
    /// On `InvalidToken` the caller is expected to try [`AuthService::refresh`].
    pub fn validate(&self, access_token: &str) -> Result<Claims, AuthError> {
        Ok(decode_token(
            &self.jwt_config,
            access_token,
            TokenPurpose::Access,
        )?)
    }

    /// Exchange a refresh token for a fresh token pair
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - New pair carrying the user's current role
    /// * `Err(AuthError::SessionExpired)` - Refresh token invalid or expired
    /// * `Err(AuthError::InvalidCredentials)` - The account no longer exists
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = decode_token(&self.jwt_config, refresh_token, TokenPurpose::Refresh)
            .map_err(|e| {
                audit_log(&AuditEvent::RefreshFailure {
                    reason: e.to_string(),
                });
                AuthError::SessionExpired
            })?;

        let user = match self.users.find_by_login(claims.login()).await? {
            Some(user) => user,
            None => {
                audit_log(&AuditEvent::RefreshFailure {
                    reason: format!("account {} no longer exists", claims.login()),
                });
                return Err(AuthError::InvalidCredentials);
            }
        };

        let pair = self.issue_pair(&user)?;

        audit_log(&AuditEvent::TokenRefresh { login: user.login });

        Ok(pair)
    }

    /// Profile of the account a token was issued to
    pub async fn current_user(&self, login: &str) -> Result<UserInfo, AuthError> {
        self.users
            .find_by_login(login)
            .await?
            .map(UserInfo::from)
            .ok_or_else(|| AuthError::NotFound(format!("user {login}")))
    }

    fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access_token = generate_access_token(&self.jwt_config, &user.login, Some(user.role))?;
        let refresh_token = generate_refresh_token(&self.jwt_config, &user.login, Some(user.role))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in: self.jwt_config.access_expiration_secs,
        })
    }

    /// Argon2 is CPU-bound, keep it off the async workers
    async fn hash(&self, password: String) -> Result<String, AuthError> {
        let config = self.password_config.clone();
        tokio::task::spawn_blocking(move || hash_password_with_config(&password, &config))
            .await
            .map_err(|e| AuthError::Internal(format!("hashing task failed: {e}")))?
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    async fn verify(&self, password: String, hash: String) -> Result<bool, AuthError> {
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("verification task failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::encode_claims;
    use std::time::{SystemTime, UNIX_EPOCH};
    use testgate_core::store::InMemoryCredentialStore;

    fn service_with_store() -> (AuthService, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let service = AuthService::new(
            store.clone(),
            JwtConfig::default(),
            PasswordConfig::insecure_fast(),
        );
        (service, store)
    }

    fn register_request(login: &str, password: &str, role: Role) -> RegisterRequest {
        RegisterRequest {
            login: login.to_string(),
            password: password.to_string(),
            full_name: format!("{login} Example"),
            identification_number: 1001,
            role,
        }
    }

    fn login_request(login: &str, password: &str) -> LoginRequest {
        LoginRequest {
            login: login.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (service, store) = service_with_store();

        let info = service
            .register(register_request("alice", "pw1", Role::Teacher))
            .await
            .unwrap();
        assert_eq!(info.login, "alice");
        assert_eq!(info.role, Role::Teacher);

        let stored = store.find_by_login("alice").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "pw1");

        let pair = service.login(login_request("alice", "pw1")).await.unwrap();
        assert_eq!(pair.token_type, "bearer");
        assert_eq!(pair.expires_in, 1800);

        let claims = service.validate(&pair.access_token).unwrap();
        assert_eq!(claims.login(), "alice");
        assert_eq!(claims.role, Some(Role::Teacher));
    }

    #[tokio::test]
    async fn test_register_duplicate_login() {
        let (service, store) = service_with_store();
        service
            .register(register_request("alice", "pw1", Role::Teacher))
            .await
            .unwrap();

        let result = service
            .register(register_request("alice", "other", Role::Student))
            .await;
        assert!(matches!(result, Err(AuthError::AlreadyExists(login)) if login == "alice"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_are_indistinguishable() {
        let (service, _) = service_with_store();
        service
            .register(register_request("alice", "pw1", Role::Student))
            .await
            .unwrap();

        let unknown = service
            .login(login_request("nobody", "pw1"))
            .await
            .unwrap_err();
        let wrong = service
            .login(login_request("alice", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.code(), wrong.code());
        assert_eq!(unknown.status(), wrong.status());
    }

    #[tokio::test]
    async fn test_refresh_issues_new_pair() {
        let (service, _) = service_with_store();
        service
            .register(register_request("alice", "pw1", Role::Teacher))
            .await
            .unwrap();
        let pair = service.login(login_request("alice", "pw1")).await.unwrap();

        let refreshed = service.refresh(&pair.refresh_token).await.unwrap();
        let claims = service.validate(&refreshed.access_token).unwrap();
        assert_eq!(claims.login(), "alice");
        assert_eq!(claims.role, Some(Role::Teacher));
        assert_ne!(refreshed.refresh_token, pair.refresh_token);
    }

    #[tokio::test]
    async fn test_refresh_with_expired_token_is_session_expired() {
        let (service, _) = service_with_store();
        service
            .register(register_request("alice", "pw1", Role::Teacher))
            .await
            .unwrap();

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let expired = encode_claims(
            service.jwt_config(),
            &Claims {
                iss: service.jwt_config().issuer.clone(),
                sub: "alice".to_string(),
                jti: "expired".to_string(),
                iat: now - 90_000,
                exp: now - 3_600,
                role: Some(Role::Teacher),
                purpose: TokenPurpose::Refresh,
            },
        )
        .unwrap();

        let result = service.refresh(&expired).await;
        assert!(matches!(result, Err(AuthError::SessionExpired)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let (service, _) = service_with_store();
        service
            .register(register_request("alice", "pw1", Role::Teacher))
            .await
            .unwrap();
        let pair = service.login(login_request("alice", "pw1")).await.unwrap();

        let result = service.refresh(&pair.access_token).await;
        assert!(matches!(result, Err(AuthError::SessionExpired)));
    }

    #[tokio::test]
    async fn test_validate_rejects_refresh_token() {
        let (service, _) = service_with_store();
        service
            .register(register_request("alice", "pw1", Role::Teacher))
            .await
            .unwrap();
        let pair = service.login(login_request("alice", "pw1")).await.unwrap();

        assert!(matches!(
            service.validate(&pair.refresh_token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_user_is_invalid_credentials() {
        let (service, store) = service_with_store();
        service
            .register(register_request("alice", "pw1", Role::Teacher))
            .await
            .unwrap();
        let pair = service.login(login_request("alice", "pw1")).await.unwrap();

        store.delete("alice").await.unwrap();

        let result = service.refresh(&pair.refresh_token).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_current_user() {
        let (service, store) = service_with_store();
        service
            .register(register_request("bob", "pw", Role::Student))
            .await
            .unwrap();

        let info = service.current_user("bob").await.unwrap();
        assert_eq!(info.full_name, "bob Example");
        assert_eq!(info.role, Role::Student);

        store.delete("bob").await.unwrap();
        assert!(matches!(
            service.current_user("bob").await,
            Err(AuthError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_tokens_from_other_deployment_are_rejected() {
        let (service, _) = service_with_store();
        let foreign = JwtConfig {
            secret: "another-secret".to_string(),
            ..JwtConfig::default()
        };
        let token = generate_access_token(&foreign, "alice", Some(Role::Teacher)).unwrap();

        assert!(matches!(service.validate(&token), Err(AuthError::InvalidToken)));
    }
}
