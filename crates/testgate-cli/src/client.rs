//! HTTP client for the TestGate API
//!
//! Authenticated calls send the stored access token. A 401 triggers exactly
//! one refresh followed by one retry; a failed refresh clears the session.

use crate::error::ClientError;
use crate::session::{Session, SessionFile};
use chrono::NaiveDate;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use testgate_core::{Role, Test};

/// Token pair returned by login and refresh
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

/// Profile returned by `/auth/users/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub login: String,
    pub role: Role,
    pub full_name: String,
    pub identification_number: i64,
}

/// Fields for a new account
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub login: String,
    pub password: String,
    pub full_name: String,
    pub identification_number: i64,
    pub role: Role,
}

/// Fields for a new test
#[derive(Debug, Clone, Serialize)]
pub struct NewTestRequest {
    pub title: String,
    pub theme: String,
    pub description: String,
    pub answer: String,
    pub date_deadline: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
    session_file: SessionFile,
}

impl ApiClient {
    /// Create a client, picking up any session stored in `session_file`
    pub fn new(base_url: impl Into<String>, session_file: SessionFile) -> Result<Self, ClientError> {
        let session = session_file.load()?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            session_file,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn register(&self, registration: &Registration) -> Result<Value, ClientError> {
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(registration)
            .send()
            .await?;

        decode(response).await
    }

    /// Log in and persist the issued pair
    pub async fn login(&mut self, login: &str, password: &str) -> Result<TokenPair, ClientError> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "login": login, "password": password }))
            .send()
            .await?;

        let pair: TokenPair = decode(response).await?;
        self.update_session(Session::with_tokens(
            pair.access_token.clone(),
            pair.refresh_token.clone(),
        ))?;

        Ok(pair)
    }

    /// Forget the stored tokens; the server keeps no session to end
    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.update_session(self.session.cleared())
    }

    pub async fn whoami(&mut self) -> Result<Profile, ClientError> {
        let response = self
            .send_authorized(Method::GET, "/auth/users/me", None)
            .await?;
        decode(response).await
    }

    pub async fn get_test(&self, id: i64) -> Result<Test, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/tests/{id}")))
            .send()
            .await?;

        decode(response).await
    }

    pub async fn create_test(&mut self, request: &NewTestRequest) -> Result<Value, ClientError> {
        let body = serde_json::to_value(request)?;
        let response = self
            .send_authorized(Method::POST, "/tests/new", Some(&body))
            .await?;
        decode(response).await
    }

    pub async fn delete_test(&mut self, id: i64) -> Result<Value, ClientError> {
        let response = self
            .send_authorized(Method::DELETE, &format!("/tests/delete/{id}"), None)
            .await?;
        decode(response).await
    }

    /// Send with the access token, refreshing once on 401
    async fn send_authorized(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ClientError> {
        let token = self
            .session
            .bearer()
            .ok_or(ClientError::NotLoggedIn)?
            .to_string();

        let response = self.send_with_token(method.clone(), path, &token, body).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!(%path, "access token rejected, refreshing");
        self.refresh().await?;

        let token = self
            .session
            .bearer()
            .ok_or(ClientError::SessionExpired)?
            .to_string();
        self.send_with_token(method, path, &token, body).await
    }

    async fn send_with_token(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Response, ClientError> {
        let mut request = self.http.request(method, self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Redeem the refresh token; any failure ends the session
    async fn refresh(&mut self) -> Result<(), ClientError> {
        let Some(refresh_token) = self.session.refresh_credential().map(str::to_owned) else {
            self.update_session(self.session.cleared())?;
            return Err(ClientError::SessionExpired);
        };

        let response = self
            .http
            .post(self.url("/auth/token/refresh"))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        match decode::<TokenPair>(response).await {
            Ok(pair) => {
                self.update_session(Session::with_tokens(pair.access_token, pair.refresh_token))
            }
            Err(e) => {
                tracing::debug!(error = %e, "refresh rejected, clearing session");
                self.update_session(self.session.cleared())?;
                Err(ClientError::SessionExpired)
            }
        }
    }

    fn update_session(&mut self, session: Session) -> Result<(), ClientError> {
        self.session_file.save(&session)?;
        self.session = session;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Parse a success body, or turn the server's error body into `ClientError::Api`
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.code, body.message),
        Err(_) => ("HTTP_ERROR".to_string(), text),
    };

    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}
