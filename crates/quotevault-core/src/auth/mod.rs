//! Supabase (GoTrue) email/password authentication.

use std::fmt;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ClientConfig;
use crate::models::UserId;
use crate::util::{is_valid_email, unix_timestamp_now};

const EXPIRY_SKEW_SECONDS: i64 = 60;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }

    pub const fn user_id(&self) -> &UserId {
        &self.user.id
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    /// The project requires email confirmation before the first sign-in
    ConfirmationRequired,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("{0}")]
    Validation(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Where the signed-in session survives between runs.
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

#[derive(Clone)]
pub struct SupabaseAuthClient<S: SessionPersistence> {
    auth_url: String,
    anon_key: String,
    client: Client,
    store: S,
}

impl<S: SessionPersistence> SupabaseAuthClient<S> {
    pub fn new(config: &ClientConfig, store: S) -> AuthResult<Self> {
        Ok(Self {
            auth_url: config.auth_url(),
            anon_key: config.supabase_anon_key.clone(),
            client: Client::builder().timeout(config.request_timeout()).build()?,
            store,
        })
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Load the persisted session, refreshing it when it is about to expire.
    ///
    /// A session that cannot be refreshed is cleared and `None` is returned.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored_session) = self.store.load_session()? else {
            return Ok(None);
        };

        if !stored_session.is_expired() {
            return Ok(Some(stored_session));
        }

        match self.refresh_session(&stored_session.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error) => {
                tracing::warn!("Failed to refresh persisted session: {}", error);
                self.store.clear_session()?;
                Ok(None)
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        let email = validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let request = self.public_request(
            self.client
                .post(format!("{}/signup", self.auth_url))
                .json(&serde_json::json!({ "email": email, "password": password })),
        );
        let response = self.send_auth_request(request).await?;
        match response.into_session()? {
            Some(session) => {
                self.store.save_session(&session)?;
                tracing::info!(user = %session.user_id(), "Signed up");
                Ok(SignUpOutcome::SignedIn(session))
            }
            None => Ok(SignUpOutcome::ConfirmationRequired),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        let request = self.public_request(
            self.client
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", "password")])
                .json(&serde_json::json!({ "email": email, "password": password })),
        );
        let response = self.send_auth_request(request).await?;
        let session = response.into_session()?.ok_or_else(|| {
            AuthError::Api("Sign-in response did not include an active session".to_string())
        })?;

        self.store.save_session(&session)?;
        tracing::info!(user = %session.user_id(), "Signed in");
        Ok(session)
    }

    /// Ask the backend to email a password-reset link.
    pub async fn reset_password(&self, email: &str) -> AuthResult<()> {
        let email = validate_email(email)?;
        let request = self.public_request(
            self.client
                .post(format!("{}/recover", self.auth_url))
                .json(&serde_json::json!({ "email": email })),
        );
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_auth_error(status, &body)));
        }
        Ok(())
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::Validation(
                "Refresh token must not be empty".to_string(),
            ));
        }

        let request = self.public_request(
            self.client
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", "refresh_token")])
                .json(&serde_json::json!({ "refresh_token": refresh_token })),
        );
        let response = self.send_auth_request(request).await?;
        let session = response.into_session()?.ok_or_else(|| {
            AuthError::Api("Refresh response did not include an active session".to_string())
        })?;

        self.store.save_session(&session)?;
        Ok(session)
    }

    /// Revoke the session remotely and forget it locally.
    ///
    /// An already-expired token (401) still counts as signed out.
    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let response = self
            .client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        let status = response.status();
        if !(status.is_success() || status == StatusCode::UNAUTHORIZED) {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_auth_error(status, &body)));
        }

        self.store.clear_session()?;
        tracing::info!("Signed out");
        Ok(())
    }

    fn public_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn send_auth_request(&self, request: RequestBuilder) -> AuthResult<AuthResponse> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_auth_error(status, &body)));
        }
        Ok(response.json::<AuthResponse>().await?)
    }
}

fn validate_email(email: &str) -> AuthResult<&str> {
    let email = email.trim();
    if is_valid_email(email) {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail)
    }
}

/// GoTrue returns either a bare session or `{ user, session }`; sign-up that
/// needs confirmation returns only the user.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<ApiUser>,
    session: Option<Box<AuthResponse>>,
}

impl AuthResponse {
    fn into_session(self) -> AuthResult<Option<AuthSession>> {
        let nested = self.session.map(|session| *session);
        let nested_ref = nested.as_ref();

        let access_token = self
            .access_token
            .or_else(|| nested_ref.and_then(|session| session.access_token.clone()));
        let refresh_token = self
            .refresh_token
            .or_else(|| nested_ref.and_then(|session| session.refresh_token.clone()));
        let expires_at = self
            .expires_at
            .or_else(|| nested_ref.and_then(|session| session.expires_at))
            .or_else(|| {
                self.expires_in
                    .or_else(|| nested_ref.and_then(|session| session.expires_in))
                    .map(|expires_in| unix_timestamp_now().saturating_add(expires_in))
            });
        let user = self
            .user
            .or_else(|| nested.and_then(|session| session.user))
            .map(AuthUser::try_from)
            .transpose()?;

        match (access_token, refresh_token, expires_at, user) {
            (Some(access_token), Some(refresh_token), Some(expires_at), Some(user)) => {
                Ok(Some(AuthSession {
                    access_token,
                    refresh_token,
                    expires_at,
                    user,
                }))
            }
            (None, None, None, Some(_)) => Ok(None),
            _ => Err(AuthError::Api(
                "Auth response did not include enough session fields".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: String,
    email: Option<String>,
}

impl TryFrom<ApiUser> for AuthUser {
    type Error = AuthError;

    fn try_from(value: ApiUser) -> AuthResult<Self> {
        let id = UserId::new(value.id)
            .map_err(|_| AuthError::Api("Auth response contained a blank user id".to_string()))?;
        Ok(Self {
            id,
            email: value.email,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    msg: Option<String>,
}

fn parse_auth_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<AuthErrorBody>(body) {
        if let Some(message) = payload
            .msg
            .or(payload.message)
            .or(payload.error_description)
            .or(payload.error)
        {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
