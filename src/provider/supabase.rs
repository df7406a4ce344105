//! Supabase (GoTrue) session exchange client

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, warn};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::{ExchangeError, SessionExchangeClient};
use crate::models::{AuthStrategy, AuthUser, PendingInviteToken, Session};
use crate::session::SessionJar;
use crate::utils::crypto::decode_jwt_payload;

/// Lifetime assumed when the provider does not say how long a token lives
const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3600;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: GoTrueUser,
}

#[derive(Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
}

impl From<GoTrueUser> for AuthUser {
    fn from(user: GoTrueUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Error bodies differ between GoTrue versions; take the first message present
#[derive(Deserialize, Default)]
struct GoTrueErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl GoTrueErrorBody {
    fn into_message(self, status: StatusCode) -> String {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or_else(|| format!("Request failed with status {status}"))
    }
}

/// Session exchange client for a Supabase project
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Create a client for the project at `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(
        base_url: &str,
        anon_key: &str,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    /// Map a non-success response to an exchange error
    async fn error_from_response(response: reqwest::Response) -> ExchangeError {
        let status = response.status();
        let body: GoTrueErrorBody = response.json().await.unwrap_or_default();
        let message = body.into_message(status);

        if status.is_client_error() {
            ExchangeError::Rejected(message)
        } else {
            ExchangeError::Transport(format!("{status}: {message}"))
        }
    }

    /// Run a `/token` grant and turn the response into a session
    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, ExchangeError> {
        debug!("Requesting Supabase token grant: {grant_type}");
        let response = self
            .http
            .post(self.endpoint("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let token: TokenResponse = response.json().await?;
        let expires_at = session_expiry(token.expires_at, token.expires_in);

        Ok(Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user: token.user.into(),
        })
    }

    /// Trade a refresh token for a new session
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Rejected`] if the refresh token is invalid or already used
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, ExchangeError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    /// Look up the user an access token belongs to
    async fn fetch_user(&self, access_token: &str) -> Result<GoTrueUser, ExchangeError> {
        let response = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(response.json().await?)
    }

    fn store(jar: &SessionJar, session: &Session) -> Result<(), ExchangeError> {
        jar.store(session)
            .map_err(|e| ExchangeError::Storage(e.to_string()))
    }
}

/// Absolute expiry of a granted session
///
/// `expires_at` wins when it is a valid timestamp. An `expires_in` that does not fit a date
/// falls back to the default lifetime.
fn session_expiry(expires_at: Option<i64>, expires_in: Option<i64>) -> DateTime<Utc> {
    if let Some(at) = expires_at.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)) {
        return at;
    }

    let now = Utc::now();
    expires_in
        .and_then(TimeDelta::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or_else(|| {
            if expires_in.is_some() {
                warn!("Ignoring out-of-range token lifetime {expires_in:?}");
            }
            now + TimeDelta::seconds(DEFAULT_TOKEN_LIFETIME_SECONDS)
        })
}

/// Expiry encoded in an access token, if it can be read
fn token_expiry(access_token: &str) -> Option<DateTime<Utc>> {
    decode_jwt_payload(access_token)
        .ok()?
        .get("exp")?
        .as_i64()
        .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0))
}

#[async_trait]
impl SessionExchangeClient for SupabaseClient {
    fn strategy(&self) -> AuthStrategy {
        AuthStrategy::Supabase
    }

    async fn exchange_code(&self, jar: &SessionJar, code: &str) -> Result<Session, ExchangeError> {
        let verifier = jar.code_verifier().ok_or(ExchangeError::VerifierMissing)?;
        // The verifier is single-use whatever the outcome
        jar.consume_code_verifier();

        let session = self
            .token_grant(
                "pkce",
                json!({ "auth_code": code, "code_verifier": verifier }),
            )
            .await?;
        Self::store(jar, &session)?;
        Ok(session)
    }

    async fn set_session_from_tokens(
        &self,
        jar: &SessionJar,
        tokens: PendingInviteToken,
    ) -> Result<Session, ExchangeError> {
        let session = match token_expiry(tokens.access_token()) {
            Some(expires_at) if expires_at > Utc::now() => {
                let user = self.fetch_user(tokens.access_token()).await?;
                Session {
                    access_token: tokens.access_token().to_string(),
                    refresh_token: tokens.refresh_token().to_string(),
                    expires_at,
                    user: user.into(),
                }
            }
            _ => {
                debug!("Fragment access token expired or unreadable, refreshing");
                self.refresh(tokens.refresh_token()).await?
            }
        };

        Self::store(jar, &session)?;
        Ok(session)
    }

    async fn sign_out(&self, jar: &SessionJar) -> Result<(), ExchangeError> {
        let session = jar.session();
        jar.clear();

        let Some(session) = session else {
            return Ok(());
        };

        let response = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // Token already revoked or expired: the session is gone either way
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(Self::error_from_response(response).await),
        }
    }

    async fn current_session(&self, jar: &SessionJar) -> Result<Option<Session>, ExchangeError> {
        let Some(session) = jar.session() else {
            return Ok(None);
        };
        if !session.is_expired() {
            return Ok(Some(session));
        }

        match self.refresh(&session.refresh_token).await {
            Ok(refreshed) => {
                Self::store(jar, &refreshed)?;
                Ok(Some(refreshed))
            }
            Err(ExchangeError::Rejected(reason)) => {
                warn!("Session refresh rejected, clearing session: {reason}");
                jar.clear();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
