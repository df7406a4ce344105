//! Core data types shared by the callback handlers, guards and provider clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod auth;
pub mod strategy;

pub use auth::{CallbackResult, Notice, NoticeKind};
pub use strategy::AuthStrategy;

/// What a guarded or wrapped view shows at a given moment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    /// The wrapped content itself
    Content(T),
    /// Neutral placeholder while a check is still pending
    Placeholder,
    /// An inline message shown instead of the content
    Message(String),
    /// Navigate elsewhere; the content is never shown
    Redirect(String),
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// The authenticated identity attached to a session
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// A durable access/refresh credential pair
///
/// Sessions are created by a [`SessionExchangeClient`](crate::provider::SessionExchangeClient)
/// and live in the client's cookie-backed store. Handlers only ever see them through the client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl Session {
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref().filter(|email| !email.is_empty())
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Token pair delivered in the fragment of an invite, recovery or implicit-flow link
///
/// Deliberately neither `Clone` nor `Serialize`: a pending token is moved into exactly one
/// exchange call and dropped afterwards.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingInviteToken {
    access_token: String,
    refresh_token: String,
}

impl PendingInviteToken {
    /// Build a token pair, rejecting empty values
    #[must_use]
    pub fn new(access_token: &str, refresh_token: &str) -> Option<Self> {
        if access_token.is_empty() || refresh_token.is_empty() {
            return None;
        }
        Some(Self {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        })
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    #[must_use]
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }
}
