//! Session Exchange Client
//!
//! The callback handlers and guards talk to the identity provider only through
//! [`SessionExchangeClient`]. Each strategy supplies an implementation; the one shipped here is
//! [`SupabaseClient`], speaking the GoTrue REST API.

pub mod supabase;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AuthStrategy, PendingInviteToken, Session};
use crate::session::SessionJar;

pub use supabase::SupabaseClient;

/// Failures of a code or token exchange
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The provider refused the code or tokens (expired, already used, revoked)
    #[error("{0}")]
    Rejected(String),
    /// No PKCE code verifier was found, usually because the link was opened in another browser
    #[error("PKCE code verifier not found in storage")]
    VerifierMissing,
    /// The provider could not be reached
    #[error("transport failure: {0}")]
    Transport(String),
    /// The provider answered with something that is not a session
    #[error("unexpected provider response: {0}")]
    Protocol(String),
    /// The session could not be written to the session store
    #[error("session storage failed: {0}")]
    Storage(String),
}

impl ExchangeError {
    /// True for refusals the provider reported about the credentials themselves
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Protocol(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Narrow interface over an identity provider's session runtime
///
/// Every operation works against the caller's [`SessionJar`], which is where the established
/// session lives for the rest of the request (and, through its cookie, later requests).
#[async_trait]
pub trait SessionExchangeClient: Send + Sync {
    /// The strategy this client implements
    fn strategy(&self) -> AuthStrategy;

    /// Exchange a one-time authorization code for a session
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Rejected`] for expired or consumed codes and a fault variant for
    /// everything else.
    async fn exchange_code(&self, jar: &SessionJar, code: &str) -> Result<Session, ExchangeError>;

    /// Establish a session from an access/refresh pair delivered in a URL fragment
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Rejected`] when the provider does not accept the tokens.
    async fn set_session_from_tokens(
        &self,
        jar: &SessionJar,
        tokens: PendingInviteToken,
    ) -> Result<Session, ExchangeError>;

    /// Invalidate the current session
    ///
    /// The jar is cleared even when the provider cannot be reached.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider-side revocation failed.
    async fn sign_out(&self, jar: &SessionJar) -> Result<(), ExchangeError>;

    /// The session held in the jar, refreshed if it has expired
    ///
    /// # Errors
    ///
    /// Returns an error if a refresh was needed and could not reach the provider.
    async fn current_session(&self, jar: &SessionJar) -> Result<Option<Session>, ExchangeError>;
}
