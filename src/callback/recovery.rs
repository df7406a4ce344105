//! Invite and password-recovery links
//!
//! An invite or recovery email links to a page that wraps a password form. The fragment carries a
//! token pair; the handler turns it into a temporary session once per mount and decides whether
//! the form may render.

use serde::Serialize;
use std::sync::{Mutex, PoisonError};

use super::RunOnceLatch;
use crate::models::{PendingInviteToken, Rendered};
use crate::provider::{ExchangeError, SessionExchangeClient};
use crate::session::SessionJar;
use crate::utils::fragment::UrlParams;
use crate::utils::logging::LoggingHelper;

pub const INVITATION_INVALID: &str =
    "Invalid or expired invitation link. Please request a new invitation.";
pub const RESET_LINK_INVALID: &str =
    "Invalid or expired reset link. Please request a new password reset.";
pub const RESET_LINK_FAILED: &str = "Failed to process reset link. Please try again.";

const FLOW: &str = "Recovery";

/// `Checking` is entered once per mount and left for good
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum RecoveryState {
    Checking,
    Ok,
    Error(String),
}

pub struct RecoverySessionHandler<'a> {
    client: &'a dyn SessionExchangeClient,
    state: Mutex<RecoveryState>,
    latch: RunOnceLatch,
}

impl<'a> RecoverySessionHandler<'a> {
    #[must_use]
    pub fn new(client: &'a dyn SessionExchangeClient) -> Self {
        Self {
            client,
            state: Mutex::new(RecoveryState::Checking),
            latch: RunOnceLatch::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> RecoveryState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Establish the session from `hash`; later calls return the settled state unchanged
    pub async fn establish(&self, jar: &SessionJar, hash: &str) -> RecoveryState {
        if !self.latch.fire() {
            return self.state();
        }

        LoggingHelper::log_callback_received(FLOW);
        let settled = self.attempt(jar, hash).await;
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = settled.clone();
        settled
    }

    async fn attempt(&self, jar: &SessionJar, hash: &str) -> RecoveryState {
        let fragment = UrlParams::parse(hash);
        let token = fragment
            .get("access_token")
            .zip(fragment.get("refresh_token"))
            .and_then(|(access, refresh)| PendingInviteToken::new(access, refresh));
        let Some(token) = token else {
            log::warn!("Recovery link is missing its token pair");
            return RecoveryState::Error(INVITATION_INVALID.to_string());
        };

        match self.client.set_session_from_tokens(jar, token).await {
            Ok(session) => {
                log::info!("Recovery session established for user {}", session.user_id());
                RecoveryState::Ok
            }
            Err(ExchangeError::Rejected(reason)) => {
                log::warn!("Recovery tokens refused: {reason}");
                RecoveryState::Error(RESET_LINK_INVALID.to_string())
            }
            Err(fault) => {
                LoggingHelper::log_exchange_fault(FLOW, &fault);
                RecoveryState::Error(RESET_LINK_FAILED.to_string())
            }
        }
    }

    /// Decide what the wrapping page shows; `content` is only built once the state is `Ok`
    pub fn render<T>(&self, content: impl FnOnce() -> T) -> Rendered<T> {
        match self.state() {
            RecoveryState::Checking => Rendered::Placeholder,
            RecoveryState::Ok => Rendered::Content(content()),
            RecoveryState::Error(message) => Rendered::Message(message),
        }
    }
}
