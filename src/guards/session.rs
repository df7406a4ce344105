//! Guest and auth guards
//!
//! Session presence is resolved asynchronously through a [`SessionProbe`]. Until it resolves the
//! guard shows a placeholder, so neither guarded nor fallback content flashes.

use async_trait::async_trait;
use log::warn;
use serde::Deserialize;
use std::sync::{Mutex, PoisonError};

use super::GuardOutcome;
use crate::models::Rendered;
use crate::provider::{ExchangeError, SessionExchangeClient};
use crate::session::SessionJar;

/// Answers whether the current browser context holds a session
#[async_trait]
pub trait SessionProbe: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if presence could not be determined
    async fn has_session(&self) -> Result<bool, ExchangeError>;
}

/// Probe backed by a provider client and the request's jar
pub struct ClientSessionProbe<'a> {
    client: &'a dyn SessionExchangeClient,
    jar: &'a SessionJar,
}

impl<'a> ClientSessionProbe<'a> {
    #[must_use]
    pub fn new(client: &'a dyn SessionExchangeClient, jar: &'a SessionJar) -> Self {
        Self { client, jar }
    }
}

#[async_trait]
impl SessionProbe for ClientSessionProbe<'_> {
    async fn has_session(&self) -> Result<bool, ExchangeError> {
        Ok(self.client.current_session(self.jar).await?.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardKind {
    /// Only visitors without a session, e.g. the sign-in page
    Guest,
    /// Only signed-in users
    Auth,
}

pub struct SessionGuard {
    kind: GuardKind,
    redirect_to: String,
    resolved: Mutex<Option<GuardOutcome>>,
}

impl SessionGuard {
    /// Guard that sends signed-in users to `dashboard_overview`
    #[must_use]
    pub fn guest(dashboard_overview: &str) -> Self {
        Self::new(GuardKind::Guest, dashboard_overview)
    }

    /// Guard that sends anonymous users to `sign_in`
    #[must_use]
    pub fn auth(sign_in: &str) -> Self {
        Self::new(GuardKind::Auth, sign_in)
    }

    fn new(kind: GuardKind, redirect_to: &str) -> Self {
        Self {
            kind,
            redirect_to: redirect_to.to_string(),
            resolved: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> GuardKind {
        self.kind
    }

    /// Ask the probe and settle the guard; a failing probe counts as no session
    pub async fn resolve(&self, probe: &dyn SessionProbe) -> GuardOutcome {
        let has_session = probe.has_session().await.unwrap_or_else(|e| {
            warn!("Session probe failed, treating as signed out: {e}");
            false
        });

        let outcome = match (self.kind, has_session) {
            (GuardKind::Guest, false) | (GuardKind::Auth, true) => GuardOutcome::Render,
            _ => GuardOutcome::Redirect(self.redirect_to.clone()),
        };
        *self.resolved.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome.clone());
        outcome
    }

    /// What the guarded view shows right now; `content` is only built once access is granted
    pub fn render<T>(&self, content: impl FnOnce() -> T) -> Rendered<T> {
        let resolved = self
            .resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match resolved {
            None | Some(GuardOutcome::Nothing) => Rendered::Placeholder,
            Some(GuardOutcome::Render) => Rendered::Content(content()),
            Some(GuardOutcome::Redirect(path)) => Rendered::Redirect(path),
        }
    }
}
