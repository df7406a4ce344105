//! In-memory fakes for the provider and the registration API

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::models::{AuthStrategy, AuthUser, PendingInviteToken, Session};
use crate::provider::{ExchangeError, SessionExchangeClient};
use crate::session::SessionJar;
use crate::validation::email::{EmailValidationError, EmailValidator};

/// Failure a [`FakeProvider`] injects into every exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeFault {
    Transport,
    VerifierMissing,
    Protocol,
}

impl From<FakeFault> for ExchangeError {
    fn from(fault: FakeFault) -> Self {
        match fault {
            FakeFault::Transport => Self::Transport("connection refused".to_string()),
            FakeFault::VerifierMissing => Self::VerifierMissing,
            FakeFault::Protocol => Self::Protocol("expected value at line 1".to_string()),
        }
    }
}

/// Provider with single-use codes and a fixed set of accepted token pairs
pub struct FakeProvider {
    strategy: AuthStrategy,
    codes: Mutex<HashMap<String, AuthUser>>,
    tokens: HashMap<String, (String, AuthUser)>,
    fault: Option<FakeFault>,
    probe_fault: bool,
    require_verifier: bool,
    exchange_calls: AtomicUsize,
    set_session_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    sessions_created: AtomicUsize,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::for_strategy(AuthStrategy::Supabase)
    }
}

impl FakeProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_strategy(strategy: AuthStrategy) -> Self {
        Self {
            strategy,
            codes: Mutex::new(HashMap::new()),
            tokens: HashMap::new(),
            fault: None,
            probe_fault: false,
            require_verifier: false,
            exchange_calls: AtomicUsize::new(0),
            set_session_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
            sessions_created: AtomicUsize::new(0),
        }
    }

    /// Accept `code` once, for a user with `email`
    #[must_use]
    pub fn with_code(mut self, code: &str, email: Option<&str>) -> Self {
        self.codes
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(code.to_string(), Self::user(code, email));
        self
    }

    /// Accept the `access`/`refresh` pair, any number of times
    #[must_use]
    pub fn with_tokens(mut self, access: &str, refresh: &str, email: Option<&str>) -> Self {
        self.tokens.insert(
            access.to_string(),
            (refresh.to_string(), Self::user(access, email)),
        );
        self
    }

    /// Fail every code and token exchange with `fault`
    #[must_use]
    pub fn failing_with(mut self, fault: FakeFault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Fail every session lookup
    #[must_use]
    pub fn failing_probe(mut self) -> Self {
        self.probe_fault = true;
        self
    }

    /// Refuse code exchanges whose jar carries no PKCE verifier
    #[must_use]
    pub fn requiring_verifier(mut self) -> Self {
        self.require_verifier = true;
        self
    }

    fn user(seed: &str, email: Option<&str>) -> AuthUser {
        AuthUser {
            id: format!("user-{seed}"),
            email: email.map(ToString::to_string),
        }
    }

    fn store(&self, jar: &SessionJar, session: &Session) -> Result<(), ExchangeError> {
        jar.store(session)
            .map_err(|e| ExchangeError::Storage(e.to_string()))?;
        self.sessions_created.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn set_session_calls(&self) -> usize {
        self.set_session_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    /// Sessions handed out by successful exchanges
    #[must_use]
    pub fn sessions_created(&self) -> usize {
        self.sessions_created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionExchangeClient for FakeProvider {
    fn strategy(&self) -> AuthStrategy {
        self.strategy
    }

    async fn exchange_code(&self, jar: &SessionJar, code: &str) -> Result<Session, ExchangeError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fault) = self.fault {
            return Err(fault.into());
        }
        if self.require_verifier {
            jar.code_verifier().ok_or(ExchangeError::VerifierMissing)?;
            jar.consume_code_verifier();
        }

        let user = self
            .codes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(code)
            .ok_or_else(|| {
                ExchangeError::Rejected("invalid flow state, no valid flow state found".to_string())
            })?;

        let session = Session {
            access_token: format!("access-{code}"),
            refresh_token: format!("refresh-{code}"),
            expires_at: Utc::now() + Duration::hours(1),
            user,
        };
        self.store(jar, &session)?;
        Ok(session)
    }

    async fn set_session_from_tokens(
        &self,
        jar: &SessionJar,
        tokens: PendingInviteToken,
    ) -> Result<Session, ExchangeError> {
        self.set_session_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fault) = self.fault {
            return Err(fault.into());
        }

        let user = match self.tokens.get(tokens.access_token()) {
            Some((refresh, user)) if refresh == tokens.refresh_token() => user.clone(),
            _ => {
                return Err(ExchangeError::Rejected(
                    "Invalid Refresh Token: Refresh Token Not Found".to_string(),
                ))
            }
        };

        let session = Session {
            access_token: tokens.access_token().to_string(),
            refresh_token: tokens.refresh_token().to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            user,
        };
        self.store(jar, &session)?;
        Ok(session)
    }

    async fn sign_out(&self, jar: &SessionJar) -> Result<(), ExchangeError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        jar.clear();
        Ok(())
    }

    async fn current_session(&self, jar: &SessionJar) -> Result<Option<Session>, ExchangeError> {
        if self.probe_fault {
            return Err(ExchangeError::Transport("connection refused".to_string()));
        }
        Ok(jar.session().filter(|s| !s.is_expired()))
    }
}

/// Registration API stand-in: every email passes unless listed
#[derive(Default)]
pub struct FakeEmailValidator {
    rejected: HashMap<String, String>,
    failing: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeEmailValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse `email` with `reason`
    #[must_use]
    pub fn rejecting(mut self, email: &str, reason: &str) -> Self {
        self.rejected.insert(email.to_string(), reason.to_string());
        self
    }

    /// Fail every request at the transport level
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Emails validated so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EmailValidator for FakeEmailValidator {
    async fn validate(&self, email: &str) -> Result<(), EmailValidationError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.to_string());

        if self.failing {
            return Err(EmailValidationError::Transport(
                "error sending request".to_string(),
            ));
        }
        match self.rejected.get(email) {
            Some(reason) => Err(EmailValidationError::Rejected(reason.clone())),
            None => Ok(()),
        }
    }
}
