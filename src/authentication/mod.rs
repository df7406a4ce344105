//! Start-up wiring
//!
//! The active strategy and its provider client are chosen once, at process start, and handed to
//! the HTTP layer as an [`AuthServices`] container. Tests swap in fakes through
//! [`ServiceConfigBuilder`].

pub mod dependency_injection;
pub mod factory;

use actix_web::HttpRequest;
use std::sync::Arc;
use thiserror::Error;

pub use dependency_injection::ServiceConfigBuilder;
pub use factory::AuthServiceFactory;

use crate::guards::StrategyGuard;
use crate::models::AuthStrategy;
use crate::provider::SessionExchangeClient;
use crate::session::{CookieFactory, SessionJar};
use crate::settings::GatehouseSettings;
use crate::validation::email::EmailValidator;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("supabase.url must be set when the supabase strategy is active")]
    MissingSupabaseUrl,
    #[error("no Supabase anon key configured (supabase.anon_key, supabase.anon_key_env or SUPABASE_ANON_KEY)")]
    MissingAnonKey,
    #[error("no built-in client for the {0} strategy; inject one with ServiceConfigBuilder::with_client")]
    UnsupportedStrategy(AuthStrategy),
    #[error("injected client implements {client} but the {configured} strategy is configured")]
    StrategyMismatch {
        configured: AuthStrategy,
        client: AuthStrategy,
    },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Everything a request handler needs, shared across workers
#[derive(Clone)]
pub struct AuthServices {
    pub settings: GatehouseSettings,
    pub client: Arc<dyn SessionExchangeClient>,
    pub validator: Arc<dyn EmailValidator>,
    pub cookie_factory: CookieFactory,
    pub strategy_guard: StrategyGuard,
}

impl AuthServices {
    #[must_use]
    pub fn strategy(&self) -> AuthStrategy {
        self.strategy_guard.active()
    }

    /// A fresh session jar over the request's cookies
    #[must_use]
    pub fn jar(&self, req: &HttpRequest) -> SessionJar {
        SessionJar::from_request(
            req,
            self.cookie_factory.clone(),
            &self.settings.session.code_verifier_cookie,
        )
    }
}
