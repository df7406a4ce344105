//! Implicit-flow callback page
//!
//! Tokens arrive in the URL fragment, which never reaches a server, so the callback page forwards
//! `location.hash` and `location.search` and one [`ImplicitCallbackPage`] per page load runs the
//! flow. The page owns a [`RunOnceLatch`]: a repeated activation does nothing.

use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::RunOnceLatch;
use crate::models::{AuthStrategy, CallbackResult, Notice, PendingInviteToken};
use crate::provider::SessionExchangeClient;
use crate::session::SessionJar;
use crate::utils::fragment::UrlParams;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::with_error_param;
use crate::validation::resolve_next;

pub const TOKENS_MISSING: &str = "Access token or refresh token is missing";
pub const GENERIC_FAILURE: &str = "Something went wrong";

const FLOW: &str = "Implicit";

/// What the callback page forwards from `window.location`
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ImplicitCallbackRequest {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub search: String,
}

/// Where the page navigates next and what it shows meanwhile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImplicitOutcome {
    pub redirect: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

pub struct ImplicitCallbackPage<'a> {
    client: &'a dyn SessionExchangeClient,
    strategy: AuthStrategy,
    dashboard_overview: &'a str,
    latch: RunOnceLatch,
}

impl<'a> ImplicitCallbackPage<'a> {
    #[must_use]
    pub fn new(client: &'a dyn SessionExchangeClient, dashboard_overview: &'a str) -> Self {
        Self {
            client,
            strategy: client.strategy(),
            dashboard_overview,
            latch: RunOnceLatch::new(),
        }
    }

    /// Run the flow for this page load
    ///
    /// Returns `None` when the page was already activated; no call is made and nothing redirects.
    pub async fn activate(
        &self,
        jar: &SessionJar,
        request: &ImplicitCallbackRequest,
    ) -> Option<ImplicitOutcome> {
        if !self.latch.fire() {
            debug!("Implicit callback already ran for this page load");
            return None;
        }

        Some(self.complete(jar, request).await)
    }

    /// Run the flow without consulting the latch
    ///
    /// For callers that already guarantee a single run per page load, such as the HTTP route
    /// whose page shell posts at most once.
    pub async fn complete(
        &self,
        jar: &SessionJar,
        request: &ImplicitCallbackRequest,
    ) -> ImplicitOutcome {
        LoggingHelper::log_callback_received(FLOW);
        let result = self.run(jar, request).await;
        LoggingHelper::log_callback_outcome(FLOW, &result);
        self.outcome(result)
    }

    async fn run(&self, jar: &SessionJar, request: &ImplicitCallbackRequest) -> CallbackResult {
        let fragment = UrlParams::parse(&request.hash);

        if fragment.has_error() {
            let description = fragment.provider_error().unwrap_or_default().to_string();
            error!("Implicit callback provider error: {description}");
            return CallbackResult::ProviderError { description };
        }

        let token = fragment
            .get("access_token")
            .zip(fragment.get("refresh_token"))
            .and_then(|(access, refresh)| PendingInviteToken::new(access, refresh));
        let Some(token) = token else {
            return CallbackResult::MalformedRequest {
                description: TOKENS_MISSING.to_string(),
            };
        };

        match self.client.set_session_from_tokens(jar, token).await {
            Ok(_) => {
                let query = UrlParams::parse(&request.search);
                CallbackResult::Success {
                    next: resolve_next(query.get("next"), self.dashboard_overview),
                }
            }
            Err(e) => {
                LoggingHelper::log_exchange_fault(FLOW, &e);
                CallbackResult::ExchangeError {
                    description: GENERIC_FAILURE.to_string(),
                }
            }
        }
    }

    fn outcome(&self, result: CallbackResult) -> ImplicitOutcome {
        let sign_up = self.strategy.sign_up_path();
        match result {
            CallbackResult::Success { next } => ImplicitOutcome {
                redirect: next,
                notice: None,
            },
            CallbackResult::ProviderError { description } => ImplicitOutcome {
                redirect: with_error_param(&sign_up, &description),
                notice: Some(Notice::error(GENERIC_FAILURE)),
            },
            CallbackResult::MalformedRequest { description }
            | CallbackResult::ValidationRejected {
                reason: description,
            } => ImplicitOutcome {
                redirect: with_error_param(&sign_up, &description),
                notice: Some(Notice::error(description)),
            },
            CallbackResult::ExchangeError { description } => ImplicitOutcome {
                redirect: self.strategy.sign_in_path(),
                notice: Some(Notice::transient(description)),
            },
        }
    }
}
