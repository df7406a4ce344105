//! PKCE callback
//!
//! Steps run strictly in order: provider error, code presence, exchange, email presence, email
//! validation. The redirect target is only chosen once validation has answered.

use serde::Deserialize;

use super::SAME_BROWSER_MESSAGE;
use crate::models::{CallbackResult, Session};
use crate::provider::{ExchangeError, SessionExchangeClient};
use crate::session::SessionJar;
use crate::utils::logging::LoggingHelper;
use crate::validation::email::{EmailValidationError, EmailValidator};
use crate::validation::resolve_next;

pub const CODE_MISSING: &str = "Code is missing";
pub const USER_MISSING: &str = "User is missing";

const FLOW: &str = "PKCE";

/// Query parameters of a PKCE callback link
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PkceCallbackParams {
    pub code: Option<String>,
    pub next: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

pub struct PkceCallbackHandler<'a> {
    client: &'a dyn SessionExchangeClient,
    validator: &'a dyn EmailValidator,
    home_path: &'a str,
}

impl<'a> PkceCallbackHandler<'a> {
    #[must_use]
    pub fn new(
        client: &'a dyn SessionExchangeClient,
        validator: &'a dyn EmailValidator,
        home_path: &'a str,
    ) -> Self {
        Self {
            client,
            validator,
            home_path,
        }
    }

    /// Run the callback against the request's session jar
    pub async fn handle(&self, jar: &SessionJar, params: PkceCallbackParams) -> CallbackResult {
        LoggingHelper::log_callback_received(FLOW);
        let result = self.run(jar, params).await;
        LoggingHelper::log_callback_outcome(FLOW, &result);
        result
    }

    async fn run(&self, jar: &SessionJar, params: PkceCallbackParams) -> CallbackResult {
        let PkceCallbackParams {
            code,
            next,
            error,
            error_description,
        } = params;

        if let Some(error) = error.filter(|e| !e.is_empty()) {
            return CallbackResult::ProviderError {
                description: error_description
                    .filter(|d| !d.is_empty())
                    .unwrap_or(error),
            };
        }

        let Some(code) = code.filter(|c| !c.is_empty()) else {
            return CallbackResult::MalformedRequest {
                description: CODE_MISSING.to_string(),
            };
        };

        let session = match self.client.exchange_code(jar, &code).await {
            Ok(session) => session,
            Err(ExchangeError::Rejected(message)) => {
                return CallbackResult::ExchangeError {
                    description: message,
                };
            }
            Err(fault) => return self.fault(jar, None, &fault).await,
        };

        let Some(email) = session.email() else {
            // Nothing to validate, so the session must not survive
            self.reverse(jar, &session).await;
            return CallbackResult::ExchangeError {
                description: USER_MISSING.to_string(),
            };
        };

        match self.validator.validate(email).await {
            Ok(()) => CallbackResult::Success {
                next: resolve_next(next.as_deref(), self.home_path),
            },
            Err(EmailValidationError::Rejected(reason)) => {
                LoggingHelper::log_validation_rejected(email, &reason);
                self.reverse(jar, &session).await;
                CallbackResult::ValidationRejected { reason }
            }
            Err(fault @ EmailValidationError::Transport(_)) => {
                self.fault(jar, Some(&session), &fault).await
            }
        }
    }

    /// Log the real error, sign out anything created so far and answer generically
    async fn fault(
        &self,
        jar: &SessionJar,
        created: Option<&Session>,
        fault: &dyn std::fmt::Display,
    ) -> CallbackResult {
        LoggingHelper::log_exchange_fault(FLOW, fault);
        if let Some(session) = created {
            self.reverse(jar, session).await;
        }
        CallbackResult::ExchangeError {
            description: SAME_BROWSER_MESSAGE.to_string(),
        }
    }

    async fn reverse(&self, jar: &SessionJar, session: &Session) {
        if let Err(e) = self.client.sign_out(jar).await {
            log::warn!("Provider sign-out failed while reversing a session: {e}");
        }
        LoggingHelper::log_session_reversed(session.user_id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEmailValidator, FakeFault, FakeProvider, TestFixtures};

    fn params(code: Option<&str>, next: Option<&str>) -> PkceCallbackParams {
        PkceCallbackParams {
            code: code.map(ToString::to_string),
            next: next.map(ToString::to_string),
            ..PkceCallbackParams::default()
        }
    }

    #[tokio::test]
    async fn test_provider_error_skips_exchange() {
        let provider = FakeProvider::new().with_code("abc123", Some("ada@example.com"));
        let validator = FakeEmailValidator::new();
        let handler = PkceCallbackHandler::new(&provider, &validator, "/");
        let jar = TestFixtures::jar();

        let result = handler
            .handle(
                &jar,
                PkceCallbackParams {
                    code: Some("abc123".to_string()),
                    error: Some("access_denied".to_string()),
                    error_description: Some("User denied consent".to_string()),
                    ..PkceCallbackParams::default()
                },
            )
            .await;

        assert_eq!(
            result,
            CallbackResult::ProviderError {
                description: "User denied consent".to_string()
            }
        );
        assert_eq!(provider.exchange_calls(), 0);
        assert!(jar.session().is_none());
    }

    #[tokio::test]
    async fn test_missing_code_is_malformed() {
        let provider = FakeProvider::new();
        let validator = FakeEmailValidator::new();
        let handler = PkceCallbackHandler::new(&provider, &validator, "/");

        let result = handler.handle(&TestFixtures::jar(), params(None, None)).await;
        assert_eq!(
            result,
            CallbackResult::MalformedRequest {
                description: CODE_MISSING.to_string()
            }
        );
        assert_eq!(provider.exchange_calls(), 0);
    }

    #[tokio::test]
    async fn test_success_redirects_to_next() {
        let provider = FakeProvider::new().with_code("abc123", Some("ada@example.com"));
        let validator = FakeEmailValidator::new();
        let handler = PkceCallbackHandler::new(&provider, &validator, "/");
        let jar = TestFixtures::jar();

        let result = handler
            .handle(&jar, params(Some("abc123"), Some("/dashboard/orders")))
            .await;

        assert_eq!(
            result,
            CallbackResult::Success {
                next: "/dashboard/orders".to_string()
            }
        );
        assert_eq!(validator.calls(), vec!["ada@example.com".to_string()]);
        assert!(jar.session().is_some());
    }

    #[tokio::test]
    async fn test_success_without_next_goes_home() {
        let provider = FakeProvider::new().with_code("abc123", Some("ada@example.com"));
        let validator = FakeEmailValidator::new();
        let handler = PkceCallbackHandler::new(&provider, &validator, "/");

        let result = handler
            .handle(&TestFixtures::jar(), params(Some("abc123"), None))
            .await;
        assert_eq!(result, CallbackResult::Success { next: "/".to_string() });
    }

    #[tokio::test]
    async fn test_unsafe_next_falls_back_to_home() {
        let provider = FakeProvider::new().with_code("abc123", Some("ada@example.com"));
        let validator = FakeEmailValidator::new();
        let handler = PkceCallbackHandler::new(&provider, &validator, "/");

        let result = handler
            .handle(
                &TestFixtures::jar(),
                params(Some("abc123"), Some("https://evil.example")),
            )
            .await;
        assert_eq!(result, CallbackResult::Success { next: "/".to_string() });
    }

    #[tokio::test]
    async fn test_replayed_code_is_exchange_error() {
        let provider = FakeProvider::new().with_code("abc123", Some("ada@example.com"));
        let validator = FakeEmailValidator::new();
        let handler = PkceCallbackHandler::new(&provider, &validator, "/");

        let first = handler
            .handle(&TestFixtures::jar(), params(Some("abc123"), None))
            .await;
        assert!(first.is_success());

        let replay_jar = TestFixtures::jar();
        let second = handler
            .handle(&replay_jar, params(Some("abc123"), None))
            .await;
        assert!(matches!(second, CallbackResult::ExchangeError { .. }));
        assert!(replay_jar.session().is_none());
        assert_eq!(provider.sessions_created(), 1);
    }

    #[tokio::test]
    async fn test_missing_email_reverses_session() {
        let provider = FakeProvider::new().with_code("abc123", None);
        let validator = FakeEmailValidator::new();
        let handler = PkceCallbackHandler::new(&provider, &validator, "/");
        let jar = TestFixtures::jar();

        let result = handler.handle(&jar, params(Some("abc123"), None)).await;
        assert_eq!(
            result,
            CallbackResult::ExchangeError {
                description: USER_MISSING.to_string()
            }
        );
        assert!(validator.calls().is_empty());
        assert!(jar.session().is_none());
    }

    #[tokio::test]
    async fn test_validation_rejection_signs_out() {
        let provider = FakeProvider::new().with_code("abc123", Some("eve@example.com"));
        let validator = FakeEmailValidator::new().rejecting("eve@example.com", "Email not registered");
        let handler = PkceCallbackHandler::new(&provider, &validator, "/");
        let jar = TestFixtures::jar();

        let result = handler.handle(&jar, params(Some("abc123"), None)).await;
        assert_eq!(
            result,
            CallbackResult::ValidationRejected {
                reason: "Email not registered".to_string()
            }
        );
        assert_eq!(provider.sign_out_calls(), 1);
        assert!(jar.session().is_none());
    }

    #[tokio::test]
    async fn test_transport_fault_is_generic_and_signs_out() {
        let provider = FakeProvider::new().with_code("abc123", Some("ada@example.com"));
        let validator = FakeEmailValidator::new().failing();
        let handler = PkceCallbackHandler::new(&provider, &validator, "/");
        let jar = TestFixtures::jar();

        let result = handler.handle(&jar, params(Some("abc123"), None)).await;
        assert_eq!(
            result,
            CallbackResult::ExchangeError {
                description: SAME_BROWSER_MESSAGE.to_string()
            }
        );
        assert_eq!(provider.sign_out_calls(), 1);
        assert!(jar.session().is_none());
    }

    #[tokio::test]
    async fn test_exchange_fault_hides_details() {
        let provider = FakeProvider::new()
            .with_code("abc123", Some("ada@example.com"))
            .failing_with(FakeFault::VerifierMissing);
        let validator = FakeEmailValidator::new();
        let handler = PkceCallbackHandler::new(&provider, &validator, "/");

        let result = handler
            .handle(&TestFixtures::jar(), params(Some("abc123"), None))
            .await;
        assert_eq!(
            result,
            CallbackResult::ExchangeError {
                description: SAME_BROWSER_MESSAGE.to_string()
            }
        );
        assert_eq!(provider.sign_out_calls(), 0);
        assert!(validator.calls().is_empty());
    }
}
