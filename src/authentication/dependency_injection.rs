use std::sync::Arc;

use super::{AuthServiceFactory, AuthServices, ConfigError};
use crate::guards::{StrategyFallback, StrategyGuard};
use crate::provider::SessionExchangeClient;
use crate::settings::GatehouseSettings;
use crate::utils::logging::LoggingHelper;
use crate::validation::email::EmailValidator;

/// Service configuration builder for dependency injection
#[derive(Clone, Default)]
pub struct ServiceConfigBuilder {
    client: Option<Arc<dyn SessionExchangeClient>>,
    validator: Option<Arc<dyn EmailValidator>>,
}

impl ServiceConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this provider client instead of the built-in one
    #[must_use]
    pub fn with_client(mut self, client: Arc<dyn SessionExchangeClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Use this email validator instead of the registration API
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn EmailValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Assemble the services, filling anything not injected from `settings`
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in service cannot be created or an injected client implements
    /// another strategy than the configured one
    pub fn build(self, settings: &GatehouseSettings) -> Result<AuthServices, ConfigError> {
        let configured = settings.auth.strategy;
        let injected_client = self.client.is_some();

        let client = match self.client {
            Some(client) => client,
            None => AuthServiceFactory::create_client(settings)?,
        };
        if client.strategy() != configured {
            return Err(ConfigError::StrategyMismatch {
                configured,
                client: client.strategy(),
            });
        }

        let validator = match self.validator {
            Some(validator) => validator,
            None => AuthServiceFactory::create_validator(settings)?,
        };

        let strategy_guard = StrategyGuard::new(
            configured,
            StrategyFallback::from_setting(settings.auth.strategy_mismatch_redirect.as_deref()),
        );

        LoggingHelper::log_services_initialized(configured, injected_client);
        Ok(AuthServices {
            settings: settings.clone(),
            client,
            validator,
            cookie_factory: AuthServiceFactory::create_cookie_factory(settings),
            strategy_guard,
        })
    }
}
