use std::sync::Arc;

use super::{AuthServices, ConfigError, ServiceConfigBuilder};
use crate::models::AuthStrategy;
use crate::provider::{SessionExchangeClient, SupabaseClient};
use crate::session::CookieFactory;
use crate::settings::GatehouseSettings;
use crate::utils::crypto::derive_encryption_key;
use crate::validation::email::{ApiEmailValidator, EmailValidator};

/// Builds the production services from settings
pub struct AuthServiceFactory;

impl AuthServiceFactory {
    /// Wire the configured strategy's client, the email validator and the session cookies
    ///
    /// # Errors
    ///
    /// Returns an error if the active strategy has no built-in client or its settings are incomplete
    pub fn create(settings: &GatehouseSettings) -> Result<AuthServices, ConfigError> {
        ServiceConfigBuilder::new().build(settings)
    }

    /// The built-in client for the configured strategy
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy has no built-in client or its settings are incomplete
    pub fn create_client(
        settings: &GatehouseSettings,
    ) -> Result<Arc<dyn SessionExchangeClient>, ConfigError> {
        match settings.auth.strategy {
            AuthStrategy::Supabase => {
                if settings.supabase.url.trim().is_empty() {
                    return Err(ConfigError::MissingSupabaseUrl);
                }
                let anon_key = settings
                    .supabase
                    .get_anon_key()
                    .filter(|k| !k.is_empty())
                    .ok_or(ConfigError::MissingAnonKey)?;
                log::info!("✅ Supabase client configured for {}", settings.supabase.url);
                Ok(Arc::new(SupabaseClient::new(
                    &settings.supabase.url,
                    &anon_key,
                    settings.http_timeout(),
                )?))
            }
            other => Err(ConfigError::UnsupportedStrategy(other)),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn create_validator(
        settings: &GatehouseSettings,
    ) -> Result<Arc<dyn EmailValidator>, ConfigError> {
        log::info!(
            "✅ Email validation against {}",
            settings.validation.api_base
        );
        Ok(Arc::new(ApiEmailValidator::new(
            &settings.validation.api_base,
            settings.http_timeout(),
        )?))
    }

    #[must_use]
    pub fn create_cookie_factory(settings: &GatehouseSettings) -> CookieFactory {
        CookieFactory::new(
            derive_encryption_key(settings.session.session_secret.as_bytes()),
            settings.cookies.secure,
            settings.session.session_duration_hours,
        )
    }
}
