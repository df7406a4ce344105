//! Test fixtures providing pre-built test objects

use chrono::{Duration, Utc};
use std::sync::Arc;

use super::constants::{TEST_EMAIL, TEST_SESSION_SECRET, TEST_USER_ID, TEST_VERIFIER_COOKIE};
use super::mock::{FakeEmailValidator, FakeProvider};
use crate::authentication::{AuthServices, ServiceConfigBuilder};
use crate::models::{AuthUser, Session};
use crate::session::{CookieFactory, SessionJar};
use crate::settings::GatehouseSettings;
use crate::utils::crypto::derive_encryption_key;

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Settings with a fixed secret, insecure cookies and local collaborators
    #[must_use]
    pub fn settings() -> GatehouseSettings {
        let mut settings = GatehouseSettings::default();
        settings.session.session_secret = TEST_SESSION_SECRET.to_string();
        settings.cookies.secure = false;
        settings.supabase.url = "http://localhost:54321".to_string();
        settings.supabase.anon_key = Some("test-anon-key".to_string());
        settings.supabase.anon_key_env = None;
        settings.validation.api_base = "http://localhost:4000/api".to_string();
        settings
    }

    /// Cookie factory keyed like the one built from [`TestFixtures::settings`]
    #[must_use]
    pub fn cookie_factory() -> CookieFactory {
        CookieFactory::new(
            derive_encryption_key(TEST_SESSION_SECRET.as_bytes()),
            false,
            24,
        )
    }

    /// A live session for the default test user
    #[must_use]
    pub fn session() -> Session {
        Session {
            access_token: "test-access-token".to_string(),
            refresh_token: "test-refresh-token".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            user: AuthUser {
                id: TEST_USER_ID.to_string(),
                email: Some(TEST_EMAIL.to_string()),
            },
        }
    }

    #[must_use]
    pub fn expired_session() -> Session {
        let mut session = Self::session();
        session.expires_at = Utc::now() - Duration::hours(1);
        session
    }

    /// An empty jar, as for a first visit
    #[must_use]
    pub fn jar() -> SessionJar {
        SessionJar::new(Self::cookie_factory(), None, None, TEST_VERIFIER_COOKIE)
    }

    /// A jar whose request carried `session` in its cookie
    ///
    /// # Panics
    ///
    /// Panics if the session cookie cannot be encrypted
    #[must_use]
    pub fn jar_with_session(session: &Session) -> SessionJar {
        let cookie = Self::cookie_factory()
            .create_session_cookie(session)
            .expect("test session cookie encrypts");
        SessionJar::new(
            Self::cookie_factory(),
            Some(cookie.value().to_string()),
            None,
            TEST_VERIFIER_COOKIE,
        )
    }

    /// A jar whose request carried a PKCE code verifier
    #[must_use]
    pub fn jar_with_verifier(verifier: &str) -> SessionJar {
        SessionJar::new(
            Self::cookie_factory(),
            None,
            Some(verifier.to_string()),
            TEST_VERIFIER_COOKIE,
        )
    }

    /// Service container over the given fakes and [`TestFixtures::settings`]
    ///
    /// # Panics
    ///
    /// Panics if the fake provider implements another strategy than the settings
    #[must_use]
    pub fn services(provider: Arc<FakeProvider>, validator: Arc<FakeEmailValidator>) -> AuthServices {
        Self::services_with(Self::settings(), provider, validator)
    }

    /// Service container over the given fakes and settings
    ///
    /// # Panics
    ///
    /// Panics if the fake provider implements another strategy than the settings
    #[must_use]
    pub fn services_with(
        settings: GatehouseSettings,
        provider: Arc<FakeProvider>,
        validator: Arc<FakeEmailValidator>,
    ) -> AuthServices {
        ServiceConfigBuilder::new()
            .with_client(provider)
            .with_validator(validator)
            .build(&settings)
            .expect("test services build")
    }
}
