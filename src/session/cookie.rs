use actix_web::{cookie::Cookie, HttpRequest};
use anyhow::Result;

use crate::models::Session;
use crate::utils::crypto::{decrypt_data, encrypt_data};

/// Cookie holding the encrypted provider session
pub const COOKIE_NAME: &str = "gatehouse_session";

/// Longest session cookie lifetime accepted, one year
pub const MAX_SESSION_DURATION_HOURS: u64 = 24 * 366;

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: actix_web::cookie::SameSite,
    pub path: String,
    pub max_age: actix_web::cookie::time::Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: actix_web::cookie::SameSite::Lax,
            path: "/".to_string(),
            max_age: actix_web::cookie::time::Duration::hours(24),
        }
    }
}

/// Cookie factory for creating encrypted session cookies with proper configuration
#[derive(Clone)]
pub struct CookieFactory {
    encryption_key: [u8; 32],
    cookie_secure: bool,
    session_duration_hours: u64,
}

impl CookieFactory {
    #[must_use]
    pub fn new(encryption_key: [u8; 32], cookie_secure: bool, session_duration_hours: u64) -> Self {
        Self {
            encryption_key,
            cookie_secure,
            session_duration_hours: session_duration_hours.min(MAX_SESSION_DURATION_HOURS),
        }
    }

    /// Create the encrypted session cookie
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_session_cookie(&self, session: &Session) -> Result<Cookie<'static>> {
        let value = encrypt_data(session, &self.encryption_key)?;
        let options = CookieOptions {
            max_age: actix_web::cookie::time::Duration::hours(
                i64::try_from(self.session_duration_hours).unwrap_or(24),
            ),
            ..Default::default()
        };

        Ok(Cookie::build(COOKIE_NAME, value)
            .http_only(options.http_only)
            .secure(self.cookie_secure && options.secure)
            .same_site(options.same_site)
            .path(options.path)
            .max_age(options.max_age)
            .finish())
    }

    /// Decrypt a session cookie value
    ///
    /// # Errors
    ///
    /// Returns an error if the value was not produced with this factory's key
    pub fn read_session(&self, value: &str) -> Result<Session> {
        decrypt_data(value, &self.encryption_key)
    }

    /// Create an expired cookie to clear the session
    #[must_use]
    pub fn create_expired_cookie(&self) -> Cookie<'static> {
        create_expired_cookie(COOKIE_NAME, self.cookie_secure)
    }

    #[must_use]
    pub const fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    #[must_use]
    pub const fn encryption_key(&self) -> &[u8; 32] {
        &self.encryption_key
    }
}

/// Read a cookie value from the request, if present and non-empty
#[must_use]
pub fn extract_cookie_value(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    req.cookie(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Create an expired cookie to clear a specific cookie
#[must_use]
pub fn create_expired_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(name.to_owned(), "")
        .http_only(true)
        .secure(secure)
        .same_site(actix_web::cookie::SameSite::Lax)
        .path("/")
        .max_age(actix_web::cookie::time::Duration::seconds(-1))
        .finish()
}
