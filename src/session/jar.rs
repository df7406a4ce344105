//! Per-request session store
//!
//! A `SessionJar` is what a provider client reads and writes its session through. It is built
//! from the incoming request's cookies, remembers every change made during the request, and
//! hands the resulting `Set-Cookie` values to the response. One jar never outlives its request.

use actix_web::{cookie::Cookie, HttpRequest};
use base64::{engine::general_purpose, Engine as _};
use std::sync::{Mutex, PoisonError};

use super::cookie::{create_expired_cookie, extract_cookie_value, CookieFactory, COOKIE_NAME};
use crate::models::Session;

#[derive(Default)]
struct JarState {
    /// `None` until the incoming cookie has been decoded or the session replaced
    current: Option<Option<Session>>,
    outgoing: Vec<Cookie<'static>>,
    verifier_consumed: bool,
}

pub struct SessionJar {
    factory: CookieFactory,
    incoming_session: Option<String>,
    code_verifier: Option<String>,
    verifier_cookie_name: String,
    state: Mutex<JarState>,
}

impl SessionJar {
    #[must_use]
    pub fn new(
        factory: CookieFactory,
        incoming_session: Option<String>,
        code_verifier: Option<String>,
        verifier_cookie_name: &str,
    ) -> Self {
        Self {
            factory,
            incoming_session,
            code_verifier: code_verifier.and_then(|raw| normalize_code_verifier(&raw)),
            verifier_cookie_name: verifier_cookie_name.to_string(),
            state: Mutex::new(JarState::default()),
        }
    }

    /// Build a jar from the session and code-verifier cookies of a request
    #[must_use]
    pub fn from_request(req: &HttpRequest, factory: CookieFactory, verifier_cookie_name: &str) -> Self {
        Self::new(
            factory,
            extract_cookie_value(req, COOKIE_NAME),
            extract_cookie_value(req, verifier_cookie_name),
            verifier_cookie_name,
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, JarState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The session currently held, decoding the request cookie on first access
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        let mut state = self.lock();
        if state.current.is_none() {
            let decoded = self.incoming_session.as_deref().and_then(|value| {
                self.factory
                    .read_session(value)
                    .map_err(|e| log::debug!("Ignoring unreadable session cookie: {e}"))
                    .ok()
            });
            state.current = Some(decoded);
        }
        state.current.clone().flatten()
    }

    /// Replace the held session and queue its cookie
    ///
    /// # Errors
    ///
    /// Returns an error if the session cookie cannot be encrypted
    pub fn store(&self, session: &Session) -> anyhow::Result<()> {
        let cookie = self.factory.create_session_cookie(session)?;
        let mut state = self.lock();
        state.outgoing.retain(|c| c.name() != COOKIE_NAME);
        state.outgoing.push(cookie);
        state.current = Some(Some(session.clone()));
        Ok(())
    }

    /// Drop the held session and queue a clearing cookie
    pub fn clear(&self) {
        let mut state = self.lock();
        state.outgoing.retain(|c| c.name() != COOKIE_NAME);
        state.outgoing.push(self.factory.create_expired_cookie());
        state.current = Some(None);
    }

    /// The PKCE code verifier left by the browser client, unless already consumed
    #[must_use]
    pub fn code_verifier(&self) -> Option<String> {
        if self.lock().verifier_consumed {
            return None;
        }
        self.code_verifier.clone()
    }

    /// Mark the code verifier as used and queue its removal
    pub fn consume_code_verifier(&self) {
        let mut state = self.lock();
        if state.verifier_consumed {
            return;
        }
        state.verifier_consumed = true;
        if self.code_verifier.is_some() {
            state.outgoing.push(create_expired_cookie(
                &self.verifier_cookie_name,
                self.factory.cookie_secure(),
            ));
        }
    }

    /// Cookies to attach to the response
    #[must_use]
    pub fn take_cookies(&self) -> Vec<Cookie<'static>> {
        std::mem::take(&mut self.lock().outgoing)
    }
}

/// Browser clients may store the verifier JSON-quoted and optionally as `base64-<payload>`
fn normalize_code_verifier(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |d| d.into_owned());
    let unwrapped = match decoded.strip_prefix("base64-") {
        Some(encoded) => general_purpose::URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())?,
        None => decoded,
    };
    let verifier = unwrapped.trim().trim_matches('"').to_string();
    if verifier.is_empty() {
        None
    } else {
        Some(verifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestFixtures;

    const VERIFIER_COOKIE: &str = "sb-auth-token-code-verifier";

    fn jar(incoming: Option<String>, verifier: Option<&str>) -> SessionJar {
        SessionJar::new(
            TestFixtures::cookie_factory(),
            incoming,
            verifier.map(ToString::to_string),
            VERIFIER_COOKIE,
        )
    }

    #[test]
    fn test_empty_jar_has_no_session() {
        let jar = jar(None, None);
        assert!(jar.session().is_none());
        assert!(jar.take_cookies().is_empty());
    }

    #[test]
    fn test_reads_incoming_session_cookie() {
        let session = TestFixtures::session();
        let cookie = TestFixtures::cookie_factory()
            .create_session_cookie(&session)
            .unwrap();

        let jar = jar(Some(cookie.value().to_string()), None);
        assert_eq!(jar.session(), Some(session));
    }

    #[test]
    fn test_garbage_cookie_reads_as_no_session() {
        let jar = jar(Some("not-encrypted".to_string()), None);
        assert!(jar.session().is_none());
    }

    #[test]
    fn test_store_then_clear() {
        let jar = jar(None, None);
        let session = TestFixtures::session();

        jar.store(&session).unwrap();
        assert_eq!(jar.session(), Some(session));

        jar.clear();
        assert!(jar.session().is_none());

        let cookies = jar.take_cookies();
        assert_eq!(cookies.len(), 1, "clear replaces the pending session cookie");
        assert_eq!(cookies[0].name(), COOKIE_NAME);
        assert_eq!(cookies[0].value(), "");
    }

    #[test]
    fn test_code_verifier_consumed_once() {
        let jar = jar(None, Some("verifier-123"));
        assert_eq!(jar.code_verifier().as_deref(), Some("verifier-123"));

        jar.consume_code_verifier();
        jar.consume_code_verifier();
        assert!(jar.code_verifier().is_none());

        let cookies = jar.take_cookies();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name(), VERIFIER_COOKIE);
    }

    #[test]
    fn test_normalize_code_verifier() {
        assert_eq!(
            normalize_code_verifier("%22abc%22").as_deref(),
            Some("abc")
        );
        // base64url of "\"xyz\""
        assert_eq!(
            normalize_code_verifier("base64-Inh5eiI").as_deref(),
            Some("xyz")
        );
        assert_eq!(normalize_code_verifier("\"\""), None);
    }
}
