//! Session storage
//!
//! - [`cookie`] - Encrypted session cookie creation and reading
//! - [`jar`] - Per-request session store handed to provider clients

pub mod cookie;
pub mod jar;

pub use cookie::{create_expired_cookie, CookieFactory, COOKIE_NAME, MAX_SESSION_DURATION_HOURS};
pub use jar::SessionJar;
