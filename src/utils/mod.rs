//! Shared helpers
//!
//! - [`crypto`] - Cookie encryption and token payload decoding
//! - [`fragment`] - URL fragment and query parsing
//! - [`logging`] - Consistent log lines for the auth flows
//! - [`responses`] - HTTP response construction

pub mod crypto;
pub mod fragment;
pub mod logging;
pub mod responses;
