//! Callback handlers
//!
//! Each handler turns one provider redirect into exactly one [`CallbackResult`](crate::models::CallbackResult)
//! (or, for the recovery handler, a [`RecoveryState`]). They talk to the provider only through a
//! [`SessionExchangeClient`](crate::provider::SessionExchangeClient) and know nothing about HTTP;
//! `handlers::callback` maps their outcomes onto responses.

pub mod implicit;
pub mod latch;
pub mod pkce;
pub mod recovery;

pub use implicit::{ImplicitCallbackPage, ImplicitCallbackRequest, ImplicitOutcome};
pub use latch::RunOnceLatch;
pub use pkce::{PkceCallbackHandler, PkceCallbackParams};
pub use recovery::{RecoverySessionHandler, RecoveryState};

/// Shown for faults whose details stay in the logs, most often a PKCE link opened in another browser
pub const SAME_BROWSER_MESSAGE: &str =
    "Something went wrong. Please make sure you open the link in the same browser you used to sign up.";
