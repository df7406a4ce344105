//! Route guards
//!
//! The strategy guard keeps one provider's routes from serving a deployment configured for
//! another. Guest and auth guards gate a view on the absence or presence of a session.

pub mod session;
pub mod strategy;

pub use session::{ClientSessionProbe, GuardKind, SessionGuard, SessionProbe};
pub use strategy::{StrategyFallback, StrategyGuard};

/// Decision a guard reaches about its route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Render the guarded content
    Render,
    /// Send the user to this path instead
    Redirect(String),
    /// Render nothing at all
    Nothing,
}
