// Centralized logging for the callback and session flows
use log::{error, info, warn};

use crate::models::{AuthStrategy, CallbackResult};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log that a provider redirect reached one of the callback handlers
    pub fn log_callback_received(flow: &str) {
        info!("🔄 {flow} callback received");
    }

    /// Log how a callback attempt ended
    pub fn log_callback_outcome(flow: &str, result: &CallbackResult) {
        match result {
            CallbackResult::Success { next } => {
                info!("✅ {flow} callback established a session, continuing to {next}");
            }
            CallbackResult::ProviderError { description } => {
                warn!("{flow} callback carried a provider error: {description}");
            }
            other => warn!("{flow} callback ended with {}", other.kind()),
        }
    }

    /// Log a fault whose details must never reach the caller
    pub fn log_exchange_fault(flow: &str, fault: &dyn std::fmt::Display) {
        error!("{flow} session exchange failed: {fault}");
    }

    /// Log an email refused by the registration API
    pub fn log_validation_rejected(email: &str, reason: &str) {
        warn!("Email validation rejected {email}: {reason}");
    }

    /// Log that a just-created session was signed out again
    pub fn log_session_reversed(user_id: &str) {
        info!("Session for user {user_id} reversed");
    }

    /// Log a request for a route of a strategy this deployment does not run
    pub fn log_strategy_mismatch(expected: AuthStrategy, active: AuthStrategy) {
        warn!("Route expects the {expected} strategy but {active} is active");
    }

    /// Log which strategy the service was wired for
    pub fn log_services_initialized(strategy: AuthStrategy, injected_client: bool) {
        if injected_client {
            info!("🔧 Auth services ready for {strategy} (injected client)");
        } else {
            info!("🔧 Auth services ready for {strategy}");
        }
    }
}
