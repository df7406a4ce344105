#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the gatehouse application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod authentication;
pub mod callback;
pub mod guards;
pub mod handlers;
pub mod models;
pub mod provider;
pub mod session;
pub mod settings;
pub mod utils;
pub mod validation;

// Testing utilities - available for unit tests and integration tests with the testing feature
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use authentication::{AuthServiceFactory, AuthServices, ServiceConfigBuilder};
pub use handlers::configure_services;
pub use models::{AuthStrategy, CallbackResult, Session};
pub use provider::{ExchangeError, SessionExchangeClient, SupabaseClient};
pub use settings::GatehouseSettings;
