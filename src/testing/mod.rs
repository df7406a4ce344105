//! Testing utilities for gatehouse
//!
//! Available to unit tests and, through the `testing` feature, to the integration tests.
//!
//! - [`fixtures`] - Pre-built settings, sessions, jars and service containers
//! - [`mock`] - In-memory provider and email validator with call counters
//!
//! ```rust,ignore
//! use gatehouse::testing::{FakeEmailValidator, FakeProvider, TestFixtures};
//!
//! let provider = FakeProvider::new().with_code("abc123", Some("ada@example.com"));
//! let jar = TestFixtures::jar();
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;
pub use mock::{FakeEmailValidator, FakeFault, FakeProvider};

/// Common test constants
pub mod constants {
    pub const TEST_EMAIL: &str = "test@example.com";
    pub const TEST_USER_ID: &str = "7d3f1c2a-0b7e-4b7b-9f55-3c6a2f0e9a11";
    pub const TEST_SESSION_SECRET: &str = "test-session-secret-for-gatehouse-unit-tests";
    pub const TEST_VERIFIER_COOKIE: &str = "sb-auth-token-code-verifier";
}
