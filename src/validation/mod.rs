//! Post-exchange validation
//!
//! - [`email`] - Email Validation Gate backed by the registration API
//! - [`redirect`] - Safety checks for `next` redirect targets

pub mod email;
pub mod redirect;

pub use email::{ApiEmailValidator, EmailValidationError, EmailValidator, DEFAULT_REJECTION_REASON};
pub use redirect::{resolve_next, validate_post_auth_redirect};
