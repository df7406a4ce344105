//! Email Validation Gate
//!
//! After a successful exchange the authenticated email is checked against the registration API
//! (`GET {api_base}/register/validate-email/{email}`). Any non-2xx answer is a rejection and
//! its `message` becomes the reason shown on the sign-up page.

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use thiserror::Error;

/// Reason used when the registration API rejects without saying why
pub const DEFAULT_REJECTION_REASON: &str = "Email validation failed";

#[derive(Debug, Error)]
pub enum EmailValidationError {
    /// The registration API does not permit this email
    #[error("{0}")]
    Rejected(String),
    /// The registration API could not be asked
    #[error("email validation request failed: {0}")]
    Transport(String),
}

/// Business check run on the email of a freshly exchanged session
#[async_trait]
pub trait EmailValidator: Send + Sync {
    /// Confirm that `email` may use the application
    ///
    /// # Errors
    ///
    /// Returns [`EmailValidationError::Rejected`] when the email is not permitted and
    /// [`EmailValidationError::Transport`] when no verdict could be obtained.
    async fn validate(&self, email: &str) -> Result<(), EmailValidationError>;
}

#[derive(Deserialize, Default)]
struct RejectionBody {
    message: Option<String>,
}

/// Email validator backed by the registration API
pub struct ApiEmailValidator {
    http: reqwest::Client,
    api_base: String,
}

impl ApiEmailValidator {
    /// Create a validator for the API rooted at `api_base`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(api_base: &str, timeout: Option<std::time::Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn validation_url(&self, email: &str) -> String {
        format!(
            "{}/register/validate-email/{}",
            self.api_base,
            urlencoding::encode(email)
        )
    }
}

#[async_trait]
impl EmailValidator for ApiEmailValidator {
    async fn validate(&self, email: &str) -> Result<(), EmailValidationError> {
        let url = self.validation_url(email);
        debug!("Validating email against {url}");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| EmailValidationError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body: RejectionBody = response.json().await.unwrap_or_default();
        debug!("Email validation answered {status}");
        Err(EmailValidationError::Rejected(
            body.message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string()),
        ))
    }
}
