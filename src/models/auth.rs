//! Callback outcomes and user-facing notices
//!
//! Every callback attempt ends in exactly one [`CallbackResult`]. Handlers convert provider,
//! transport and validation failures into one of these variants at their boundary, so nothing
//! below the HTTP layer has to know how a failure is presented.

use serde::Serialize;

/// Tagged outcome of a callback attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResult {
    /// Session established; continue to `next`
    Success { next: String },
    /// The identity provider reported an error on the redirect itself
    ProviderError { description: String },
    /// The code or token exchange failed; `description` is safe to show
    ExchangeError { description: String },
    /// The identity passed the exchange but failed an application-level check
    ValidationRejected { reason: String },
    /// A required parameter was absent, pointing at a broken link
    MalformedRequest { description: String },
}

impl CallbackResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Short label used in logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::ProviderError { .. } => "provider_error",
            Self::ExchangeError { .. } => "exchange_error",
            Self::ValidationRejected { .. } => "validation_rejected",
            Self::MalformedRequest { .. } => "malformed_request",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Shown in place of the page content
    Error,
    /// Short-lived toast shown while redirecting
    Transient,
}

/// A message the page should display to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Transient,
            message: message.into(),
        }
    }
}
