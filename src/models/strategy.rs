//! Identity-provider strategy selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The identity-provider integration a deployment runs with
///
/// Exactly one strategy is active per process. Routes under `/auth/{strategy}/` declare the
/// strategy they expect and are gated by [`StrategyGuard`](crate::guards::StrategyGuard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStrategy {
    Cognito,
    Firebase,
    Supabase,
    Auth0,
}

impl AuthStrategy {
    pub const ALL: [Self; 4] = [Self::Cognito, Self::Firebase, Self::Supabase, Self::Auth0];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cognito => "cognito",
            Self::Firebase => "firebase",
            Self::Supabase => "supabase",
            Self::Auth0 => "auth0",
        }
    }

    /// Sign-in page for this strategy
    #[must_use]
    pub fn sign_in_path(self) -> String {
        format!("/auth/{}/sign-in", self.as_str())
    }

    /// Sign-up page for this strategy
    #[must_use]
    pub fn sign_up_path(self) -> String {
        format!("/auth/{}/sign-up", self.as_str())
    }
}

impl fmt::Display for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("Unknown auth strategy: {value}"))
    }
}
