use super::GuardOutcome;
use crate::models::AuthStrategy;
use crate::utils::logging::LoggingHelper;

/// What a route of another strategy produces in this deployment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StrategyFallback {
    /// Render nothing (served as an empty 404)
    #[default]
    Nothing,
    Redirect(String),
}

impl StrategyFallback {
    /// Build from the optional redirect path in the settings
    #[must_use]
    pub fn from_setting(redirect: Option<&str>) -> Self {
        match redirect.map(str::trim).filter(|p| !p.is_empty()) {
            Some(path) => Self::Redirect(path.to_string()),
            None => Self::Nothing,
        }
    }
}

/// Compares a route's expected strategy with the one this process runs
#[derive(Debug, Clone)]
pub struct StrategyGuard {
    active: AuthStrategy,
    fallback: StrategyFallback,
}

impl StrategyGuard {
    #[must_use]
    pub const fn new(active: AuthStrategy, fallback: StrategyFallback) -> Self {
        Self { active, fallback }
    }

    #[must_use]
    pub const fn active(&self) -> AuthStrategy {
        self.active
    }

    #[must_use]
    pub fn check(&self, expected: AuthStrategy) -> GuardOutcome {
        if expected == self.active {
            return GuardOutcome::Render;
        }

        LoggingHelper::log_strategy_mismatch(expected, self.active);
        match &self.fallback {
            StrategyFallback::Nothing => GuardOutcome::Nothing,
            StrategyFallback::Redirect(path) => GuardOutcome::Redirect(path.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_strategy_renders() {
        let guard = StrategyGuard::new(AuthStrategy::Supabase, StrategyFallback::Nothing);
        assert_eq!(guard.check(AuthStrategy::Supabase), GuardOutcome::Render);
    }

    #[test]
    fn test_mismatch_uses_fallback() {
        let guard = StrategyGuard::new(AuthStrategy::Supabase, StrategyFallback::Nothing);
        for other in [AuthStrategy::Cognito, AuthStrategy::Firebase, AuthStrategy::Auth0] {
            assert_eq!(guard.check(other), GuardOutcome::Nothing);
        }

        let guard = StrategyGuard::new(
            AuthStrategy::Cognito,
            StrategyFallback::Redirect("/404".to_string()),
        );
        assert_eq!(
            guard.check(AuthStrategy::Supabase),
            GuardOutcome::Redirect("/404".to_string())
        );
    }

    #[test]
    fn test_fallback_from_setting() {
        assert_eq!(StrategyFallback::from_setting(None), StrategyFallback::Nothing);
        assert_eq!(StrategyFallback::from_setting(Some("  ")), StrategyFallback::Nothing);
        assert_eq!(
            StrategyFallback::from_setting(Some("/")),
            StrategyFallback::Redirect("/".to_string())
        );
    }
}
