use actix_web::HttpResponse;

use crate::authentication::AuthServices;
use crate::guards::GuardOutcome;
use crate::models::AuthStrategy;
use crate::utils::responses::ResponseBuilder;

/// Response for a route that belongs to another strategy, `None` when the route may run
#[must_use]
pub fn strategy_gate(services: &AuthServices, expected: AuthStrategy) -> Option<HttpResponse> {
    match services.strategy_guard.check(expected) {
        GuardOutcome::Render => None,
        GuardOutcome::Nothing => Some(ResponseBuilder::not_found()),
        GuardOutcome::Redirect(path) => Some(ResponseBuilder::redirect(&path, Vec::new())),
    }
}
