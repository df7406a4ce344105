// Supabase callback handlers: PKCE route, implicit-flow page and invite/recovery links
use actix_web::{web, HttpRequest, HttpResponse, Result};
use serde::Deserialize;

use super::helpers::strategy_gate;
use crate::authentication::AuthServices;
use crate::callback::{
    ImplicitCallbackPage, ImplicitCallbackRequest, PkceCallbackHandler, PkceCallbackParams,
    RecoverySessionHandler,
};
use crate::models::{AuthStrategy, CallbackResult};
use crate::utils::responses::ResponseBuilder;

#[derive(Debug, Deserialize)]
pub struct RecoveryRequest {
    #[serde(default)]
    pub hash: String,
}

/// PKCE callback
///
/// Redirects on success, provider errors and validation rejections. Broken links and failed
/// exchanges answer 200 with a `{"error": ...}` body.
///
/// # Errors
/// Never fails; every outcome is mapped to a response
pub async fn pkce_callback(
    query: web::Query<PkceCallbackParams>,
    req: HttpRequest,
    services: web::Data<AuthServices>,
) -> Result<HttpResponse> {
    if let Some(response) = strategy_gate(&services, AuthStrategy::Supabase) {
        return Ok(response);
    }

    let jar = services.jar(&req);
    let handler = PkceCallbackHandler::new(
        services.client.as_ref(),
        services.validator.as_ref(),
        &services.settings.paths.home,
    );
    let result = handler.handle(&jar, query.into_inner()).await;

    let sign_up = services.strategy().sign_up_path();
    let cookies = jar.take_cookies();
    Ok(match result {
        CallbackResult::Success { next } => ResponseBuilder::redirect(&next, cookies),
        CallbackResult::ProviderError { description }
        | CallbackResult::ValidationRejected {
            reason: description,
        } => ResponseBuilder::error_redirect(&sign_up, &description, cookies),
        CallbackResult::ExchangeError { description }
        | CallbackResult::MalformedRequest { description } => {
            ResponseBuilder::json_error(&description, cookies)
        }
    })
}

/// Implicit-flow exchange, posted by the callback page with its `location.hash` and `.search`
///
/// Each POST is one page load's single activation: the shell served by
/// `implicit_callback_page` holds the run-once flag and never posts twice.
///
/// # Errors
/// Never fails; every outcome is mapped to a response
pub async fn implicit_callback(
    body: web::Json<ImplicitCallbackRequest>,
    req: HttpRequest,
    services: web::Data<AuthServices>,
) -> Result<HttpResponse> {
    if let Some(response) = strategy_gate(&services, AuthStrategy::Supabase) {
        return Ok(response);
    }

    let jar = services.jar(&req);
    let page = ImplicitCallbackPage::new(
        services.client.as_ref(),
        &services.settings.paths.dashboard_overview,
    );
    let outcome = page.complete(&jar, &body).await;
    Ok(ResponseBuilder::json_with_cookies(&outcome, jar.take_cookies()))
}

/// Establish the temporary session behind an invite or password-reset link
///
/// # Errors
/// Never fails; every outcome is mapped to a response
pub async fn recovery_session(
    body: web::Json<RecoveryRequest>,
    req: HttpRequest,
    services: web::Data<AuthServices>,
) -> Result<HttpResponse> {
    if let Some(response) = strategy_gate(&services, AuthStrategy::Supabase) {
        return Ok(response);
    }

    let jar = services.jar(&req);
    let handler = RecoverySessionHandler::new(services.client.as_ref());
    let state = handler.establish(&jar, &body.hash).await;
    Ok(ResponseBuilder::json_with_cookies(&state, jar.take_cookies()))
}
