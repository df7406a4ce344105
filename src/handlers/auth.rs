// Session endpoints: sign-out, session status and guard decisions
use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::{info, warn};
use serde::Serialize;

use super::helpers::strategy_gate;
use crate::authentication::AuthServices;
use crate::guards::{ClientSessionProbe, GuardKind, GuardOutcome, SessionGuard};
use crate::models::{AuthStrategy, AuthUser};
use crate::utils::responses::ResponseBuilder;

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthUser>,
}

#[derive(Debug, Serialize)]
pub struct GuardStatus {
    pub render: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// Sign out of the strategy named in the path and return to its sign-in page
///
/// # Errors
/// Never fails; an unreachable provider still clears the local session
pub async fn sign_out(
    path: web::Path<String>,
    req: HttpRequest,
    services: web::Data<AuthServices>,
) -> Result<HttpResponse> {
    let Ok(expected) = path.parse::<AuthStrategy>() else {
        return Ok(ResponseBuilder::not_found());
    };
    if let Some(response) = strategy_gate(&services, expected) {
        return Ok(response);
    }

    let jar = services.jar(&req);
    match services.client.sign_out(&jar).await {
        Ok(()) => info!("Signed out of {expected}"),
        Err(e) => warn!("Provider sign-out failed, local session cleared anyway: {e}"),
    }
    Ok(ResponseBuilder::redirect(
        &expected.sign_in_path(),
        jar.take_cookies(),
    ))
}

/// Whether the caller holds a session, refreshing it first if it has expired
///
/// # Errors
/// Never fails; a failed lookup reports no session
pub async fn session_status(
    req: HttpRequest,
    services: web::Data<AuthServices>,
) -> Result<HttpResponse> {
    let jar = services.jar(&req);
    let session = services
        .client
        .current_session(&jar)
        .await
        .unwrap_or_else(|e| {
            warn!("Session lookup failed: {e}");
            None
        });

    let status = SessionStatus {
        authenticated: session.is_some(),
        user: session.map(|s| s.user),
    };
    Ok(ResponseBuilder::json_with_cookies(&status, jar.take_cookies()))
}

/// Decision of the guest or auth guard for the caller
///
/// # Errors
/// Never fails; a failed probe counts as no session
pub async fn guard_status(
    kind: web::Path<GuardKind>,
    req: HttpRequest,
    services: web::Data<AuthServices>,
) -> Result<HttpResponse> {
    let guard = match kind.into_inner() {
        GuardKind::Guest => SessionGuard::guest(&services.settings.paths.dashboard_overview),
        GuardKind::Auth => SessionGuard::auth(&services.strategy().sign_in_path()),
    };

    let jar = services.jar(&req);
    let probe = ClientSessionProbe::new(services.client.as_ref(), &jar);
    let status = match guard.resolve(&probe).await {
        GuardOutcome::Render => GuardStatus {
            render: true,
            redirect: None,
        },
        GuardOutcome::Redirect(path) => GuardStatus {
            render: false,
            redirect: Some(path),
        },
        GuardOutcome::Nothing => GuardStatus {
            render: false,
            redirect: None,
        },
    };
    Ok(ResponseBuilder::json_with_cookies(&status, jar.take_cookies()))
}
