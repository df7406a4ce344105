use crate::authentication::AuthServices;
use crate::models::{AuthStrategy, HealthResponse};
use actix_web::{web, HttpResponse, Result};

use super::helpers::strategy_gate;

/// Health check endpoint
///
/// # Errors
/// Returns an error if health status cannot be determined
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "Gatehouse session service is running".to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}

/// Shell page for implicit-flow links
///
/// The fragment never reaches the server, so the page posts `location.hash` and
/// `location.search` back to the same path and follows the answer.
///
/// # Errors
/// Never fails
pub async fn implicit_callback_page(services: web::Data<AuthServices>) -> Result<HttpResponse> {
    if let Some(response) = strategy_gate(&services, AuthStrategy::Supabase) {
        return Ok(response);
    }
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(IMPLICIT_CALLBACK_PAGE))
}

const IMPLICIT_CALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="referrer" content="no-referrer">
    <title>Signing you in</title>
    <style>
        body { font-family: system-ui, sans-serif; display: flex; align-items: center;
               justify-content: center; min-height: 100vh; margin: 0; color: #1f2937; }
        .notice { padding: 12px 16px; border-radius: 8px; background: #fee2e2; color: #991b1b; }
        .notice.transient { background: #fef3c7; color: #92400e; }
    </style>
</head>
<body>
    <div id="status">Signing you in…</div>
    <script>
    (function () {
        var fired = false;
        function run() {
            if (fired) { return; }
            fired = true;
            fetch(window.location.pathname, {
                method: "POST",
                credentials: "same-origin",
                headers: { "Content-Type": "application/json" },
                body: JSON.stringify({ hash: window.location.hash, search: window.location.search })
            })
            .then(function (res) { return res.status === 204 ? null : res.json(); })
            .then(function (outcome) {
                if (!outcome) { return; }
                if (outcome.notice) {
                    var el = document.getElementById("status");
                    el.textContent = outcome.notice.message;
                    el.className = "notice " + outcome.notice.kind;
                }
                window.location.replace(outcome.redirect);
            });
        }
        run();
    })();
    </script>
</body>
</html>
"#;
