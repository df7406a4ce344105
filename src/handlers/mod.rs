// HTTP request handlers for the callback and session endpoints
pub mod auth;
pub mod callback;
pub mod helpers;
pub mod static_files;

#[cfg(test)]
mod tests;

use actix_web::web;

// Re-export the main handler functions
pub use auth::{guard_status, session_status, sign_out};
pub use callback::{implicit_callback, pkce_callback, recovery_session};
pub use static_files::{health, implicit_callback_page};

/// Register every route; expects an `AuthServices` in the app data
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Supabase callbacks
        .route(
            "/auth/supabase/callback/pkce",
            web::get().to(pkce_callback),
        )
        .route(
            "/auth/supabase/callback/implicit",
            web::get().to(implicit_callback_page),
        )
        .route(
            "/auth/supabase/callback/implicit",
            web::post().to(implicit_callback),
        )
        .route(
            "/auth/supabase/session/recovery",
            web::post().to(recovery_session),
        )
        // Session endpoints
        .route("/auth/session", web::get().to(session_status))
        .route("/auth/guard/{kind}", web::get().to(guard_status))
        .route("/auth/{strategy}/sign-out", web::get().to(sign_out))
        .route("/auth/{strategy}/sign-out", web::post().to(sign_out))
        // Health endpoint
        .route("/ping", web::get().to(health));
}
