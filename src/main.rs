#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use gatehouse::{
    authentication::{AuthServiceFactory, AuthServices},
    configure_services,
    settings::GatehouseSettings,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = GatehouseSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let services = AuthServiceFactory::create(&settings).map_err(|e| {
        std::io::Error::other(format!("Failed to initialize auth services: {e}"))
    })?;

    start_server(services, settings).await
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(services: AuthServices, settings: GatehouseSettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    // The dashboard calls the JSON endpoints cross-origin with credentials
    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(services.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &GatehouseSettings) {
    let strategy = settings.auth.strategy;
    println!("Starting Gatehouse session service on http://{bind_address}");
    println!("Active auth strategy: {strategy}");
    println!();
    println!("Supabase callback endpoints:");
    println!("  GET      /auth/supabase/callback/pkce     - PKCE code exchange");
    println!("  GET|POST /auth/supabase/callback/implicit - Implicit-flow page and exchange");
    println!("  POST     /auth/supabase/session/recovery  - Invite / password-reset session");
    println!();
    println!("Session endpoints:");
    println!("  GET|POST /auth/{strategy}/sign-out - Clear session");
    println!("  GET      /auth/session             - Session status");
    println!("  GET      /auth/guard/{{guest|auth}}  - Guard decision");
    println!();
    println!("Callback URLs for the identity provider:");
    println!(
        "  {}/auth/supabase/callback/pkce",
        settings.application.base_url
    );
    println!(
        "  {}/auth/supabase/callback/implicit",
        settings.application.base_url
    );
    println!();
    println!("System endpoints:");
    println!("  GET  /ping - Health check");
}
