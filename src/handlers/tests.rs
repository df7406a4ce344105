// Route-level tests: strategy gating, health and the implicit callback shell
use actix_web::{http::StatusCode, test, web, App};
use std::sync::Arc;

use super::configure_services;
use crate::models::AuthStrategy;
use crate::testing::{FakeEmailValidator, FakeProvider, TestFixtures};

fn cognito_services(mismatch_redirect: Option<&str>) -> crate::authentication::AuthServices {
    let mut settings = TestFixtures::settings();
    settings.auth.strategy = AuthStrategy::Cognito;
    settings.auth.strategy_mismatch_redirect = mismatch_redirect.map(ToString::to_string);
    TestFixtures::services_with(
        settings,
        Arc::new(FakeProvider::for_strategy(AuthStrategy::Cognito)),
        Arc::new(FakeEmailValidator::new()),
    )
}

#[actix_web::test]
async fn test_health() {
    let services = TestFixtures::services(
        Arc::new(FakeProvider::new()),
        Arc::new(FakeEmailValidator::new()),
    );
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_supabase_routes_hidden_from_other_strategies() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(cognito_services(None)))
            .configure(configure_services),
    )
    .await;

    for uri in [
        "/auth/supabase/callback/pkce?code=abc123",
        "/auth/supabase/callback/implicit",
        "/auth/supabase/sign-out",
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        let body = test::read_body(resp).await;
        assert!(body.is_empty(), "{uri} must not render anything");
    }

    // The active strategy's own route still works
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/cognito/sign-out")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "/auth/cognito/sign-in"
    );
}

#[actix_web::test]
async fn test_strategy_mismatch_redirect() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(cognito_services(Some("/"))))
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/supabase/session/recovery")
            .set_json(serde_json::json!({ "hash": "#access_token=a&refresh_token=b" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get("Location").unwrap(), "/");
}

#[actix_web::test]
async fn test_unknown_strategy_sign_out_is_not_found() {
    let services = TestFixtures::services(
        Arc::new(FakeProvider::new()),
        Arc::new(FakeEmailValidator::new()),
    );
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/okta/sign-out")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_implicit_page_serves_shell() {
    let services = TestFixtures::services(
        Arc::new(FakeProvider::new()),
        Arc::new(FakeEmailValidator::new()),
    );
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/supabase/callback/implicit")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let html = std::str::from_utf8(&body).unwrap();
    assert!(html.contains("window.location.hash"));
    assert!(html.contains("if (fired) { return; }"));
}

#[actix_web::test]
async fn test_implicit_post_answers_with_outcome() {
    let services = TestFixtures::services(
        Arc::new(FakeProvider::new().with_tokens("T1", "T2", Some("ada@example.com"))),
        Arc::new(FakeEmailValidator::new()),
    );
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/supabase/callback/implicit")
            .set_json(serde_json::json!({
                "hash": "#access_token=T1&refresh_token=T2",
                "search": "?next=%2Fsettings"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body, serde_json::json!({ "redirect": "/settings" }));
}
