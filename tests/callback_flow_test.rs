// End-to-end callback flows against an in-memory provider
use actix_web::{
    cookie::Cookie,
    dev::ServiceResponse,
    http::{header, StatusCode},
    test, web, App,
};
use serde_json::{json, Value};
use std::sync::Arc;

use gatehouse::configure_services;
use gatehouse::session::COOKIE_NAME;
use gatehouse::testing::{constants::TEST_VERIFIER_COOKIE, FakeEmailValidator, FakeProvider, TestFixtures};

const SAME_BROWSER: &str =
    "Something went wrong. Please make sure you open the link in the same browser you used to sign up.";

macro_rules! app {
    ($provider:expr, $validator:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(TestFixtures::services(
                    $provider.clone(),
                    $validator.clone(),
                )))
                .configure(configure_services),
        )
        .await
    };
}

fn location(resp: &ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn session_cookie(resp: &ServiceResponse) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == COOKIE_NAME)
        .map(Cookie::into_owned)
}

#[actix_web::test]
async fn test_provider_error_redirects_to_sign_up_without_exchange() {
    let provider = Arc::new(FakeProvider::new().with_code("abc123", Some("ada@example.com")));
    let validator = Arc::new(FakeEmailValidator::new());
    let app = app!(provider, validator);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/supabase/callback/pkce?code=abc123&error=access_denied&error_description=Email%20link%20is%20invalid%20or%20has%20expired")
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(&resp),
        "/auth/supabase/sign-up?error=Email%20link%20is%20invalid%20or%20has%20expired"
    );
    assert!(session_cookie(&resp).is_none());
    assert_eq!(provider.exchange_calls(), 0);
}

#[actix_web::test]
async fn test_valid_code_redirects_to_next() {
    let provider = Arc::new(FakeProvider::new().with_code("abc123", Some("ada@example.com")));
    let validator = Arc::new(FakeEmailValidator::new());
    let app = app!(provider, validator);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/supabase/callback/pkce?code=abc123&next=/dashboard/orders")
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/dashboard/orders");
    let cookie = session_cookie(&resp).expect("session cookie set");
    assert!(!cookie.value().is_empty());

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/session")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["email"], "ada@example.com");
}

#[actix_web::test]
async fn test_replayed_code_fails_without_second_session() {
    let provider = Arc::new(FakeProvider::new().with_code("abc123", Some("ada@example.com")));
    let validator = Arc::new(FakeEmailValidator::new());
    let app = app!(provider, validator);

    let first = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/supabase/callback/pkce?code=abc123")
            .to_request(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::FOUND);
    assert_eq!(location(&first), "/");

    let replay = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/supabase/callback/pkce?code=abc123")
            .to_request(),
    )
    .await;
    assert_eq!(replay.status(), StatusCode::OK);
    assert!(session_cookie(&replay).is_none());
    let body: Value = test::read_body_json(replay).await;
    assert_eq!(
        body,
        json!({ "error": "invalid flow state, no valid flow state found" })
    );

    assert_eq!(provider.exchange_calls(), 2);
    assert_eq!(provider.sessions_created(), 1);
}

#[actix_web::test]
async fn test_rejected_email_reverses_session() {
    let provider = Arc::new(FakeProvider::new().with_code("abc123", Some("eve@example.com")));
    let validator = Arc::new(
        FakeEmailValidator::new().rejecting("eve@example.com", "This email is not registered"),
    );
    let app = app!(provider, validator);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/supabase/callback/pkce?code=abc123&next=/dashboard")
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(&resp),
        "/auth/supabase/sign-up?error=This%20email%20is%20not%20registered"
    );
    assert_eq!(provider.sign_out_calls(), 1);

    let cookie = session_cookie(&resp).expect("session cookie cleared");
    assert_eq!(cookie.value(), "");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/session")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "authenticated": false }));
}

#[actix_web::test]
async fn test_missing_code_answers_json() {
    let provider = Arc::new(FakeProvider::new());
    let validator = Arc::new(FakeEmailValidator::new());
    let app = app!(provider, validator);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/supabase/callback/pkce?next=/dashboard")
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Code is missing" }));
    assert_eq!(provider.exchange_calls(), 0);
}

#[actix_web::test]
async fn test_user_without_email_answers_json() {
    let provider = Arc::new(FakeProvider::new().with_code("abc123", None));
    let validator = Arc::new(FakeEmailValidator::new());
    let app = app!(provider, validator);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/supabase/callback/pkce?code=abc123")
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "User is missing" }));
    assert!(validator.calls().is_empty());
}

#[actix_web::test]
async fn test_missing_verifier_gets_generic_message() {
    let provider = Arc::new(
        FakeProvider::new()
            .with_code("abc123", Some("ada@example.com"))
            .requiring_verifier(),
    );
    let validator = Arc::new(FakeEmailValidator::new());
    let app = app!(provider, validator);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/supabase/callback/pkce?code=abc123")
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": SAME_BROWSER }));
}

#[actix_web::test]
async fn test_verifier_cookie_is_consumed() {
    let provider = Arc::new(
        FakeProvider::new()
            .with_code("abc123", Some("ada@example.com"))
            .requiring_verifier(),
    );
    let validator = Arc::new(FakeEmailValidator::new());
    let app = app!(provider, validator);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/supabase/callback/pkce?code=abc123&next=/update-password")
            .cookie(Cookie::new(TEST_VERIFIER_COOKIE, "%22verifier-123%22"))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/update-password");
    let verifier = resp
        .response()
        .cookies()
        .find(|c| c.name() == TEST_VERIFIER_COOKIE)
        .expect("verifier cookie cleared");
    assert_eq!(verifier.value(), "");
}

#[actix_web::test]
async fn test_validation_outage_signs_out_with_generic_message() {
    let provider = Arc::new(FakeProvider::new().with_code("abc123", Some("ada@example.com")));
    let validator = Arc::new(FakeEmailValidator::new().failing());
    let app = app!(provider, validator);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/supabase/callback/pkce?code=abc123")
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(session_cookie(&resp).map(|c| c.value().to_string()), Some(String::new()));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": SAME_BROWSER }));
    assert_eq!(provider.sign_out_calls(), 1);
}

#[actix_web::test]
async fn test_implicit_tokens_land_on_dashboard_overview() {
    let provider = Arc::new(FakeProvider::new().with_tokens("T1", "T2", Some("ada@example.com")));
    let validator = Arc::new(FakeEmailValidator::new());
    let app = app!(provider, validator);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/supabase/callback/implicit")
            .set_json(json!({ "hash": "#access_token=T1&refresh_token=T2", "search": "" }))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(session_cookie(&resp).is_some());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "redirect": "/dashboard" }));
}

#[actix_web::test]
async fn test_implicit_missing_token_never_exchanges() {
    let provider = Arc::new(FakeProvider::new().with_tokens("T1", "T2", Some("ada@example.com")));
    let validator = Arc::new(FakeEmailValidator::new());
    let app = app!(provider, validator);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/supabase/callback/implicit")
            .set_json(json!({ "hash": "#access_token=T1", "search": "?next=/settings" }))
            .to_request(),
    )
    .await;

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "redirect": "/auth/supabase/sign-up?error=Access%20token%20or%20refresh%20token%20is%20missing",
            "notice": { "kind": "error", "message": "Access token or refresh token is missing" }
        })
    );
    assert_eq!(provider.set_session_calls(), 0);
}

#[actix_web::test]
async fn test_implicit_refused_tokens_go_to_sign_in() {
    let provider = Arc::new(FakeProvider::new());
    let validator = Arc::new(FakeEmailValidator::new());
    let app = app!(provider, validator);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/supabase/callback/implicit")
            .set_json(json!({ "hash": "#access_token=old&refresh_token=old" }))
            .to_request(),
    )
    .await;

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "redirect": "/auth/supabase/sign-in",
            "notice": { "kind": "transient", "message": "Something went wrong" }
        })
    );
}

#[actix_web::test]
async fn test_invite_link_missing_refresh_token() {
    let provider = Arc::new(FakeProvider::new().with_tokens("T1", "T2", Some("ada@example.com")));
    let validator = Arc::new(FakeEmailValidator::new());
    let app = app!(provider, validator);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/supabase/session/recovery")
            .set_json(json!({ "hash": "#access_token=T1&type=invite" }))
            .to_request(),
    )
    .await;

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "status": "error",
            "message": "Invalid or expired invitation link. Please request a new invitation."
        })
    );
    assert_eq!(provider.set_session_calls(), 0);
}

#[actix_web::test]
async fn test_recovery_link_establishes_session() {
    let provider = Arc::new(FakeProvider::new().with_tokens("T1", "T2", Some("ada@example.com")));
    let validator = Arc::new(FakeEmailValidator::new());
    let app = app!(provider, validator);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/supabase/session/recovery")
            .set_json(json!({ "hash": "#access_token=T1&refresh_token=T2&type=recovery" }))
            .to_request(),
    )
    .await;

    assert!(session_cookie(&resp).is_some());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "status": "ok" }));
}
