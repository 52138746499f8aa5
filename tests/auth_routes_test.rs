mod common;

use actix_web::test;
use serde_json::{json, Value};

use common::{bearer, register, register_body, TestApp, PASSWORD};

#[actix_rt::test]
async fn test_health_reports_store_and_disabled_integrations() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["services"]["database"]["status"], "ok");
    assert_eq!(body["services"]["google_auth"]["status"], "disabled");
    assert_eq!(body["services"]["cloud_storage"]["status"], "disabled");
}

#[actix_rt::test]
async fn test_register_returns_tokens_and_user() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let body = register(&app, "alice", "tourist").await;
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["user_type"], "tourist");
    assert_eq!(body["user"]["is_approved"], true);
    assert!(body["user"].get("password").is_none());
    assert!(body["access"].as_str().is_some());
    assert!(body["refresh"].as_str().is_some());
}

#[actix_rt::test]
async fn test_register_rejects_duplicate_email() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    register(&app, "bob", "tourist").await;

    let mut again = register_body("bob2", "tourist");
    again["email"] = json!("BOB@example.com");
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(again)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
}

#[actix_rt::test]
async fn test_register_validation_errors_are_per_field() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let mut body = register_body("carol", "admin");
    body["password_confirm"] = json!("something-else");
    body["email"] = json!("not-an-email");
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"]["password_confirm"].is_array());
    assert!(body["details"]["email"].is_array());
    assert!(body["details"]["user_type"].is_array());
}

#[actix_rt::test]
async fn test_malformed_body_is_a_validation_error() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    register(&app, "dave", "tourist").await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "dave@example.com", "password": "wrong-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "Dave@Example.com", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
async fn test_refresh_issues_a_new_access_token() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let body = register(&app, "erin", "guide").await;
    let refresh = body["refresh"].as_str().unwrap().to_string();
    let access = body["access"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refresh": refresh }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let refreshed: Value = test::read_body_json(resp).await;
    assert!(refreshed["access"].as_str().is_some());

    // An access token is not accepted where a refresh token is expected.
    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refresh": access }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
async fn test_profile_requires_a_token() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/api/auth/profile").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(bearer("garbage"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
async fn test_profile_includes_role_profile() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let body = register(&app, "frank", "guide").await;
    let token = body["access"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(bearer(token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["username"], "frank");
    assert_eq!(body["profile"]["display_name"], "Test User");
}

#[actix_rt::test]
async fn test_role_profile_endpoints_enforce_role() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let body = register(&app, "gina", "tourist").await;
    let token = body["access"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri("/api/profile/guide")
        .insert_header(bearer(token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::put()
        .uri("/api/profile/tourist")
        .insert_header(bearer(token))
        .set_json(json!({ "nationality": "Nepal", "travel_interests": ["adventure"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let profile: Value = test::read_body_json(resp).await;
    assert_eq!(profile["nationality"], "Nepal");
}

#[actix_rt::test]
async fn test_social_login_without_configuration_is_unauthorized() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/google_login")
        .set_json(json!({ "token": "some-id-token" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/api/auth/facebook_login")
        .set_json(json!({ "access_token": "some-access-token" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
async fn test_logout_revokes_refresh_token() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let body = register(&app, "leaver", "tourist").await;
    let refresh = body["refresh"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/auth/logout")
        .set_json(json!({ "refresh": refresh }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let out: Value = test::read_body_json(resp).await;
    assert_eq!(out["message"], "Logout successful");

    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refresh": refresh }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
async fn test_logout_without_token_is_rejected() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/logout")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["details"]["refresh"].is_array());

    let req = test::TestRequest::post()
        .uri("/api/auth/logout")
        .set_json(json!({ "refresh": "garbage" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_guides_register_unapproved() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let body = register(&app, "new_guide", "guide").await;
    assert_eq!(body["user"]["user_type"], "guide");
    assert_eq!(body["user"]["is_approved"], false);
    assert_eq!(body["user"]["is_verified"], false);
}
