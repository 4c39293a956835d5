//! Sign-in, sign-up and logout.

use axum::http::{Method, StatusCode};
use serde_json::json;

use market_stall_integration_tests::{TestApp, customer, envelope, location};

#[tokio::test]
async fn test_sign_in_sends_credentials_without_bearer() {
    let app = TestApp::spawn().await;
    app.sign_in_as(&customer()).await;

    let logins = app.backend.requests_to(&Method::POST, "/auth/login");
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].body, json!({ "username": "user", "password": "secret" }));
    assert_eq!(logins[0].authorization, None);
}

#[tokio::test]
async fn test_later_calls_carry_bearer_token() {
    let app = TestApp::spawn().await;
    app.sign_in_as(&customer()).await;

    app.get("/home").await;

    let info = app.backend.requests_to(&Method::GET, "/users/info");
    assert_eq!(info.len(), 1);
    let header = info[0].authorization.clone().unwrap_or_default();
    assert!(header.starts_with("Bearer "));
}

#[tokio::test]
async fn test_sign_in_requires_both_fields() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form("/sign-in", &[("username", ""), ("password", "")])
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap_or_default();
    assert!(body.contains("Username is required"));
    assert!(body.contains("Password is required"));
    assert!(app.backend.requests().is_empty());
}

#[tokio::test]
async fn test_rejected_sign_in_shows_dialog() {
    let app = TestApp::spawn().await;
    app.backend.fail(
        Method::POST,
        "/auth/login",
        StatusCode::UNAUTHORIZED,
        "Wrong username or password",
    );

    let response = app
        .post_form("/sign-in", &[("username", "sam"), ("password", "nope")])
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap_or_default();
    assert!(body.contains("Wrong username or password"));
    assert!(body.contains("<dialog"));

    // Still signed out.
    let response = app.get("/home").await;
    assert_eq!(location(&response), Some("/sign-in"));
}

#[tokio::test]
async fn test_sign_in_backend_down_shows_network_error() {
    let app = TestApp::spawn().await;
    app.backend.fail(
        Method::POST,
        "/auth/login",
        StatusCode::SERVICE_UNAVAILABLE,
        "maintenance",
    );

    let response = app
        .post_form("/sign-in", &[("username", "sam"), ("password", "pw")])
        .await;

    let body = response.text().await.unwrap_or_default();
    assert!(body.contains("Network error"));
}

#[tokio::test]
async fn test_sign_up_registers_then_points_to_sign_in() {
    let app = TestApp::spawn().await;
    app.backend
        .ok(Method::POST, "/auth/register", envelope(json!(null)));

    let response = app
        .post_form(
            "/sign-up",
            &[
                ("username", "newbie"),
                ("fullname", "New Bie"),
                ("email", "newbie@example.com"),
                ("password", "pw"),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/sign-in?registered=1"));

    let registrations = app.backend.requests_to(&Method::POST, "/auth/register");
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].body["email"], "newbie@example.com");

    let body = app
        .get("/sign-in?registered=1")
        .await
        .text()
        .await
        .unwrap_or_default();
    assert!(body.contains("Your account was created"));
}

#[tokio::test]
async fn test_sign_up_validates_email_locally() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/sign-up",
            &[
                ("username", "newbie"),
                ("fullname", "New Bie"),
                ("email", "not-an-email"),
                ("password", "pw"),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.backend.requests().is_empty());
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = TestApp::spawn().await;
    app.sign_in_as(&customer()).await;

    let response = app.post_form("/logout", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/sign-in"));

    let response = app.get("/home").await;
    assert_eq!(location(&response), Some("/sign-in"));
}
