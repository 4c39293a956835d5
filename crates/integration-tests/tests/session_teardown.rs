//! Central error policy: session-fatal statuses sign the visitor out,
//! client errors show a dialog, and everything else is a network error.

use axum::http::{Method, StatusCode};
use serde_json::json;

use market_stall_integration_tests::{
    TestApp, customer, envelope, location, paginated, product,
};

async fn signed_in_with_cart() -> TestApp {
    let app = TestApp::spawn().await;
    app.sign_in_as(&customer()).await;
    app.backend.ok(
        Method::GET,
        "/products",
        paginated(json!([product(1, "Mango", 1.5, 3)]), 1, 1, 1),
    );
    let response = app
        .post_form("/product/cart", &[("product_id", "1"), ("page", "1")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    app
}

#[tokio::test]
async fn test_session_fatal_statuses_clear_state_and_redirect() {
    for status in [
        StatusCode::UNAUTHORIZED,
        StatusCode::FORBIDDEN,
        StatusCode::INTERNAL_SERVER_ERROR,
    ] {
        let app = signed_in_with_cart().await;
        app.backend
            .fail(Method::GET, "/orders", status, "session expired");

        let response = app.get("/history").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{status}");
        assert_eq!(location(&response), Some("/sign-in"), "{status}");

        // Token gone: protected pages bounce without calling the backend.
        let before = app.backend.requests().len();
        let response = app.get("/home").await;
        assert_eq!(location(&response), Some("/sign-in"), "{status}");
        assert_eq!(app.backend.requests().len(), before, "{status}");

        // Cart gone: signing in again starts empty.
        app.sign_in_as(&customer()).await;
        let body = app.get("/cart").await.text().await.unwrap_or_default();
        assert!(body.contains("Your cart is empty"), "{status}");
    }
}

#[tokio::test]
async fn test_session_fatal_during_form_submission() {
    let app = signed_in_with_cart().await;
    app.backend
        .fail(Method::POST, "/orders", StatusCode::UNAUTHORIZED, "expired");

    let response = app.post_form("/cart/checkout", &[("wallet_id", "3")]).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/sign-in"));
    let response = app.get("/cart").await;
    assert_eq!(location(&response), Some("/sign-in"));
}

#[tokio::test]
async fn test_client_error_renders_dialog_and_keeps_session() {
    let app = TestApp::spawn().await;
    app.sign_in_as(&customer()).await;
    app.backend
        .fail(Method::GET, "/orders/99", StatusCode::NOT_FOUND, "Order not found");

    let response = app.get("/order-detail/99").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.text().await.unwrap_or_default();
    assert!(body.contains("Order not found"));

    let response = app.get("/home").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unavailable_renders_network_error() {
    let app = TestApp::spawn().await;
    app.sign_in_as(&customer()).await;
    app.backend
        .fail(Method::GET, "/wallets", StatusCode::SERVICE_UNAVAILABLE, "down");

    let response = app.get("/wallet").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = response.text().await.unwrap_or_default();
    assert!(body.contains("Network error"));

    let response = app.get("/home").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_profile_refreshes_user_store() {
    let app = TestApp::spawn().await;
    app.sign_in_as(&customer()).await;
    app.get("/home").await;

    let mut renamed = customer();
    renamed["fullname"] = json!("Samantha Shopper");
    app.backend
        .ok(Method::GET, "/users/info", envelope(renamed));

    let body = app.get("/profile").await.text().await.unwrap_or_default();
    assert!(body.contains("Samantha Shopper"));
    assert!(body.contains("customer"));
    assert!(body.contains("2025-01-02 03:04"));

    // Profile always asks; other pages use the store.
    let calls = app.backend.requests_to(&Method::GET, "/users/info").len();
    app.get("/home").await;
    assert_eq!(app.backend.requests_to(&Method::GET, "/users/info").len(), calls);
}
