//! Cart merge, removal and checkout.

use axum::http::{Method, StatusCode};
use serde_json::json;

use market_stall_integration_tests::{
    TestApp, customer, envelope, location, paginated, product,
};

const MISSING_WALLET: &str = "Please select a payment method";

async fn shopper() -> TestApp {
    let app = TestApp::spawn().await;
    app.sign_in_as(&customer()).await;
    app.backend.ok(
        Method::GET,
        "/products",
        paginated(
            json!([product(1, "Mango", 1.25, 5), product(2, "Kiwi", 3.0, 1)]),
            1,
            2,
            1,
        ),
    );
    app.backend.ok(
        Method::GET,
        "/wallets",
        paginated(
            json!([{ "id": 3, "name": "Main", "token": "t", "uuid": "u", "user_id": 7, "value": 100 }]),
            1,
            1,
            1,
        ),
    );
    app
}

async fn add(app: &TestApp, product_id: &str) {
    let response = app
        .post_form("/product/cart", &[("product_id", product_id), ("page", "1")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/product?page=1"));
}

#[tokio::test]
async fn test_adding_twice_bumps_quantity() {
    let app = shopper().await;
    add(&app, "1").await;
    add(&app, "1").await;
    add(&app, "2").await;

    let body = app.get("/cart").await.text().await.unwrap_or_default();

    assert_eq!(body.matches("name=\"product_id\" value=\"1\"").count(), 1);
    assert!(body.contains("$2.50"));
    // 2 × 1.25 + 1 × 3.00
    assert!(body.contains("$5.50"));
    assert!(body.contains("Main ($100.00)"));
}

#[tokio::test]
async fn test_cart_badge_counts_distinct_lines() {
    let app = shopper().await;
    add(&app, "1").await;
    add(&app, "1").await;
    add(&app, "2").await;

    let body = app.get("/home").await.text().await.unwrap_or_default();
    assert!(body.contains("<span class=\"badge\">2</span>"));
}

#[tokio::test]
async fn test_out_of_stock_product_is_refused() {
    let app = TestApp::spawn().await;
    app.sign_in_as(&customer()).await;
    app.backend.ok(
        Method::GET,
        "/products",
        paginated(json!([product(4, "Durian", 9.0, 0)]), 1, 1, 1),
    );

    let response = app
        .post_form("/product/cart", &[("product_id", "4"), ("page", "1")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let listing = app.get("/product").await.text().await.unwrap_or_default();
    assert!(!listing.contains("Add to Cart"));
}

#[tokio::test]
async fn test_removing_last_line_shows_empty_cart() {
    let app = shopper().await;
    add(&app, "1").await;

    let response = app.post_form("/cart/remove", &[("product_id", "1")]).await;
    assert_eq!(location(&response), Some("/cart"));

    let body = app.get("/cart").await.text().await.unwrap_or_default();
    assert!(body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_checkout_without_wallet_calls_no_backend() {
    let app = shopper().await;
    add(&app, "1").await;
    app.get("/cart").await;
    let before = app.backend.requests().len();

    let response = app.post_form("/cart/checkout", &[("wallet_id", "")]).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap_or_default();
    assert!(body.contains(MISSING_WALLET));
    assert!(body.contains("Main ($100.00)"));
    assert_eq!(app.backend.requests().len(), before);

    // The cart is untouched.
    let body = app.get("/cart").await.text().await.unwrap_or_default();
    assert!(body.contains("Mango"));
}

#[tokio::test]
async fn test_checkout_places_one_order_and_clears_cart() {
    let app = shopper().await;
    app.backend
        .ok(Method::POST, "/orders", envelope(json!({ "id": 55 })));
    add(&app, "1").await;
    add(&app, "1").await;
    add(&app, "2").await;

    let response = app.post_form("/cart/checkout", &[("wallet_id", "3")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/home"));

    let orders = app.backend.requests_to(&Method::POST, "/orders");
    assert_eq!(orders.len(), 1);
    assert_eq!(
        orders[0].body,
        json!({
            "orders": [
                { "amount": 2, "product_id": 1 },
                { "amount": 1, "product_id": 2 },
            ],
            "wallet_id": 3,
        })
    );

    let body = app.get("/cart").await.text().await.unwrap_or_default();
    assert!(body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_rejected_checkout_keeps_cart_and_shows_message() {
    let app = shopper().await;
    app.backend.fail(
        Method::POST,
        "/orders",
        StatusCode::BAD_REQUEST,
        "Insufficient balance",
    );
    add(&app, "1").await;

    let response = app.post_form("/cart/checkout", &[("wallet_id", "3")]).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap_or_default();
    assert!(body.contains("Insufficient balance"));
    assert!(body.contains("Mango"));
}
