//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Health check
//!
//! # Public (signed-out visitors only)
//! GET  /                           - Sign-in page
//! GET  /sign-in                    - Sign-in page
//! POST /sign-in                    - Sign-in action
//! GET  /sign-up                    - Sign-up page
//! POST /sign-up                    - Sign-up action
//!
//! # Protected (signed-in visitors)
//! POST /logout                     - Logout action
//! GET  /home                       - Home page
//! GET  /backoffice                 - Back-office landing (admins)
//! GET  /product                    - Product listing (?page=N)
//! POST /product/cart               - Add one unit to the cart
//! GET  /add-product                - Add-product form
//! POST /add-product                - Add-product action
//! GET  /add-product/categories     - Next page of category options (HTMX)
//! GET  /cart                       - Cart page
//! POST /cart/remove                - Remove a cart line
//! POST /cart/checkout              - Place the order
//! GET  /history                    - Order history (?page=N)
//! GET  /order-detail/{order_id}    - Order detail
//! GET  /wallet                     - Wallet list
//! GET  /add-wallet                 - Wallet form
//! POST /add-wallet                 - Wallet action
//! GET  /profile                    - Profile page
//! GET  /user-management            - User list (?page=N)
//! GET  /user/create                - Create-user form
//! POST /user/create                - Create-user action
//! GET  /user/{user_id}/edit        - Edit-user form
//! POST /user/{user_id}/edit        - Edit-user action
//! ```

pub mod auth;
pub mod cart;
pub mod home;
pub mod orders;
pub mod products;
pub mod profile;
pub mod users;
pub mod wallets;

use std::time::Duration;

use axum::{
    Router,
    http::{Request, Response},
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionStore;
use tracing::Span;

use crate::middleware::{create_session_layer, request_id_middleware, session_teardown_middleware};
use crate::state::AppState;

/// Every page and form endpoint.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // Public
        .route("/", get(auth::sign_in_page))
        .route("/sign-in", get(auth::sign_in_page).post(auth::sign_in))
        .route("/sign-up", get(auth::sign_up_page).post(auth::sign_up))
        .route("/logout", post(auth::logout))
        // Landing pages
        .route("/home", get(home::home))
        .route("/backoffice", get(home::backoffice))
        // Catalog
        .route("/product", get(products::index))
        .route("/product/cart", post(products::add_to_cart))
        .route("/add-product", get(products::new).post(products::create))
        .route("/add-product/categories", get(products::categories))
        // Cart & orders
        .route("/cart", get(cart::show))
        .route("/cart/remove", post(cart::remove))
        .route("/cart/checkout", post(cart::checkout))
        .route("/history", get(orders::history))
        .route("/order-detail/{order_id}", get(orders::detail))
        // Wallets
        .route("/wallet", get(wallets::index))
        .route("/add-wallet", get(wallets::new).post(wallets::create))
        // Account
        .route("/profile", get(profile::show))
        // User management
        .route("/user-management", get(users::index))
        .route("/user/create", get(users::new).post(users::create))
        .route("/user/{user_id}/edit", get(users::edit).post(users::update))
}

/// The full application over `store`, minus the Sentry layers.
///
/// The teardown middleware sits inside the session layer so the session it
/// clears is the one that gets saved.
pub fn app<Store>(state: AppState, store: Store) -> Router
where
    Store: SessionStore + Clone,
{
    let session_layer = create_session_layer(store, state.config().secure_cookies());

    routes()
        .layer(axum::middleware::from_fn(session_teardown_middleware))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}
