//! Integration test harness for the Market Stall storefront.
//!
//! Each test spawns two in-process servers on ephemeral ports:
//!
//! - a [`MockBackend`] standing in for the REST API, answering canned JSON
//!   and recording every request it receives
//! - the real storefront router over a `MemoryStore` session store, pointed
//!   at the mock
//!
//! Tests drive the storefront with a cookie-keeping `reqwest` client that
//! does not follow redirects, so every redirect can be asserted.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p market-stall-integration-tests
//! ```

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::{Client, redirect::Policy};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;

use market_stall_storefront::config::{StorefrontConfig, parse_api_url};
use market_stall_storefront::routes;
use market_stall_storefront::state::AppState;

// =============================================================================
// Mock Backend
// =============================================================================

/// One request received by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct Backend {
    responses: Mutex<HashMap<String, (StatusCode, Value)>>,
    requests: Mutex<Vec<RecordedRequest>>,
    latency: Mutex<Option<Duration>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scriptable stand-in for the REST backend.
///
/// Unscripted routes answer 404 with an error envelope.
#[derive(Clone)]
pub struct MockBackend {
    url: String,
    inner: Arc<Backend>,
}

impl MockBackend {
    /// Start the mock on an ephemeral port.
    pub async fn start() -> Self {
        let inner = Arc::new(Backend::default());
        let router = Router::new().fallback(answer).with_state(Arc::clone(&inner));
        let addr = serve(router).await;

        Self {
            url: format!("http://{addr}"),
            inner,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Answer `method path` with `status` and `body`.
    ///
    /// `path` may carry a query string; a route scripted with one wins over
    /// the same path scripted without.
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        lock(&self.inner.responses).insert(format!("{method} {path}"), (status, body));
    }

    /// Answer `method path` with 200 and `body`.
    pub fn ok(&self, method: Method, path: &str, body: Value) {
        self.respond(method, path, StatusCode::OK, body);
    }

    /// Answer `method path` with `status` and an error envelope.
    pub fn fail(&self, method: Method, path: &str, status: StatusCode, message: &str) {
        self.respond(
            method,
            path,
            status,
            json!({ "response_key": "ERROR", "response_message": message }),
        );
    }

    /// Hold every answer for `latency`, so concurrent requests overlap.
    pub fn slow_down(&self, latency: Duration) {
        *lock(&self.inner.latency) = Some(latency);
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.inner.requests).clone()
    }

    /// Requests received for `method path`, ignoring the query string.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| &r.method == method && r.path == path)
            .collect()
    }
}

async fn answer(
    State(backend): State<Arc<Backend>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let query = uri.query().map(str::to_string);

    lock(&backend.requests).push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    let latency = *lock(&backend.latency);
    if let Some(latency) = latency {
        tokio::time::sleep(latency).await;
    }

    let canned = {
        let responses = lock(&backend.responses);
        query
            .as_ref()
            .and_then(|q| responses.get(&format!("{method} {path}?{q}")))
            .or_else(|| responses.get(&format!("{method} {path}")))
            .cloned()
    };

    match canned {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "response_key": "NOT_FOUND",
                "response_message": format!("No route for {method} {path}"),
            })),
        )
            .into_response(),
    }
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener
        .local_addr()
        .expect("Failed to read test listener address");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server failed");
    });

    addr
}

// =============================================================================
// Fixtures
// =============================================================================

/// A bearer token whose payload carries `{"id": user_id}`.
#[must_use]
pub fn jwt(user_id: i64) -> String {
    let payload = URL_SAFE_NO_PAD.encode(json!({ "id": user_id, "exp": 4_102_444_800_i64 }).to_string());
    format!("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.{payload}.signature")
}

/// `{ response_key, response_message, data }`.
#[must_use]
pub fn envelope(data: Value) -> Value {
    json!({ "response_key": "SUCCESS", "response_message": "OK", "data": data })
}

/// A paginated envelope.
#[must_use]
pub fn paginated(data: Value, page: u32, total: u64, total_page: u32) -> Value {
    json!({
        "response_key": "SUCCESS",
        "response_message": "OK",
        "data": data,
        "page": page,
        "pageSize": 10,
        "total": total,
        "totalPage": total_page,
    })
}

/// A customer profile: a role without permissions.
#[must_use]
pub fn customer() -> Value {
    json!({
        "id": 7,
        "username": "shopper",
        "fullname": "Sam Shopper",
        "email": "sam@example.com",
        "avatar": "",
        "roleId": 2,
        "isActive": true,
        "createdAt": "2025-01-02T03:04:00Z",
        "userRole": { "name": "customer", "description": "", "permissionInfos": [] },
    })
}

/// An admin profile: a role with at least one permission.
#[must_use]
pub fn admin() -> Value {
    json!({
        "id": 1,
        "username": "root",
        "fullname": "Ada Admin",
        "email": "ada@example.com",
        "avatar": "",
        "roleId": 1,
        "isActive": true,
        "userRole": {
            "name": "admin",
            "description": "",
            "permissionInfos": [{ "id": 1, "name": "manage" }],
        },
    })
}

/// A product listing entry.
#[must_use]
pub fn product(id: i64, name: &str, price: f64, amount: i64) -> Value {
    json!({ "id": id, "name": name, "price": price, "amount": amount })
}

// =============================================================================
// Test Application
// =============================================================================

/// A running storefront wired to its own mock backend.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub backend: MockBackend,
}

impl TestApp {
    /// Spawn a fresh storefront and backend.
    pub async fn spawn() -> Self {
        let backend = MockBackend::start().await;

        let config = StorefrontConfig {
            api_url: parse_api_url(backend.url()).expect("Mock backend URL is valid"),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            session_db_url: SecretString::from("sqlite::memory:"),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let app = routes::app(AppState::new(config), MemoryStore::default());
        let addr = serve(app).await;

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{addr}"),
            client,
            backend,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `GET path` on the storefront.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// `GET path` with the `HX-Request` header HTMX sends.
    pub async fn get_fragment(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("HX-Request", "true")
            .send()
            .await
            .expect("GET request failed")
    }

    /// `POST path` with a urlencoded form.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Sign in as `user`, whose id is also the token's `id` claim.
    pub async fn sign_in_as(&self, user: &Value) {
        let id = user["id"].as_i64().expect("Fixture user has an id");
        self.backend.ok(
            Method::POST,
            "/auth/login",
            envelope(json!({ "token": jwt(id), "refresh_token": "refresh" })),
        );
        self.backend
            .ok(Method::GET, "/users/info", envelope(user.clone()));

        let response = self
            .post_form("/sign-in", &[("username", "user"), ("password", "secret")])
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/home"));
    }
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
