//! HTTP adapter over `reqwest`.

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::ApiError;
use crate::session::Credentials;

/// Longest stretch of a non-envelope error body kept as the message.
const MAX_MESSAGE_CHARS: usize = 200;

/// Client for the REST backend.
///
/// Cheaply cloneable; every clone shares one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

/// Method, extra headers, body and bearer of one call.
#[derive(Debug)]
pub struct RequestOptions<'a> {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    pub bearer: Option<&'a Credentials>,
}

impl<'a> RequestOptions<'a> {
    fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            body: None,
            bearer: None,
        }
    }

    #[must_use]
    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    /// A POST carrying `body` as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Encode` if `body` cannot be serialized.
    pub fn post<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        Self::new(Method::POST).with_body(body)
    }

    /// A PUT carrying `body` as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Encode` if `body` cannot be serialized.
    pub fn put<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        Self::new(Method::PUT).with_body(body)
    }

    fn with_body<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body).map_err(ApiError::Encode)?);
        Ok(self)
    }

    /// Send `Authorization: Bearer <token>`.
    #[must_use]
    pub fn bearer(mut self, credentials: &'a Credentials) -> Self {
        self.bearer = Some(credentials);
        self
    }

    /// Add a header, replacing any default of the same name.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    response_message: Option<String>,
}

impl ApiClient {
    /// Create a client for the backend rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url,
            }),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Absolute URL of `path` under the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidPath` if the result is not a valid URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Perform one call and decode a 2xx body into `T`.
    ///
    /// An empty 2xx body decodes as JSON `null`, so callers that do not care
    /// about the answer can ask for `serde::de::IgnoredAny`.
    ///
    /// # Errors
    ///
    /// - `ApiError::Transport` when no response arrives
    /// - `ApiError::Status` for any non-2xx status
    /// - `ApiError::Decode` when the body does not match `T`
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions<'_>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(options.headers);
        if let Some(credentials) = options.bearer {
            headers.insert(AUTHORIZATION, credentials.authorization()?);
        }

        debug!(method = %options.method, path, "API request");

        let mut request = self
            .inner
            .client
            .request(options.method.clone(), url)
            .headers(headers);
        if let Some(body) = &options.body {
            request = request.body(serde_json::to_vec(body).map_err(ApiError::Encode)?);
        }

        let response = request.send().await.map_err(|e| {
            warn!(method = %options.method, path, error = %e, "API request failed to send");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(ApiError::Transport)?;

        if !status.is_success() {
            let message = error_message(status, &text);
            warn!(
                method = %options.method,
                path,
                status = status.as_u16(),
                message = %message,
                "API returned non-success status"
            );
            return Err(ApiError::Status { status, message });
        }

        let body = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(body).map_err(|e| {
            warn!(
                path,
                error = %e,
                body = %text.chars().take(MAX_MESSAGE_CHARS).collect::<String>(),
                "Failed to decode API response"
            );
            ApiError::Decode(e)
        })
    }
}

/// Message for a non-2xx response.
///
/// Prefers the envelope's `response_message`, then the raw body, then the
/// status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(ErrorEnvelope {
        response_message: Some(message),
    }) = serde_json::from_str(body)
        && !message.trim().is_empty()
    {
        return message;
    }

    let body = body.trim();
    if body.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }
    body.chars().take(MAX_MESSAGE_CHARS).collect()
}
