//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`, and `AppError` is the one
//! place where a failed backend call turns into a response:
//!
//! - session-fatal failures redirect to `/sign-in` and mark the response
//!   with [`SessionTeardown`] so the teardown middleware clears local state
//! - client failures render the backend's message in an error dialog
//! - everything else is captured to Sentry and rendered as "Network error"

use askama::Template;
use axum::{
    http::{HeaderValue, StatusCode, header::LOCATION},
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::api::{ApiError, ErrorKind, NETWORK_ERROR};
use crate::session::{LocalStateError, TokenError};

/// Where visitors go once their session is gone.
pub const SIGN_IN_PATH: &str = "/sign-in";

/// Response marker asking the teardown middleware to clear local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTeardown;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Visitor state could not be read or written.
    #[error("Local state error: {0}")]
    LocalState(#[from] LocalStateError),

    /// The stored token cannot identify its user.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this failure ends the visitor's session.
    #[must_use]
    pub fn is_session_fatal(&self) -> bool {
        match self {
            Self::Api(e) => e.kind() == ErrorKind::SessionFatal,
            Self::LocalState(LocalStateError::NotFound(_)) | Self::Token(_) => true,
            _ => false,
        }
    }

    fn is_server_error(&self) -> bool {
        match self {
            Self::Api(e) => e.kind() == ErrorKind::Unavailable,
            Self::LocalState(_) | Self::Internal(_) => true,
            Self::Token(_) | Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_session_fatal() {
            tracing::info!(error = %self, "Session-fatal error, signing out");
            let mut response = Redirect::to(SIGN_IN_PATH).into_response();
            response.extensions_mut().insert(SessionTeardown);
            return response;
        }

        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let (status, message) = match &self {
            Self::Api(e) if e.kind() == ErrorKind::Client => {
                (StatusCode::BAD_REQUEST, e.user_message().to_string())
            }
            Self::Api(_) => (StatusCode::BAD_GATEWAY, NETWORK_ERROR.to_string()),
            Self::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::LocalState(_) | Self::Token(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        render_dialog(status, &message)
    }
}

impl AppError {
    /// Response for an HTMX fragment request.
    ///
    /// HTMX follows a plain redirect inside the XHR and would swap the sign-in
    /// page into the fragment's target, so session-fatal failures answer 200
    /// with `HX-Redirect` instead. Teardown still happens.
    #[must_use]
    pub fn into_fragment_response(self) -> Response {
        if !self.is_session_fatal() {
            return self.into_response();
        }

        let mut response = self.into_response();
        *response.status_mut() = StatusCode::OK;
        response.headers_mut().remove(LOCATION);
        response
            .headers_mut()
            .insert("HX-Redirect", HeaderValue::from_static(SIGN_IN_PATH));
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Stand-alone error dialog page.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorDialogTemplate<'a> {
    pub title: &'a str,
    pub message: &'a str,
    pub dismiss_href: &'a str,
}

fn render_dialog(status: StatusCode, message: &str) -> Response {
    let template = ErrorDialogTemplate {
        title: status.canonical_reason().unwrap_or("Error"),
        message,
        dismiss_href: "/home",
    };

    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render error dialog");
            (status, message.to_string()).into_response()
        }
    }
}

/// Turn a failed form submission into the message its dialog should show.
///
/// Session-fatal failures are passed back as `Err` so they reach the central
/// policy; the caller re-renders its form with the returned message otherwise.
///
/// # Errors
///
/// Returns the `AppError` when the failure ends the session.
pub fn form_error(err: ApiError) -> Result<String> {
    match err.kind() {
        ErrorKind::SessionFatal => Err(err.into()),
        ErrorKind::Client => Ok(err.user_message().to_string()),
        ErrorKind::Unavailable => {
            let event_id = sentry::capture_error(&err);
            tracing::warn!(error = %err, sentry_event_id = %event_id, "Form submission failed");
            Ok(NETWORK_ERROR.to_string())
        }
    }
}

/// Set the Sentry user context from a user ID.
///
/// Call this after the profile is known to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
