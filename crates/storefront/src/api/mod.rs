//! REST backend client.
//!
//! # Architecture
//!
//! - [`ApiClient`] is the one HTTP adapter; it joins paths, sets headers,
//!   serializes bodies and turns non-2xx responses into [`ApiError`]
//! - One module per backend resource, each a set of typed functions with a
//!   fixed method and path
//! - No retries, no timeouts beyond the connection defaults, no caching
//!
//! Every function except sign-in and sign-up takes the visitor's
//! [`Credentials`](crate::session::Credentials) explicitly.

pub mod auth;
mod client;
pub mod orders;
pub mod products;
pub mod roles;
pub mod users;
pub mod wallets;

pub use client::{ApiClient, RequestOptions};

use axum::http::StatusCode;
use thiserror::Error;

/// How a failed call should be handled by the page that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The session can no longer be trusted; tear it down and sign in again.
    SessionFatal,
    /// The backend rejected the request; show its message.
    Client,
    /// The backend could not be reached or answered unusably.
    Unavailable,
}

/// Errors that can occur when calling the REST backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never got a response.
    #[error("HTTP error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("API error {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// A 2xx response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Decode(#[source] serde_json::Error),

    /// A request body could not be serialized.
    #[error("JSON encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// The endpoint path does not form a valid URL.
    #[error("Invalid endpoint: {0}")]
    InvalidPath(#[from] url::ParseError),

    /// The stored token cannot be sent as a header.
    #[error("Invalid bearer token")]
    InvalidToken(#[from] axum::http::header::InvalidHeaderValue),
}

/// Message shown for every failure that is not the backend's own answer.
pub const NETWORK_ERROR: &str = "Network error";

impl ApiError {
    /// Classify the failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Status { status, .. } => match *status {
                StatusCode::UNAUTHORIZED
                | StatusCode::FORBIDDEN
                | StatusCode::INTERNAL_SERVER_ERROR => ErrorKind::SessionFatal,
                s if s.is_client_error() => ErrorKind::Client,
                _ => ErrorKind::Unavailable,
            },
            Self::InvalidToken(_) => ErrorKind::SessionFatal,
            Self::Transport(_) | Self::Decode(_) | Self::Encode(_) | Self::InvalidPath(_) => {
                ErrorKind::Unavailable
            }
        }
    }

    /// Text for the error dialog.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Status { message, .. } if self.kind() == ErrorKind::Client => message,
            _ => NETWORK_ERROR,
        }
    }

    /// HTTP status returned by the backend, if any.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
