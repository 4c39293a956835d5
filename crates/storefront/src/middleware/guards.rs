//! Route guards.
//!
//! Protected pages need a stored token; public pages (sign-in, sign-up) are
//! only for visitors without one. Both guards are extractors, so a handler
//! opts in by naming one in its arguments.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{AppError, SIGN_IN_PATH};
use crate::session::{Credentials, LocalState, LocalStateError};

/// Landing page for signed-in visitors.
pub const HOME_PATH: &str = "/home";

/// Which side of the sign-in wall a route is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Protected,
    Public,
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(&'static str),
}

/// Decide whether a route renders for a visitor.
#[must_use]
pub const fn decide(kind: RouteKind, token_present: bool) -> GuardDecision {
    match (kind, token_present) {
        (RouteKind::Protected, true) | (RouteKind::Public, false) => GuardDecision::Render,
        (RouteKind::Protected, false) => GuardDecision::Redirect(SIGN_IN_PATH),
        (RouteKind::Public, true) => GuardDecision::Redirect(HOME_PATH),
    }
}

/// Rejection returned by the guards.
#[derive(Debug)]
pub enum GuardRejection {
    /// Send the visitor elsewhere.
    Redirect(&'static str),
    /// Local state could not be read.
    State(AppError),
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect(path) => Redirect::to(path).into_response(),
            Self::State(err) => err.into_response(),
        }
    }
}

impl From<LocalStateError> for GuardRejection {
    fn from(err: LocalStateError) -> Self {
        Self::State(err.into())
    }
}

fn local_state(parts: &Parts) -> Result<LocalState, GuardRejection> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .map(LocalState::from_session)
        .ok_or_else(|| LocalStateError::NoSession.into())
}

/// Extractor for pages that need a signed-in visitor.
///
/// Yields the visitor's credentials; visitors without a token are sent to
/// `/sign-in`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     ProtectedRoute(credentials): ProtectedRoute,
/// ) -> impl IntoResponse {
///     // call the backend with `credentials`
/// }
/// ```
#[derive(Debug)]
pub struct ProtectedRoute(pub Credentials);

impl<S> FromRequestParts<S> for ProtectedRoute
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let local = local_state(parts)?;
        let credentials = match local.get_token().await {
            Ok(credentials) => Some(credentials),
            Err(LocalStateError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };

        match (decide(RouteKind::Protected, credentials.is_some()), credentials) {
            (GuardDecision::Render, Some(credentials)) => Ok(Self(credentials)),
            (GuardDecision::Redirect(path), _) => Err(GuardRejection::Redirect(path)),
            (GuardDecision::Render, None) => Err(GuardRejection::Redirect(SIGN_IN_PATH)),
        }
    }
}

/// Extractor for pages only anonymous visitors may open.
///
/// Signed-in visitors are sent to `/home`.
#[derive(Debug)]
pub struct PublicRoute;

impl<S> FromRequestParts<S> for PublicRoute
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let local = local_state(parts)?;
        match decide(RouteKind::Public, local.has_token().await?) {
            GuardDecision::Render => Ok(Self),
            GuardDecision::Redirect(path) => Err(GuardRejection::Redirect(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_renders_only_with_token() {
        assert_eq!(decide(RouteKind::Protected, true), GuardDecision::Render);
        assert_eq!(
            decide(RouteKind::Protected, false),
            GuardDecision::Redirect("/sign-in")
        );
    }

    #[test]
    fn test_public_renders_only_without_token() {
        assert_eq!(decide(RouteKind::Public, false), GuardDecision::Render);
        assert_eq!(
            decide(RouteKind::Public, true),
            GuardDecision::Redirect("/home")
        );
    }

    #[test]
    fn test_guard_debug_keeps_token_out() {
        assert_eq!(format!("{PublicRoute:?}"), "PublicRoute");
        let guard = ProtectedRoute(Credentials::new("very-secret-token"));
        assert!(!format!("{guard:?}").contains("very-secret-token"));
    }
}
