//! Session teardown after session-fatal errors.
//!
//! `AppError` marks a response with [`SessionTeardown`] when the backend says
//! the visitor's session is no longer good. This middleware sees the marker
//! on the way out and clears local state, so no handler has to.

use axum::{extract::Request, middleware::Next, response::Response};
use tower_sessions::Session;

use crate::error::{SessionTeardown, clear_sentry_user};
use crate::session::LocalState;

/// Clear local state when the response carries [`SessionTeardown`].
///
/// Must sit inside the session layer so the cleared session is saved.
pub async fn session_teardown_middleware(request: Request, next: Next) -> Response {
    let session = request.extensions().get::<Session>().cloned();

    let response = next.run(request).await;

    if response.extensions().get::<SessionTeardown>().is_none() {
        return response;
    }

    match session {
        Some(session) => {
            if let Err(e) = LocalState::from_session(session).logout().await {
                tracing::error!(error = %e, "Failed to clear local state after session-fatal error");
            } else {
                clear_sentry_user();
                tracing::info!("Local state cleared after session-fatal error");
            }
        }
        None => tracing::warn!("Teardown requested on a route without a session"),
    }

    response
}
