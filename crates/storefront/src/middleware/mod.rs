//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `SQLite` store)
//! 5. Session teardown (clear local state after session-fatal errors)
//!
//! Route guards are extractors rather than layers; see [`guards`].

pub mod guards;
pub mod request_id;
pub mod session;
pub mod teardown;

pub use guards::{GuardDecision, ProtectedRoute, PublicRoute, RouteKind, decide};
pub use request_id::{RequestId, request_id_middleware};
pub use session::create_session_layer;
pub use teardown::session_teardown_middleware;
