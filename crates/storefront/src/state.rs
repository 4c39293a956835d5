//! Application state shared across handlers.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tower_sessions::session::Id;

use crate::api::ApiClient;
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration and the REST backend client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    category_fetches: FetchClaims,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let api = ApiClient::new(config.api_url.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                category_fetches: FetchClaims::default(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the REST backend client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Sessions with a category picker fetch running.
    #[must_use]
    pub fn category_fetches(&self) -> &FetchClaims {
        &self.inner.category_fetches
    }
}

// =============================================================================
// Fetch Claims
// =============================================================================

/// Sessions that currently own a running fetch.
///
/// Each session's record is loaded once per request and saved at the end, so
/// two requests of the same visitor cannot see each other's writes while both
/// are running. Claims are process-wide and taken before the backend call.
#[derive(Clone, Default)]
pub struct FetchClaims {
    claimed: Arc<Mutex<HashSet<Id>>>,
}

impl FetchClaims {
    /// Claim `session_id`, or `None` while another request holds it.
    ///
    /// The claim is released when the returned guard is dropped.
    #[must_use]
    pub fn claim(&self, session_id: Id) -> Option<FetchClaim> {
        self.lock().insert(session_id).then(|| FetchClaim {
            claims: self.clone(),
            session_id,
        })
    }

    /// Whether `session_id` is claimed.
    #[must_use]
    pub fn is_claimed(&self, session_id: Id) -> bool {
        self.lock().contains(&session_id)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<Id>> {
        self.claimed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A held claim; dropping it releases the session.
pub struct FetchClaim {
    claims: FetchClaims,
    session_id: Id,
}

impl Drop for FetchClaim {
    fn drop(&mut self) {
        self.claims.lock().remove(&self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_is_refused_until_release() {
        let claims = FetchClaims::default();
        let id = Id::default();

        let first = claims.claim(id);
        assert!(first.is_some());
        assert!(claims.claim(id).is_none());
        assert!(claims.is_claimed(id));

        drop(first);
        assert!(!claims.is_claimed(id));
        assert!(claims.claim(id).is_some());
    }

    #[test]
    fn test_claims_are_per_session() {
        let claims = FetchClaims::default();
        let _first = claims.claim(Id(1));
        assert!(claims.claim(Id(2)).is_some());
    }
}
