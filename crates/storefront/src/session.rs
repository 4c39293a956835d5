//! Per-visitor local state.
//!
//! Each visitor has a durable store (their tower-sessions session) holding
//! the bearer token, the refresh token, the cart, the cached user profile,
//! the category picker and the last wallet list. [`LocalState`] is the only
//! way handlers read or write it.

use axum::{extract::FromRequestParts, http::HeaderValue, http::request::Parts};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tower_sessions::Session;
use tower_sessions::session::Id;

use market_stall_core::{Cart, CategoryPicker, UserId, UserProfile, WalletInfo};

use crate::error::AppError;
use crate::models::session_keys as keys;

/// Errors reading or writing local state.
#[derive(Debug, Error)]
pub enum LocalStateError {
    /// A required key is absent.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The session layer is not installed on this route.
    #[error("Session layer missing")]
    NoSession,

    /// The session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Errors reading the user id out of a bearer token.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token is not a JWT")]
    Malformed,
    #[error("Token payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Token payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Token has no usable id claim")]
    MissingId,
}

// =============================================================================
// Credentials
// =============================================================================

/// A bearer token. Never printed.
#[derive(Debug)]
pub struct AuthToken(SecretString);

impl AuthToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Authentication state passed explicitly into every API call.
#[derive(Debug)]
pub struct Credentials {
    token: AuthToken,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdClaim {
    Number(i64),
    Text(String),
}

#[derive(Deserialize)]
struct Claims {
    id: Option<IdClaim>,
}

impl Credentials {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AuthToken::new(token),
        }
    }

    #[must_use]
    pub const fn token(&self) -> &AuthToken {
        &self.token
    }

    /// `Bearer <token>`, marked sensitive so it stays out of logs.
    ///
    /// # Errors
    ///
    /// Returns an error if the token contains bytes not allowed in a header.
    pub fn authorization(&self) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token.expose()))?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// The `id` claim of the token payload.
    ///
    /// The signature is not checked; the backend does that on every request.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the token is not a JWT or has no numeric `id`.
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        let payload = self
            .token
            .expose()
            .split('.')
            .nth(1)
            .ok_or(TokenError::Malformed)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        let claims: Claims = serde_json::from_slice(&bytes)?;

        match claims.id.ok_or(TokenError::MissingId)? {
            IdClaim::Number(id) => Ok(UserId::new(id)),
            IdClaim::Text(id) => id.parse().map_err(|_| TokenError::MissingId),
        }
    }
}

// =============================================================================
// LocalState
// =============================================================================

/// Accessors over the visitor's durable store.
///
/// Extract it in any handler behind the session layer:
///
/// ```rust,ignore
/// async fn handler(local: LocalState) -> Result<impl IntoResponse, AppError> {
///     let cart = local.get_cart().await?;
///     // ...
/// }
/// ```
#[derive(Clone)]
pub struct LocalState {
    session: Session,
}

impl<S> FromRequestParts<S> for LocalState
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(LocalStateError::NoSession)?;
        Ok(Self { session })
    }
}

impl LocalState {
    #[must_use]
    pub const fn from_session(session: Session) -> Self {
        Self { session }
    }

    /// The stored credentials.
    ///
    /// # Errors
    ///
    /// Returns `LocalStateError::NotFound("token")` when no one is signed in.
    pub async fn get_token(&self) -> Result<Credentials, LocalStateError> {
        self.session
            .get::<String>(keys::TOKEN)
            .await?
            .map(Credentials::new)
            .ok_or(LocalStateError::NotFound(keys::TOKEN))
    }

    /// Whether a token is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn has_token(&self) -> Result<bool, LocalStateError> {
        Ok(self.session.get::<String>(keys::TOKEN).await?.is_some())
    }

    /// Store both tokens returned by sign-in.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_credentials(
        &self,
        token: &str,
        refresh_token: &str,
    ) -> Result<(), LocalStateError> {
        // A fresh id on sign-in keeps a pre-login cookie from carrying over.
        self.session.cycle_id().await?;
        self.session.insert(keys::TOKEN, token).await?;
        self.session.insert(keys::REFRESH_TOKEN, refresh_token).await?;
        Ok(())
    }

    /// The cart; empty when nothing is stored or the stored value is unreadable.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn get_cart(&self) -> Result<Cart, LocalStateError> {
        Ok(self.get_lenient(keys::CART).await?.unwrap_or_default())
    }

    /// Replace the stored cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_cart(&self, cart: &Cart) -> Result<(), LocalStateError> {
        self.session.insert(keys::CART, cart).await?;
        Ok(())
    }

    /// Drop the stored cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn clear_cart(&self) -> Result<(), LocalStateError> {
        self.session.remove_value(keys::CART).await?;
        Ok(())
    }

    /// The cached-profile slot.
    #[must_use]
    pub const fn user_store(&self) -> UserStore<'_> {
        UserStore {
            session: &self.session,
        }
    }

    /// Category picker state; a fresh picker when nothing usable is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn category_picker(&self) -> Result<CategoryPicker, LocalStateError> {
        Ok(self
            .get_lenient(keys::CATEGORY_PICKER)
            .await?
            .unwrap_or_default())
    }

    /// Persist category picker state.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_category_picker(
        &self,
        picker: &CategoryPicker,
    ) -> Result<(), LocalStateError> {
        self.session.insert(keys::CATEGORY_PICKER, picker).await?;
        Ok(())
    }

    /// Wallets last listed for the payment select, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn cached_wallets(&self) -> Result<Option<Vec<WalletInfo>>, LocalStateError> {
        self.get_lenient(keys::WALLETS).await
    }

    /// Remember the wallets shown in the payment select.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_cached_wallets(&self, wallets: &[WalletInfo]) -> Result<(), LocalStateError> {
        self.session.insert(keys::WALLETS, wallets).await?;
        Ok(())
    }

    /// Id of the visitor's session; `None` until it is first saved.
    #[must_use]
    pub fn session_id(&self) -> Option<Id> {
        self.session.id()
    }

    /// Remove every persisted key.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn logout(&self) -> Result<(), LocalStateError> {
        for key in keys::ALL {
            self.session.remove_value(key).await?;
        }
        tracing::debug!("Local state cleared");
        Ok(())
    }

    /// Read `key`, treating a value that no longer deserializes as absent.
    async fn get_lenient<T: DeserializeOwned>(
        &self,
        key: &'static str,
    ) -> Result<Option<T>, LocalStateError> {
        match self.session.get::<T>(key).await {
            Ok(value) => Ok(value),
            Err(tower_sessions::session::Error::SerdeJson(e)) => {
                tracing::warn!(key, error = %e, "Ignoring unreadable session value");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// UserStore
// =============================================================================

/// A single per-visitor slot holding the signed-in user's profile.
///
/// The value is always replaced whole.
pub struct UserStore<'a> {
    session: &'a Session,
}

impl UserStore<'_> {
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn get(&self) -> Result<Option<UserProfile>, LocalStateError> {
        match self.session.get::<UserProfile>(keys::USER_PROFILE).await {
            Ok(user) => Ok(user),
            Err(tower_sessions::session::Error::SerdeJson(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set(&self, user: &UserProfile) -> Result<(), LocalStateError> {
        self.session.insert(keys::USER_PROFILE, user).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn clear(&self) -> Result<(), LocalStateError> {
        self.session.remove_value(keys::USER_PROFILE).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use market_stall_core::{Price, Product, ProductId};
    use rust_decimal::Decimal;
    use tower_sessions::MemoryStore;

    fn local_state() -> LocalState {
        LocalState::from_session(Session::new(None, Arc::new(MemoryStore::default()), None))
    }

    fn jwt(payload: &str) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.signature",
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    fn product(id: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: "Mango".to_string(),
            description: None,
            price: Price::new(Decimal::new(150, 2)),
            amount: 3,
            img_url: None,
            sale_open_date: None,
            sale_close_date: None,
        }
    }

    fn wallet() -> WalletInfo {
        serde_json::from_str(
            r#"{"id": 3, "name": "Main", "user_id": 7, "value": 100}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_user_id_reads_numeric_claim() {
        let credentials = Credentials::new(jwt(r#"{"id":42,"exp":1}"#));
        assert_eq!(credentials.user_id().unwrap(), UserId::new(42));
    }

    #[test]
    fn test_user_id_reads_string_claim() {
        let credentials = Credentials::new(jwt(r#"{"id":"7"}"#));
        assert_eq!(credentials.user_id().unwrap(), UserId::new(7));
    }

    #[test]
    fn test_user_id_rejects_bad_tokens() {
        assert!(matches!(
            Credentials::new("opaque").user_id(),
            Err(TokenError::Malformed)
        ));
        assert!(matches!(
            Credentials::new(jwt(r#"{"sub":"x"}"#)).user_id(),
            Err(TokenError::MissingId)
        ));
        assert!(matches!(
            Credentials::new("a.!!!.c").user_id(),
            Err(TokenError::Base64(_))
        ));
    }

    #[test]
    fn test_credentials_debug_hides_token() {
        let credentials = Credentials::new("very-secret-token");
        assert!(!format!("{credentials:?}").contains("very-secret-token"));
        assert_eq!(
            credentials.authorization().unwrap(),
            "Bearer very-secret-token"
        );
    }

    #[tokio::test]
    async fn test_get_token_missing_is_not_found() {
        let local = local_state();
        assert!(matches!(
            local.get_token().await,
            Err(LocalStateError::NotFound("token"))
        ));
        assert!(!local.has_token().await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_cart_is_empty() {
        let local = local_state();
        assert!(local.get_cart().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_cart_is_empty() {
        let local = local_state();
        local.session.insert(keys::CART, "not a cart").await.unwrap();
        assert!(local.get_cart().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_every_key() {
        let local = local_state();
        local.set_credentials("t", "r").await.unwrap();
        let mut cart = Cart::new();
        cart.add(&product(1));
        local.set_cart(&cart).await.unwrap();
        local
            .set_category_picker(&CategoryPicker::default())
            .await
            .unwrap();
        local.set_cached_wallets(&[wallet()]).await.unwrap();

        local.logout().await.unwrap();

        assert!(!local.has_token().await.unwrap());
        assert!(local.get_cart().await.unwrap().is_empty());
        assert!(local.user_store().get().await.unwrap().is_none());
        for key in keys::ALL {
            assert!(local.session.get_value(key).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_cached_wallets_round_trip() {
        let local = local_state();
        assert_eq!(local.cached_wallets().await.unwrap(), None);

        local.set_cached_wallets(&[wallet()]).await.unwrap();
        assert_eq!(local.cached_wallets().await.unwrap(), Some(vec![wallet()]));
    }

    #[tokio::test]
    async fn test_user_store_set_and_clear() {
        let local = local_state();
        let user: UserProfile =
            serde_json::from_str(r#"{"id": 1, "username": "shopper"}"#).unwrap();

        local.user_store().set(&user).await.unwrap();
        assert_eq!(local.user_store().get().await.unwrap(), Some(user));

        local.user_store().clear().await.unwrap();
        assert_eq!(local.user_store().get().await.unwrap(), None);
    }
}
