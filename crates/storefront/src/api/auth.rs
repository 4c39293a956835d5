//! Sign-in and sign-up. The only calls made without a bearer token.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use market_stall_core::ApiResponse;

use super::{ApiClient, ApiError, RequestOptions};

/// Tokens returned by `auth/login`.
#[derive(Deserialize)]
pub struct SignInData {
    pub token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for SignInData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInData")
            .field("token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
struct SignIn<'a> {
    username: &'a str,
    password: &'a str,
}

/// Body of `auth/register`.
#[derive(Serialize)]
pub struct SignUp {
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SignUp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUp")
            .field("username", &self.username)
            .field("fullname", &self.fullname)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// `POST auth/login`.
///
/// # Errors
///
/// Returns `ApiError` if the backend rejects the credentials or is unreachable.
#[instrument(skip(client, password))]
pub async fn sign_in(
    client: &ApiClient,
    username: &str,
    password: &str,
) -> Result<ApiResponse<SignInData>, ApiError> {
    client
        .request("auth/login", RequestOptions::post(&SignIn { username, password })?)
        .await
}

/// `POST auth/register`.
///
/// # Errors
///
/// Returns `ApiError` if the backend rejects the registration or is unreachable.
#[instrument(skip(client, payload), fields(username = %payload.username))]
pub async fn sign_up(client: &ApiClient, payload: &SignUp) -> Result<(), ApiError> {
    client
        .request::<IgnoredAny>("auth/register", RequestOptions::post(payload)?)
        .await?;
    Ok(())
}
