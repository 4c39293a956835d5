//! Users: the signed-in profile and back-office administration.

use serde::Deserialize;
use serde::de::IgnoredAny;
use tracing::instrument;

use market_stall_core::{ApiResponse, Paginated, UserForm, UserId, UserProfile};

use super::{ApiClient, ApiError, RequestOptions};
use crate::session::Credentials;

/// `data` of `GET users/{id}`.
#[derive(Debug, Deserialize)]
pub struct UserEnvelope {
    pub user: UserProfile,
}

/// `GET users/info`, the signed-in user.
///
/// # Errors
///
/// Returns `ApiError` on any failed call.
#[instrument(skip(client, credentials))]
pub async fn info(
    client: &ApiClient,
    credentials: &Credentials,
) -> Result<ApiResponse<UserProfile>, ApiError> {
    client
        .request("users/info", RequestOptions::get().bearer(credentials))
        .await
}

/// `GET users?page=N`.
///
/// # Errors
///
/// Returns `ApiError` on any failed call.
#[instrument(skip(client, credentials))]
pub async fn list(
    client: &ApiClient,
    credentials: &Credentials,
    page: u32,
) -> Result<Paginated<Vec<UserProfile>>, ApiError> {
    client
        .request(
            &format!("users?page={page}"),
            RequestOptions::get().bearer(credentials),
        )
        .await
}

/// `GET users/{id}`.
///
/// # Errors
///
/// Returns `ApiError` on any failed call.
#[instrument(skip(client, credentials))]
pub async fn get(
    client: &ApiClient,
    credentials: &Credentials,
    user_id: UserId,
) -> Result<ApiResponse<UserEnvelope>, ApiError> {
    client
        .request(
            &format!("users/{user_id}"),
            RequestOptions::get().bearer(credentials),
        )
        .await
}

/// `POST users`.
///
/// # Errors
///
/// Returns `ApiError` on any failed call.
#[instrument(skip(client, credentials, form), fields(username = %form.username))]
pub async fn create(
    client: &ApiClient,
    credentials: &Credentials,
    form: &UserForm,
) -> Result<(), ApiError> {
    client
        .request::<IgnoredAny>("users", RequestOptions::post(form)?.bearer(credentials))
        .await?;
    Ok(())
}

/// `PUT users/{id}`.
///
/// # Errors
///
/// Returns `ApiError` on any failed call.
#[instrument(skip(client, credentials, form), fields(username = %form.username))]
pub async fn update(
    client: &ApiClient,
    credentials: &Credentials,
    user_id: UserId,
    form: &UserForm,
) -> Result<(), ApiError> {
    client
        .request::<IgnoredAny>(
            &format!("users/{user_id}"),
            RequestOptions::put(form)?.bearer(credentials),
        )
        .await?;
    Ok(())
}
