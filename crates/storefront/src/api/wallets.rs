//! Wallets.

use serde::de::IgnoredAny;
use tracing::instrument;

use market_stall_core::{NewWallet, Paginated, WalletInfo};

use super::{ApiClient, ApiError, RequestOptions};
use crate::session::Credentials;

/// `GET wallets`.
///
/// # Errors
///
/// Returns `ApiError` on any failed call.
#[instrument(skip(client, credentials))]
pub async fn list(
    client: &ApiClient,
    credentials: &Credentials,
) -> Result<Paginated<Vec<WalletInfo>>, ApiError> {
    client
        .request("wallets", RequestOptions::get().bearer(credentials))
        .await
}

/// `POST wallets`.
///
/// # Errors
///
/// Returns `ApiError` on any failed call.
#[instrument(skip(client, credentials, wallet), fields(name = %wallet.name, user_id = %wallet.user_id))]
pub async fn create(
    client: &ApiClient,
    credentials: &Credentials,
    wallet: &NewWallet,
) -> Result<(), ApiError> {
    client
        .request::<IgnoredAny>("wallets", RequestOptions::post(wallet)?.bearer(credentials))
        .await?;
    Ok(())
}
