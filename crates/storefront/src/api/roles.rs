//! Roles.

use tracing::instrument;

use market_stall_core::{Paginated, RoleInfo};

use super::{ApiClient, ApiError, RequestOptions};
use crate::session::Credentials;

/// `GET role_infos`.
///
/// # Errors
///
/// Returns `ApiError` on any failed call.
#[instrument(skip(client, credentials))]
pub async fn list(
    client: &ApiClient,
    credentials: &Credentials,
) -> Result<Paginated<Vec<RoleInfo>>, ApiError> {
    client
        .request("role_infos", RequestOptions::get().bearer(credentials))
        .await
}
