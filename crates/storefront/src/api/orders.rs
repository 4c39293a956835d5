//! Order history, order detail and checkout.

use serde::de::IgnoredAny;
use tracing::instrument;

use market_stall_core::{ApiResponse, CreateOrder, OrderDetailItem, OrderId, OrderSummary, Paginated};

use super::{ApiClient, ApiError, RequestOptions};
use crate::session::Credentials;

/// `GET orders?page=N`.
///
/// # Errors
///
/// Returns `ApiError` on any failed call.
#[instrument(skip(client, credentials))]
pub async fn history(
    client: &ApiClient,
    credentials: &Credentials,
    page: u32,
) -> Result<Paginated<Vec<OrderSummary>>, ApiError> {
    client
        .request(
            &format!("orders?page={page}"),
            RequestOptions::get().bearer(credentials),
        )
        .await
}

/// `GET orders/{id}`.
///
/// # Errors
///
/// Returns `ApiError` on any failed call.
#[instrument(skip(client, credentials))]
pub async fn detail(
    client: &ApiClient,
    credentials: &Credentials,
    order_id: OrderId,
) -> Result<ApiResponse<Vec<OrderDetailItem>>, ApiError> {
    client
        .request(
            &format!("orders/{order_id}"),
            RequestOptions::get().bearer(credentials),
        )
        .await
}

/// `POST orders`.
///
/// # Errors
///
/// Returns `ApiError` on any failed call.
#[instrument(skip(client, credentials, order), fields(wallet_id = %order.wallet_id, lines = order.orders.len()))]
pub async fn create(
    client: &ApiClient,
    credentials: &Credentials,
    order: &CreateOrder,
) -> Result<(), ApiError> {
    client
        .request::<IgnoredAny>("orders", RequestOptions::post(order)?.bearer(credentials))
        .await?;
    Ok(())
}
