//! Products and product categories.

use serde::de::IgnoredAny;
use tracing::instrument;

use market_stall_core::{NewProduct, Paginated, Product, ProductCategory};

use super::{ApiClient, ApiError, RequestOptions};
use crate::session::Credentials;

/// `GET products?page=N`.
///
/// # Errors
///
/// Returns `ApiError` on any failed call.
#[instrument(skip(client, credentials))]
pub async fn list(
    client: &ApiClient,
    credentials: &Credentials,
    page: u32,
) -> Result<Paginated<Vec<Product>>, ApiError> {
    client
        .request(
            &format!("products?page={page}"),
            RequestOptions::get().bearer(credentials),
        )
        .await
}

/// `GET products/categories?page=N&pageSize=M`.
///
/// # Errors
///
/// Returns `ApiError` on any failed call.
#[instrument(skip(client, credentials))]
pub async fn categories(
    client: &ApiClient,
    credentials: &Credentials,
    page: u32,
    page_size: u32,
) -> Result<Paginated<Vec<ProductCategory>>, ApiError> {
    client
        .request(
            &format!("products/categories?page={page}&pageSize={page_size}"),
            RequestOptions::get().bearer(credentials),
        )
        .await
}

/// `POST products`.
///
/// # Errors
///
/// Returns `ApiError` on any failed call.
#[instrument(skip(client, credentials, product), fields(name = %product.name))]
pub async fn create(
    client: &ApiClient,
    credentials: &Credentials,
    product: &NewProduct,
) -> Result<(), ApiError> {
    client
        .request::<IgnoredAny>("products", RequestOptions::post(product)?.bearer(credentials))
        .await?;
    Ok(())
}
