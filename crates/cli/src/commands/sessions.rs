//! Session store maintenance.

use tower_sessions::session_store::ExpiredDeletion;

use market_stall_storefront::db;

use super::CommandError;

/// Delete every session whose expiry has passed.
pub async fn purge() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    tracing::info!("Deleting expired sessions...");
    db::session_store(&pool).delete_expired().await?;

    tracing::info!("Expired sessions deleted");
    Ok(())
}
