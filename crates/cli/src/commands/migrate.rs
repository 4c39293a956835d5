//! Session table migration.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_SESSION_DB` - `SQLite` connection string (optional)

use market_stall_storefront::db;

use super::CommandError;

/// Create the session table if it does not exist yet.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    tracing::info!("Creating session table...");
    db::migrate(&pool).await?;

    tracing::info!("Session table ready");
    Ok(())
}
