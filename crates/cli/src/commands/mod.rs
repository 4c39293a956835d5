//! CLI command implementations.

use secrecy::SecretString;
use sqlx::SqlitePool;
use thiserror::Error;

use market_stall_storefront::config::DEFAULT_SESSION_DB;
use market_stall_storefront::db;

pub mod migrate;
pub mod sessions;

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session store error: {0}")]
    SessionStore(#[from] tower_sessions::session_store::Error),
}

/// Connect to `STOREFRONT_SESSION_DB`, or the default `SQLite` file.
async fn connect() -> Result<SqlitePool, CommandError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("STOREFRONT_SESSION_DB")
        .unwrap_or_else(|_| DEFAULT_SESSION_DB.to_string());

    tracing::info!("Connecting to session database...");
    Ok(db::create_pool(&SecretString::from(url)).await?)
}
