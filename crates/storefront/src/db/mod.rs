//! Session database for the storefront.
//!
//! # Database: `SQLite`
//!
//! The storefront keeps no business data of its own; the REST backend owns
//! products, orders, wallets and users. The only local table is the
//! tower-sessions store that holds each visitor's token, cart and cached
//! profile.
//!
//! # Migrations
//!
//! The session table is created with:
//! ```bash
//! cargo run -p market-stall-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower_sessions_sqlx_store::SqliteStore;

/// Create a `SQLite` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Session store over `pool`.
#[must_use]
pub fn session_store(pool: &SqlitePool) -> SqliteStore {
    SqliteStore::new(pool.clone())
}

/// Create the session table if it does not exist yet.
///
/// # Errors
///
/// Returns `sqlx::Error` if the table cannot be created.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    session_store(pool).migrate().await
}
