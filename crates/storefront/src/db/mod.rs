//! Database operations for the Café Amka `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `categories`, `menu_items` - The menu (option groups stored as JSONB)
//! - `users`, `user_passwords`, `profiles` - Customers
//! - `wallets`, `transactions` - Stored value, loyalty points and their ledger
//! - `orders`, `order_items` - Placed orders
//! - `reservations` - Table bookings
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p cafe-amka-cli -- migrate
//! ```

pub mod menu;
pub mod orders;
pub mod profiles;
pub mod reservations;
pub mod transactions;
pub mod users;
pub mod wallets;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use menu::MenuRepository;
pub use orders::OrderRepository;
pub use profiles::ProfileRepository;
pub use reservations::ReservationRepository;
pub use transactions::TransactionRepository;
pub use users::UserRepository;
pub use wallets::WalletRepository;

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Turn a unique-constraint violation into [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}

/// Convert a count stored as `INTEGER` into the `u32` used by the domain.
pub(crate) fn to_u32(value: i32, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative {column}: {value}")))
}

/// Convert a domain count into the `INTEGER` used by the database.
pub(crate) fn to_i32(value: u32, column: &str) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("{column} out of range: {value}")))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
