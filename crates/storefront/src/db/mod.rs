//! Database operations for the storefront `PostgreSQL` schema.
//!
//! # Schema: `storefront`
//!
//! ## Tables
//!
//! - `users` - Customer accounts (argon2 password hashes)
//! - `password_reset_tokens` - Single-use, one-hour reset tokens
//! - `mesh_files` / `products` - Read-only catalog
//! - `orders` / `order_items` - Paid orders, written after signature verification
//! - `quote_requests` / `quote_files` - Custom manufacturing requests
//! - `addresses` - Saved shipping addresses
//! - `tower_sessions.session` - Session storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p akaar-cli -- migrate
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate compiles
//! without a live database.

pub mod addresses;
pub mod orders;
pub mod password_reset;
pub mod products;
pub mod quotes;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use orders::OrderRepository;
pub use password_reset::{PasswordResetRepository, ResetOutcome, TokenStatus};
pub use products::{ProductFilter, ProductRepository, ProductSort, SortDirection};
pub use quotes::QuoteRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
