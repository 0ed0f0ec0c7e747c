//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! akaar migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Storefront migrations live in `crates/storefront/migrations/`. The
//! session table is owned by `tower-sessions-sqlx-store` and is created
//! through its own `migrate` call after the schema migrations.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or any migration fails to apply.
pub async fn storefront() -> Result<(), MigrationError> {
    let database_url = super::database_url().map_err(MigrationError::MissingEnvVar)?;

    tracing::info!("Connecting to storefront database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    pool.close().await;
    tracing::info!("Storefront migrations complete!");
    Ok(())
}
