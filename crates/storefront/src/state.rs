//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::razorpay::{RazorpayClient, RazorpayError};
use crate::services::email::{EmailError, EmailService, Notifier};
use crate::services::storage::StorageService;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("razorpay client: {0}")]
    Razorpay(#[from] RazorpayError),
    #[error("email: {0}")]
    Email(#[from] EmailError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    razorpay: RazorpayClient,
    storage: StorageService,
    notifier: Notifier,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the Razorpay HTTP client or the SMTP transport
    /// cannot be built.
    pub async fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let razorpay = RazorpayClient::new(&config.razorpay)?;
        let storage = StorageService::from_config(&config.storage).await;

        let email = config
            .email
            .as_ref()
            .map(|email| EmailService::new(email, &config.base_url))
            .transpose()?;
        if email.is_none() {
            tracing::warn!("SMTP not configured, transactional email disabled");
        }

        Ok(Self::from_parts(
            config,
            pool,
            razorpay,
            storage,
            Notifier::new(email),
        ))
    }

    /// Assemble state from already-built parts.
    #[must_use]
    pub fn from_parts(
        config: StorefrontConfig,
        pool: PgPool,
        razorpay: RazorpayClient,
        storage: StorageService,
        notifier: Notifier,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                razorpay,
                storage,
                notifier,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Razorpay client.
    #[must_use]
    pub fn razorpay(&self) -> &RazorpayClient {
        &self.inner.razorpay
    }

    /// Get a reference to the S3 presigner.
    #[must_use]
    pub fn storage(&self) -> &StorageService {
        &self.inner.storage
    }

    /// Get a reference to the email notifier.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }
}
