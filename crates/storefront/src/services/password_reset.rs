//! Forgotten-password flow: issue a token, check it, redeem it.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use thiserror::Error;

use akaar_core::Email;

use super::auth::{self, AuthError};
use super::email::Notifier;
use super::identifiers;
use crate::db::{PasswordResetRepository, RepositoryError, ResetOutcome, TokenStatus, UserRepository};

/// How long a reset link stays valid.
pub const TOKEN_TTL: Duration = Duration::hours(1);

#[derive(Debug, Error)]
pub enum PasswordResetError {
    #[error("{0}")]
    WeakPassword(String),

    #[error("Invalid reset token")]
    InvalidToken,

    #[error("Reset token has expired")]
    ExpiredToken,

    #[error("User not found")]
    UserNotFound,

    #[error("password hashing failed")]
    Hash,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Link emailed to the user.
#[must_use]
pub fn reset_url(base_url: &str, token: &str) -> String {
    format!(
        "{}/auth/reset-password?token={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(token)
    )
}

/// Password reset operations.
pub struct PasswordResetService<'a> {
    users: UserRepository<'a>,
    tokens: PasswordResetRepository<'a>,
    notifier: &'a Notifier,
    base_url: &'a str,
}

impl<'a> PasswordResetService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, notifier: &'a Notifier, base_url: &'a str) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: PasswordResetRepository::new(pool),
            notifier,
            base_url,
        }
    }

    /// Issue a reset token if the email belongs to an account.
    ///
    /// Succeeds the same way whether or not the account exists, so callers
    /// cannot use it to discover registered emails.
    ///
    /// # Errors
    ///
    /// Returns `PasswordResetError::Repository` if a query fails.
    pub async fn request_reset(&self, email: &str) -> Result<(), PasswordResetError> {
        let Ok(email) = Email::parse(email) else {
            tracing::debug!("Password reset requested for malformed email");
            return Ok(());
        };

        let Some(user) = self.users.get_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = identifiers::reset_token();
        self.tokens
            .replace_for_email(&email, &token, Utc::now() + TOKEN_TTL)
            .await?;

        tracing::info!(user_id = %user.id, "Password reset token issued");

        self.notifier
            .password_reset(
                email.as_str(),
                user.name.as_deref(),
                &reset_url(self.base_url, &token),
            )
            .await;

        Ok(())
    }

    /// Check a token without consuming it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` or `ExpiredToken`; an expired token is deleted.
    pub async fn check(&self, token: &str) -> Result<(), PasswordResetError> {
        match self.tokens.check(token, Utc::now()).await? {
            TokenStatus::Valid { .. } => Ok(()),
            TokenStatus::Invalid => Err(PasswordResetError::InvalidToken),
            TokenStatus::Expired => Err(PasswordResetError::ExpiredToken),
        }
    }

    /// Set a new password using a token, consuming the token.
    ///
    /// # Errors
    ///
    /// Returns `WeakPassword` before touching the database, then
    /// `InvalidToken`, `ExpiredToken` or `UserNotFound`.
    pub async fn reset(&self, token: &str, password: &str) -> Result<(), PasswordResetError> {
        auth::validate_password(password).map_err(|e| match e {
            AuthError::WeakPassword(msg) => PasswordResetError::WeakPassword(msg),
            _ => PasswordResetError::Hash,
        })?;
        let password_hash = auth::hash_password(password).map_err(|_| PasswordResetError::Hash)?;

        match self
            .tokens
            .reset_password(token, &password_hash, Utc::now())
            .await?
        {
            ResetOutcome::Reset(user_id) => {
                tracing::info!(user_id = %user_id, "Password reset completed");
                Ok(())
            }
            ResetOutcome::InvalidToken => Err(PasswordResetError::InvalidToken),
            ResetOutcome::Expired => Err(PasswordResetError::ExpiredToken),
            ResetOutcome::UserNotFound => Err(PasswordResetError::UserNotFound),
        }
    }
}
