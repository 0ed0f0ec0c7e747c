//! Password reset token repository.
//!
//! Tokens are single use and expire after an hour. An expired token is
//! deleted in the same transaction that discovers it has expired.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use akaar_core::{Email, UserId};

use super::RepositoryError;

/// Result of looking a token up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// Token exists and has not expired.
    Valid { email: String },
    /// No such token.
    Invalid,
    /// Token existed but had expired; it has now been deleted.
    Expired,
}

/// Result of redeeming a token for a new password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Password updated and token consumed.
    Reset(UserId),
    InvalidToken,
    Expired,
    /// Token is valid but the account it was issued for is gone.
    UserNotFound,
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    email: String,
    expires: DateTime<Utc>,
}

/// Repository for password reset tokens.
pub struct PasswordResetRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PasswordResetRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Replace any outstanding tokens for `email` with a fresh one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn replace_for_email(
        &self,
        email: &Email,
        token: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM storefront.password_reset_tokens WHERE email = $1")
            .bind(email)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO storefront.password_reset_tokens (token, email, expires) VALUES ($1, $2, $3)",
        )
        .bind(token)
        .bind(email)
        .bind(expires)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Check a token without consuming it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn check(&self, token: &str, now: DateTime<Utc>) -> Result<TokenStatus, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TokenRow>(
            "SELECT email, expires FROM storefront.password_reset_tokens WHERE token = $1 FOR UPDATE",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(TokenStatus::Invalid);
        };

        if row.expires < now {
            sqlx::query("DELETE FROM storefront.password_reset_tokens WHERE token = $1")
                .bind(token)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(TokenStatus::Expired);
        }

        tx.commit().await?;
        Ok(TokenStatus::Valid { email: row.email })
    }

    /// Redeem a token: set the account's password hash and delete the token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn reset_password(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<ResetOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TokenRow>(
            "SELECT email, expires FROM storefront.password_reset_tokens WHERE token = $1 FOR UPDATE",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(ResetOutcome::InvalidToken);
        };

        if row.expires < now {
            sqlx::query("DELETE FROM storefront.password_reset_tokens WHERE token = $1")
                .bind(token)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(ResetOutcome::Expired);
        }

        let user_id: Option<UserId> = sqlx::query_scalar(
            r"
            UPDATE storefront.users
            SET password_hash = $2, updated_at = now()
            WHERE email = $1
            RETURNING id
            ",
        )
        .bind(&row.email)
        .bind(password_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            return Ok(ResetOutcome::UserNotFound);
        };

        sqlx::query("DELETE FROM storefront.password_reset_tokens WHERE token = $1")
            .bind(token)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ResetOutcome::Reset(user_id))
    }
}
