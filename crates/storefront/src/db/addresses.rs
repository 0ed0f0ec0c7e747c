//! Saved address repository.
//!
//! Every query is scoped by `user_id`, so a caller can never read or touch
//! another customer's address. Switching the default address clears the
//! previous default inside the same transaction as the write, with the
//! user's row locked so concurrent default switches run one after another.

use sqlx::{PgConnection, PgPool};

use akaar_core::{AddressId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Address, AddressInput};

const ADDRESS_COLUMNS: &str = r"
    id, user_id, label, address_type, first_name, last_name, address, apartment,
    city, state, zip, country, phone, is_default, created_at, updated_at
";

/// Clear the default flag on every address of `user_id` except `keep`.
async fn clear_defaults(
    conn: &mut PgConnection,
    user_id: UserId,
    keep: Option<AddressId>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        UPDATE storefront.addresses
        SET is_default = false, updated_at = now()
        WHERE user_id = $1 AND is_default AND ($2::uuid IS NULL OR id <> $2)
        ",
    )
    .bind(user_id)
    .bind(keep)
    .execute(conn)
    .await?;
    Ok(())
}

/// Lock the owning user row for the rest of the transaction.
async fn lock_user(conn: &mut PgConnection, user_id: UserId) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1 FROM storefront.users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

const DEFAULT_ADDRESS: &str = "A default address";

/// Repository for a customer's saved addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's addresses, default first, then newest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS} FROM storefront.addresses
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(addresses)
    }

    /// Fetch an address only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: AddressId,
        user_id: UserId,
    ) -> Result<Option<Address>, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.addresses WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(address)
    }

    /// Create an address, clearing any previous default first when the new
    /// one is marked default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another default slipped in
    /// despite the lock, or `RepositoryError::Database` if the transaction
    /// fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            lock_user(&mut *tx, user_id).await?;
            clear_defaults(&mut *tx, user_id, None).await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            r"
            INSERT INTO storefront.addresses (
                user_id, label, address_type, first_name, last_name, address, apartment,
                city, state, zip, country, phone, is_default
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(input.label.as_deref())
        .bind(&input.address_type)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.address)
        .bind(input.apartment.as_deref())
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.zip)
        .bind(&input.country)
        .bind(input.phone.as_deref())
        .bind(input.is_default)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, DEFAULT_ADDRESS))?;

        tx.commit().await?;

        Ok(address)
    }

    /// Replace an owned address's fields.
    ///
    /// Returns `Ok(None)` if the address does not exist or belongs to someone
    /// else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another default slipped in
    /// despite the lock, or `RepositoryError::Database` if the transaction
    /// fails.
    pub async fn update(
        &self,
        id: AddressId,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Option<Address>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            lock_user(&mut *tx, user_id).await?;
        }

        let owned: Option<AddressId> = sqlx::query_scalar(
            "SELECT id FROM storefront.addresses WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if owned.is_none() {
            return Ok(None);
        }

        if input.is_default {
            clear_defaults(&mut *tx, user_id, Some(id)).await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            r"
            UPDATE storefront.addresses
            SET label = $3, address_type = $4, first_name = $5, last_name = $6,
                address = $7, apartment = $8, city = $9, state = $10, zip = $11,
                country = $12, phone = $13, is_default = $14, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(id)
        .bind(user_id)
        .bind(input.label.as_deref())
        .bind(&input.address_type)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.address)
        .bind(input.apartment.as_deref())
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.zip)
        .bind(&input.country)
        .bind(input.phone.as_deref())
        .bind(input.is_default)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, DEFAULT_ADDRESS))?;

        tx.commit().await?;

        Ok(Some(address))
    }

    /// Delete an owned address. Returns `false` if nothing was deleted.
    ///
    /// Deleting the default address leaves the user with no default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: AddressId, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
