//! Quote request repository.

use std::collections::HashMap;

use sqlx::PgPool;

use akaar_core::{QuoteId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::quote::QuoteRow;
use crate::models::{NewQuote, QuoteFile, QuoteRequest};

const QUOTE_COLUMNS: &str = r"
    id, quote_number, user_id, name, email, company, phone, service, material,
    quantity, notes, status, quoted_price, created_at
";

const FILE_COLUMNS: &str =
    "id, quote_id, original_filename, stored_filename, s3_key, s3_bucket, file_size, file_type";

/// Repository for quote requests and their files.
pub struct QuoteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> QuoteRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a quote request and its file rows in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a quote number collision.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_files(&self, quote: &NewQuote) -> Result<QuoteRequest, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, QuoteRow>(&format!(
            r"
            INSERT INTO storefront.quote_requests (
                quote_number, user_id, name, email, company, phone,
                service, material, quantity, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {QUOTE_COLUMNS}
            "
        ))
        .bind(&quote.quote_number)
        .bind(quote.user_id)
        .bind(&quote.name)
        .bind(&quote.email)
        .bind(quote.company.as_deref())
        .bind(quote.phone.as_deref())
        .bind(&quote.service)
        .bind(&quote.material)
        .bind(quote.quantity)
        .bind(quote.notes.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "quote number"))?;

        let mut files = Vec::with_capacity(quote.files.len());
        for file in &quote.files {
            let inserted = sqlx::query_as::<_, QuoteFile>(&format!(
                r"
                INSERT INTO storefront.quote_files (
                    quote_id, original_filename, stored_filename, s3_key, s3_bucket,
                    file_size, file_type
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {FILE_COLUMNS}
                "
            ))
            .bind(row.id)
            .bind(&file.original_filename)
            .bind(&file.stored_filename)
            .bind(&file.s3_key)
            .bind(&file.s3_bucket)
            .bind(file.file_size)
            .bind(&file.file_type)
            .fetch_one(&mut *tx)
            .await?;
            files.push(inserted);
        }

        tx.commit().await?;

        Ok(row.with_files(files))
    }

    /// Get a quote request with its files.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_id(&self, id: QuoteId) -> Result<Option<QuoteRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, QuoteRow>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM storefront.quote_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_files(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// All quote requests submitted by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<QuoteRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, QuoteRow>(&format!(
            r"
            SELECT {QUOTE_COLUMNS} FROM storefront.quote_requests
            WHERE user_id = $1
            ORDER BY created_at DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_files(rows).await
    }

    async fn attach_files(&self, rows: Vec<QuoteRow>) -> Result<Vec<QuoteRequest>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<QuoteId> = rows.iter().map(|r| r.id).collect();
        let files = sqlx::query_as::<_, QuoteFile>(&format!(
            r"
            SELECT {FILE_COLUMNS} FROM storefront.quote_files
            WHERE quote_id = ANY($1)
            ORDER BY created_at, id
            "
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_quote: HashMap<QuoteId, Vec<QuoteFile>> = HashMap::new();
        for file in files {
            by_quote.entry(file.quote_id).or_default().push(file);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let files = by_quote.remove(&row.id).unwrap_or_default();
                row.with_files(files)
            })
            .collect())
    }
}

