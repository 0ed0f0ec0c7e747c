//! Custom manufacturing quote requests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use akaar_core::{Email, QuoteFileId, QuoteId, QuoteStatus, UserId};

/// A file reference attached to a quote; the bytes live in S3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuoteFile {
    pub id: QuoteFileId,
    pub quote_id: QuoteId,
    pub original_filename: String,
    pub stored_filename: String,
    pub s3_key: String,
    pub s3_bucket: String,
    pub file_size: i64,
    pub file_type: String,
}

/// A quote request with its files.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub id: QuoteId,
    pub quote_number: String,
    pub user_id: Option<UserId>,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub service: String,
    pub material: String,
    pub quantity: i32,
    pub notes: Option<String>,
    pub status: QuoteStatus,
    pub quoted_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub files: Vec<QuoteFile>,
}

#[derive(Debug, FromRow)]
pub(crate) struct QuoteRow {
    pub id: QuoteId,
    pub quote_number: String,
    pub user_id: Option<UserId>,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub service: String,
    pub material: String,
    pub quantity: i32,
    pub notes: Option<String>,
    pub status: QuoteStatus,
    pub quoted_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl QuoteRequest {
    /// Find one of this quote's files.
    #[must_use]
    pub fn file(&self, file_id: QuoteFileId) -> Option<&QuoteFile> {
        self.files.iter().find(|f| f.id == file_id)
    }
}

impl QuoteRow {
    pub(crate) fn with_files(self, files: Vec<QuoteFile>) -> QuoteRequest {
        QuoteRequest {
            id: self.id,
            quote_number: self.quote_number,
            user_id: self.user_id,
            name: self.name,
            email: self.email,
            company: self.company,
            phone: self.phone,
            service: self.service,
            material: self.material,
            quantity: self.quantity,
            notes: self.notes,
            status: self.status,
            quoted_price: self.quoted_price,
            created_at: self.created_at,
            files,
        }
    }
}

/// A file descriptor to insert alongside a new quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuoteFile {
    pub original_filename: String,
    pub stored_filename: String,
    pub s3_key: String,
    pub s3_bucket: String,
    pub file_size: i64,
    pub file_type: String,
}

/// A validated quote submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuote {
    pub quote_number: String,
    pub user_id: Option<UserId>,
    pub name: String,
    pub email: Email,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub service: String,
    pub material: String,
    pub quantity: i32,
    pub notes: Option<String>,
    pub files: Vec<NewQuoteFile>,
}
