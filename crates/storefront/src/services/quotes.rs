//! Custom manufacturing quote intake.

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use akaar_core::{Email, UserId};

use super::email::Notifier;
use super::identifiers;
use super::storage::is_upload_key;
use crate::db::{QuoteRepository, RepositoryError};
use crate::models::{NewQuote, NewQuoteFile, QuoteRequest};

/// Errors from quote submission.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Quantity must be a positive integer")]
    InvalidQuantity,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid file reference")]
    InvalidFileKey,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A file already uploaded to S3 and referenced by the quote.
///
/// The bucket is never taken from the client; files always live in the
/// configured upload bucket.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteFileInput {
    pub original_filename: String,
    pub s3_key: String,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub file_type: String,
}

/// Body of `POST /api/quotes`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    /// JSON number or numeric string.
    #[serde(default)]
    pub quantity: Option<serde_json::Value>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub files: Vec<QuoteFileInput>,
}

fn required(value: Option<String>) -> Result<String, QuoteError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(QuoteError::MissingFields)
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a quantity from a JSON number or string.
///
/// `Ok(None)` means the field was effectively absent (null, empty or zero).
fn parse_quantity(value: Option<&serde_json::Value>) -> Result<Option<i32>, QuoteError> {
    let parsed = match value {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(0) => Ok(None),
        Some(n) if n > 0 => i32::try_from(n)
            .map(Some)
            .map_err(|_| QuoteError::InvalidQuantity),
        _ => Err(QuoteError::InvalidQuantity),
    }
}

/// Last path segment of an object key, or `fallback` when there is none.
fn stored_filename(s3_key: &str, fallback: &str) -> String {
    s3_key
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

impl QuoteSubmission {
    /// Validate the submission and build an insertable quote.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::MissingFields` if name, email, service, material
    /// or quantity is absent, `QuoteError::InvalidQuantity` for a quantity
    /// that is not a positive integer, and `QuoteError::InvalidEmail` for a
    /// malformed email, and `QuoteError::InvalidFileKey` for a file key
    /// that was not issued by the upload endpoint.
    pub fn into_new_quote(
        self,
        quote_number: String,
        user_id: Option<UserId>,
        upload_bucket: &str,
    ) -> Result<NewQuote, QuoteError> {
        let name = required(self.name)?;
        let email = required(self.email)?;
        let service = required(self.service)?;
        let material = required(self.material)?;
        let quantity = parse_quantity(self.quantity.as_ref())?.ok_or(QuoteError::MissingFields)?;

        let email = Email::parse(&email).map_err(|_| QuoteError::InvalidEmail)?;

        if self.files.iter().any(|file| !is_upload_key(&file.s3_key)) {
            return Err(QuoteError::InvalidFileKey);
        }

        let files = self
            .files
            .into_iter()
            .map(|file| NewQuoteFile {
                stored_filename: stored_filename(&file.s3_key, &file.original_filename),
                s3_bucket: upload_bucket.to_string(),
                original_filename: file.original_filename,
                s3_key: file.s3_key,
                file_size: file.file_size,
                file_type: file.file_type,
            })
            .collect();

        Ok(NewQuote {
            quote_number,
            user_id,
            name,
            email,
            company: optional(self.company),
            phone: optional(self.phone),
            service,
            material,
            quantity,
            notes: optional(self.notes),
            files,
        })
    }
}

/// Quote request operations.
pub struct QuoteService<'a> {
    quotes: QuoteRepository<'a>,
    notifier: &'a Notifier,
    upload_bucket: &'a str,
}

impl<'a> QuoteService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, notifier: &'a Notifier, upload_bucket: &'a str) -> Self {
        Self {
            quotes: QuoteRepository::new(pool),
            notifier,
            upload_bucket,
        }
    }

    /// Validate and store a quote request, then acknowledge it by email.
    ///
    /// # Errors
    ///
    /// Returns a validation error before anything is written, or
    /// `QuoteError::Repository` if the insert fails.
    pub async fn submit(
        &self,
        submission: QuoteSubmission,
        user_id: Option<UserId>,
    ) -> Result<QuoteRequest, QuoteError> {
        let new_quote =
            submission.into_new_quote(identifiers::quote_number(), user_id, self.upload_bucket)?;

        let quote = self.quotes.create_with_files(&new_quote).await?;

        tracing::info!(
            quote_number = %quote.quote_number,
            files = quote.files.len(),
            "Quote request submitted"
        );

        self.notifier.quote_received(&quote).await;

        Ok(quote)
    }

    /// A user's quote requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::Repository` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<QuoteRequest>, QuoteError> {
        Ok(self.quotes.list_for_user(user_id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn submission(value: serde_json::Value) -> QuoteSubmission {
        serde_json::from_value(value).unwrap()
    }

    fn complete() -> serde_json::Value {
        json!({
            "name": "Ravi Kumar",
            "email": "ravi@example.com",
            "service": "FDM Printing",
            "material": "PETG",
            "quantity": "25",
            "files": [
                {
                    "originalFilename": "bracket v2.stl",
                    "s3Key": "quotes/uploads/abc/1700000000000-bracket_v2.stl",
                    "fileSize": 4096,
                    "fileType": "model/stl"
                },
                {
                    "originalFilename": "drawing.pdf",
                    "s3Key": "quotes/uploads/def/1700000000001-drawing.pdf",
                    "s3Bucket": "other-bucket",
                    "fileSize": 512,
                    "fileType": "application/pdf"
                }
            ]
        })
    }

    #[test]
    fn test_into_new_quote() {
        let quote = submission(complete())
            .into_new_quote("QT-ABCDEFGHIJ".to_string(), None, "akaar-uploads")
            .unwrap();

        assert_eq!(quote.quantity, 25);
        assert_eq!(quote.email.as_str(), "ravi@example.com");
        assert_eq!(quote.files.len(), 2);
        assert_eq!(quote.files[0].stored_filename, "1700000000000-bracket_v2.stl");
        assert_eq!(quote.files[0].s3_bucket, "akaar-uploads");
        assert_eq!(quote.files[1].stored_filename, "1700000000001-drawing.pdf");
        assert_eq!(quote.files[1].s3_bucket, "akaar-uploads");
    }

    #[test]
    fn test_foreign_file_keys_rejected() {
        for key in [
            "invoices/2024/inv-001.pdf",
            "quotes/uploads/../../invoices/inv-001.pdf",
            "",
        ] {
            let mut value = complete();
            value["files"][0]["s3Key"] = json!(key);
            assert!(
                matches!(
                    submission(value).into_new_quote(String::new(), None, "akaar-uploads"),
                    Err(QuoteError::InvalidFileKey)
                ),
                "{key:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_stored_filename() {
        assert_eq!(
            stored_filename("quotes/uploads/abc/1700000000000-gear.stl", "gear.stl"),
            "1700000000000-gear.stl"
        );
        assert_eq!(stored_filename("quotes/uploads/abc/", "gear.stl"), "gear.stl");
    }

    #[test]
    fn test_missing_fields() {
        for field in ["name", "email", "service", "material", "quantity"] {
            let mut value = complete();
            value.as_object_mut().unwrap().remove(field);
            let result = submission(value).into_new_quote(String::new(), None, "b");
            assert!(
                matches!(result, Err(QuoteError::MissingFields)),
                "missing {field} should be rejected"
            );
        }
    }

    #[test]
    fn test_zero_quantity_counts_as_missing() {
        let mut value = complete();
        value["quantity"] = json!(0);
        assert!(matches!(
            submission(value).into_new_quote(String::new(), None, "b"),
            Err(QuoteError::MissingFields)
        ));
    }

    #[test]
    fn test_invalid_quantity() {
        for quantity in [json!(-3), json!(2.5), json!("many"), json!(true)] {
            let mut value = complete();
            value["quantity"] = quantity;
            assert!(matches!(
                submission(value).into_new_quote(String::new(), None, "b"),
                Err(QuoteError::InvalidQuantity)
            ));
        }
    }

    #[test]
    fn test_invalid_email() {
        let mut value = complete();
        value["email"] = json!("ravi-at-example");
        assert!(matches!(
            submission(value).into_new_quote(String::new(), None, "b"),
            Err(QuoteError::InvalidEmail)
        ));
    }
}
