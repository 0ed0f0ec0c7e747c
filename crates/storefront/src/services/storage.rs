//! S3 object storage for quote uploads.
//!
//! The API never proxies file bytes. Browsers upload straight to S3 with a
//! presigned PUT URL, and account pages download with a presigned GET URL.

use std::time::Duration;

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::config::StorageConfig;

/// Prefix of every key handed out by `presign_upload`.
pub const UPLOAD_PREFIX: &str = "quotes/uploads/";

/// Lifetime of every presigned URL.
pub const PRESIGN_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// Largest accepted upload (100 MiB).
pub const MAX_UPLOAD_BYTES: i64 = 100 * 1024 * 1024;

/// Extensions accepted for quote uploads: 3D models, drawings, images, archives.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    ".stl", ".obj", ".step", ".stp", ".iges", ".igs", ".3mf", ".gltf", ".glb", ".pdf", ".png",
    ".jpg", ".jpeg", ".webp", ".zip", ".rar",
];

/// Errors from upload validation and presigning.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file type not allowed: {0}")]
    UnsupportedFileType(String),

    #[error("file is empty")]
    EmptyFile,

    #[error("file exceeds the {max} byte limit")]
    TooLarge { max: i64 },

    #[error("object key outside the upload prefix: {0}")]
    ForeignKey(String),

    #[error("invalid presigning config: {0}")]
    Config(String),

    #[error("presign failed: {0}")]
    Presign(String),
}

/// A presigned upload target.
#[derive(Debug, Clone)]
pub struct PresignedUpload {
    pub upload_url: String,
    pub key: String,
    pub bucket: String,
    pub expires_in: u64,
}

/// Presigns S3 requests against the upload bucket.
#[derive(Clone)]
pub struct StorageService {
    client: Client,
    bucket: String,
}

impl StorageService {
    /// Build a client from the default AWS credential chain.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        tracing::info!(
            bucket = %config.bucket,
            region = %config.region,
            "S3 storage initialized"
        );

        Self {
            client: Client::new(&aws_config),
            bucket: config.bucket.clone(),
        }
    }

    /// Build a client with fixed credentials and no environment lookup.
    #[must_use]
    pub fn with_static_credentials(
        config: &StorageConfig,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Self {
        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "static");
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }

    /// The configured upload bucket.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn presigning_config() -> Result<PresigningConfig, StorageError> {
        PresigningConfig::expires_in(PRESIGN_EXPIRY).map_err(|e| StorageError::Config(e.to_string()))
    }

    /// Validate an upload and presign a PUT for a fresh key.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad extensions or sizes, or
    /// `StorageError::Presign` if signing fails.
    pub async fn presign_upload(
        &self,
        filename: &str,
        content_type: &str,
        file_size: i64,
    ) -> Result<PresignedUpload, StorageError> {
        validate_upload(filename, file_size)?;

        let key = upload_key(filename, Utc::now());
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .presigned(Self::presigning_config()?)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok(PresignedUpload {
            upload_url: request.uri().to_string(),
            key,
            bucket: self.bucket.clone(),
            expires_in: PRESIGN_EXPIRY.as_secs(),
        })
    }

    /// Presign a GET for an uploaded object in the configured bucket.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ForeignKey` for keys outside the upload
    /// prefix, or `StorageError::Presign` if signing fails.
    pub async fn presign_download(&self, key: &str) -> Result<String, StorageError> {
        if !is_upload_key(key) {
            return Err(StorageError::ForeignKey(key.to_string()));
        }

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(Self::presigning_config()?)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `quotes/uploads/<uuid>/<unix-millis>-<sanitized name>`.
#[must_use]
pub fn upload_key(filename: &str, now: DateTime<Utc>) -> String {
    format!(
        "quotes/uploads/{}/{}-{}",
        Uuid::new_v4(),
        now.timestamp_millis(),
        sanitize_filename(filename)
    )
}

/// Whether `key` has the shape of a key issued by `upload_key`.
///
/// Rejects anything outside `quotes/uploads/`, empty segments and
/// relative segments.
#[must_use]
pub fn is_upload_key(key: &str) -> bool {
    let Some(rest) = key.strip_prefix(UPLOAD_PREFIX) else {
        return false;
    };
    !rest.is_empty()
        && !key.contains('\\')
        && rest
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// Lower-cased extension including the dot, if any.
fn extension(filename: &str) -> Option<String> {
    filename
        .rfind('.')
        .and_then(|i| filename.get(i..))
        .map(str::to_ascii_lowercase)
}

/// Check an upload's extension and size.
///
/// # Errors
///
/// Returns `UnsupportedFileType`, `EmptyFile` or `TooLarge`.
pub fn validate_upload(filename: &str, file_size: i64) -> Result<(), StorageError> {
    let allowed = extension(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
    if !allowed {
        return Err(StorageError::UnsupportedFileType(filename.to_string()));
    }
    if file_size <= 0 {
        return Err(StorageError::EmptyFile);
    }
    if file_size > MAX_UPLOAD_BYTES {
        return Err(StorageError::TooLarge {
            max: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}
