//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`,
//! and every error body is `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::razorpay::RazorpayError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::password_reset::PasswordResetError;
use crate::services::quotes::QuoteError;
use crate::services::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Razorpay API call failed.
    #[error("Payment gateway error: {0}")]
    Payment(#[from] RazorpayError),

    /// Upload validation or presigning failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated, or not allowed to see the resource.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with existing data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(RepositoryError::Conflict(_)) => false,
            Self::Database(_) | Self::Internal(_) | Self::Payment(_) => true,
            Self::Storage(err) => !is_upload_rejection(err),
            _ => false,
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Storage(err) => {
                if is_upload_rejection(err) {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Client-facing message. Internal details never leave the server.
    fn message(&self) -> String {
        match self {
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Payment(_) => "Payment gateway error".to_string(),
            Self::Storage(err) => {
                if is_upload_rejection(err) {
                    upload_rejection_message(err)
                } else {
                    "Internal server error".to_string()
                }
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid email or password".to_string()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_string()
                }
            },
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::RateLimited => "Too many requests, please try again later".to_string(),
        }
    }
}

const fn is_upload_rejection(err: &StorageError) -> bool {
    matches!(
        err,
        StorageError::UnsupportedFileType(_)
            | StorageError::EmptyFile
            | StorageError::TooLarge { .. }
            | StorageError::ForeignKey(_)
    )
}

fn upload_rejection_message(err: &StorageError) -> String {
    match err {
        StorageError::UnsupportedFileType(_) => "File type not allowed".to_string(),
        StorageError::EmptyFile => "File is empty".to_string(),
        StorageError::ForeignKey(_) => "Invalid file reference".to_string(),
        StorageError::TooLarge { max } => {
            format!("File exceeds the maximum size of {} MB", max / (1024 * 1024))
        }
        other => other.to_string(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = Json(json!({ "error": self.message() }));

        (status, body).into_response()
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::InvalidAmount
            | CheckoutError::InvalidSignature
            | CheckoutError::InvalidOrder(_) => Self::BadRequest(err.to_string()),
            CheckoutError::Gateway(e) => Self::Payment(e),
            CheckoutError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<QuoteError> for AppError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::MissingFields
            | QuoteError::InvalidQuantity
            | QuoteError::InvalidEmail
            | QuoteError::InvalidFileKey => Self::BadRequest(err.to_string()),
            QuoteError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<PasswordResetError> for AppError {
    fn from(err: PasswordResetError) -> Self {
        match err {
            PasswordResetError::WeakPassword(_)
            | PasswordResetError::InvalidToken
            | PasswordResetError::ExpiredToken
            | PasswordResetError::UserNotFound => Self::BadRequest(err.to_string()),
            PasswordResetError::Hash => Self::Internal(err.to_string()),
            PasswordResetError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a customer action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_json(err: AppError) -> serde_json::Value {
        let bytes = to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Order not found".to_string());
        assert_eq!(err.to_string(), "Not found: Order not found");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Payment(RazorpayError::Response("bad".to_string()))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AuthError::WeakPassword("too short".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_repository_conflict_is_409() {
        let err = AppError::Database(RepositoryError::Conflict(
            "A default address already exists".to_string(),
        ));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(err).await,
            json!({ "error": "A default address already exists" })
        );

        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_error_mapping() {
        assert_eq!(
            get_status(StorageError::UnsupportedFileType("a.exe".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(StorageError::Presign("boom".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(StorageError::ForeignKey("private/a.csv".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let body = body_json(CheckoutError::InvalidAmount.into()).await;
        assert_eq!(body, json!({ "error": "Invalid amount" }));

        let body = body_json(QuoteError::MissingFields.into()).await;
        assert_eq!(body, json!({ "error": "Missing required fields" }));

        let body = body_json(QuoteError::InvalidFileKey.into()).await;
        assert_eq!(body, json!({ "error": "Invalid file reference" }));

        let body = body_json(AppError::Internal("connection reset".to_string())).await;
        assert_eq!(body, json!({ "error": "Internal server error" }));

        let body = body_json(AppError::Payment(RazorpayError::Api {
            status: 401,
            message: "BAD_REQUEST_ERROR: Authentication failed".to_string(),
        }))
        .await;
        assert_eq!(body, json!({ "error": "Payment gateway error" }));
    }
}
