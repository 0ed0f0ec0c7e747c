//! Razorpay-related errors.

use thiserror::Error;

/// Errors that can occur when talking to Razorpay.
#[derive(Debug, Error)]
pub enum RazorpayError {
    /// HTTP request failed or timed out.
    #[error("Razorpay request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Razorpay answered with a non-success status.
    #[error("Razorpay API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a success response.
    #[error("Razorpay response error: {0}")]
    Response(String),
}
