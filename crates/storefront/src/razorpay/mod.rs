//! Razorpay payment gateway integration.
//!
//! Creates gateway orders over the REST Orders API and verifies the
//! HMAC-SHA256 signature the checkout widget returns after payment.
//!
//! # Example
//!
//! ```rust,ignore
//! use akaar_storefront::razorpay::{CreateOrderRequest, OrderNotes, RazorpayClient};
//!
//! let client = RazorpayClient::new(&config.razorpay)?;
//! let order = client.create_order(&CreateOrderRequest::inr(49_900, receipt, notes)).await?;
//! assert!(client.verify_signature(&order.id, payment_id, signature));
//! ```

mod client;
mod error;
mod types;

pub use client::{RazorpayClient, payment_signature};
pub use error::RazorpayError;
pub use types::{CreateOrderRequest, GatewayOrder, OrderNotes};
