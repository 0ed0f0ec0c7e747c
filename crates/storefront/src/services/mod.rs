//! Business logic services for the storefront.
//!
//! Services borrow the pool and shared clients from [`crate::state::AppState`]
//! for the duration of one request and hold no state of their own.
//!
//! # Services
//!
//! - `auth` - Email/password accounts (Argon2id)
//! - `catalog` - Product listing and detail pages
//! - `checkout` - Razorpay order creation and payment verification
//! - `email` - Transactional email over SMTP (best-effort)
//! - `geometry` - STL volume, area and printability checks
//! - `identifiers` - Order numbers, quote numbers, receipts, reset tokens
//! - `password_reset` - Forgotten-password tokens
//! - `quotes` - Custom manufacturing quote intake
//! - `storage` - Presigned S3 URLs for quote uploads

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod geometry;
pub mod identifiers;
pub mod password_reset;
pub mod quotes;
pub mod storage;
