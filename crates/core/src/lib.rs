//! Akaar Core - Shared domain types.
//!
//! This crate provides the types shared by every Akaar component:
//! - `storefront` - Public JSON API (catalog, quotes, checkout, accounts)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. The optional `postgres` feature adds `sqlx` encode/decode impls.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, money, normalized emails, and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
