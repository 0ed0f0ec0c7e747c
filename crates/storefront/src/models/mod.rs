//! Domain models for the storefront.
//!
//! Database rows are decoded into these types by the repositories in
//! [`crate::db`]; handlers serialize them straight to camelCase JSON.

pub mod address;
pub mod order;
pub mod product;
pub mod quote;
pub mod session;
pub mod user;

pub use address::{Address, AddressInput};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, ShippingAddress, max_stored_amount};
pub use product::{MeshFile, Product};
pub use quote::{NewQuote, NewQuoteFile, QuoteFile, QuoteRequest};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
