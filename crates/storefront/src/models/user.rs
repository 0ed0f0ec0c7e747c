//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use akaar_core::{Email, UserId};

/// A storefront customer account.
///
/// The password hash is never loaded into this type; see
/// [`crate::db::UserRepository::get_password_hash`].
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
