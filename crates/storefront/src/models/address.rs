//! Saved customer addresses.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use akaar_core::{AddressId, UserId};

/// A saved address. At most one per user has `is_default` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub address_type: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub apartment: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub phone: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated address fields for create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressInput {
    pub label: Option<String>,
    pub address_type: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub apartment: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub phone: Option<String>,
    pub is_default: bool,
}
