//! Orders and their line items.
//!
//! An order is a snapshot: item names, prices and the shipping address are
//! copied at purchase time and never follow later catalog edits.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use akaar_core::{Email, OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, UserId};

/// Largest amount a `NUMERIC(12, 2)` column holds.
#[must_use]
pub fn max_stored_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

fn default_country() -> String {
    "India".to_string()
}

/// Shipping address captured at checkout, stored as JSONB on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    #[serde(default)]
    pub apartment: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Single-line rendering used in emails.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.address.clone()];
        if let Some(apartment) = self.apartment.as_deref().filter(|a| !a.is_empty()) {
            parts.push(apartment.to_string());
        }
        parts.push(format!("{}, {} {}", self.city, self.state, self.zip));
        parts.push(self.country.clone());
        parts.join(", ")
    }
}

/// A purchased line item.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub name: String,
    pub slug: Option<String>,
    pub material: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// A paid order with its items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: Option<UserId>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub shipping_method: Option<String>,
    pub shipping_address: ShippingAddress,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// `orders` row without items.
#[derive(Debug, FromRow)]
pub(crate) struct OrderRow {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: Option<UserId>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub shipping_method: Option<String>,
    pub shipping_address: Json<ShippingAddress>,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderRow {
    pub(crate) fn with_items(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            user_id: self.user_id,
            status: self.status,
            payment_status: self.payment_status,
            payment_method: self.payment_method,
            subtotal: self.subtotal,
            shipping_cost: self.shipping_cost,
            tax: self.tax,
            total: self.total,
            shipping_method: self.shipping_method,
            shipping_address: self.shipping_address.0,
            razorpay_order_id: self.razorpay_order_id,
            razorpay_payment_id: self.razorpay_payment_id,
            email: self.email,
            phone: self.phone,
            notes: self.notes,
            created_at: self.created_at,
            items,
        }
    }
}

/// Line item ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub slug: Option<String>,
    pub material: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl NewOrderItem {
    /// `unit_price × quantity`, or `None` when the product overflows or
    /// does not fit the stored precision.
    #[must_use]
    pub fn line_total(unit_price: Decimal, quantity: i32) -> Option<Decimal> {
        unit_price
            .checked_mul(Decimal::from(quantity))
            .filter(|total| *total <= max_stored_amount())
    }
}

/// Everything needed to persist a verified order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: Option<UserId>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub shipping_method: Option<String>,
    pub shipping_address: ShippingAddress,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    pub email: Email,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_address_defaults_country() {
        let address: ShippingAddress = serde_json::from_value(serde_json::json!({
            "firstName": "Asha",
            "lastName": "Rao",
            "address": "12 MG Road",
            "city": "Bengaluru",
            "state": "Karnataka",
            "zip": "560001"
        }))
        .unwrap();
        assert_eq!(address.country, "India");
        assert_eq!(
            address.one_line(),
            "12 MG Road, Bengaluru, Karnataka 560001, India"
        );
    }

    #[test]
    fn test_line_total() {
        assert_eq!(
            NewOrderItem::line_total(Decimal::new(24_950, 2), 3),
            Some(Decimal::new(74_850, 2))
        );
        assert_eq!(
            NewOrderItem::line_total(max_stored_amount(), 1),
            Some(max_stored_amount())
        );
    }

    #[test]
    fn test_line_total_out_of_range() {
        assert_eq!(NewOrderItem::line_total(Decimal::MAX, 2), None);
        assert_eq!(NewOrderItem::line_total(max_stored_amount(), 2), None);
    }
}
