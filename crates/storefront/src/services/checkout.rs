//! Checkout: gateway order creation and payment verification.
//!
//! Nothing is persisted when a gateway order is created. An order row is
//! written only after the gateway signature verifies, and a payment id is
//! recorded at most once.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use akaar_core::{Email, Money, OrderStatus, PaymentStatus, ProductId};

use super::email::Notifier;
use super::identifiers;
use crate::db::{OrderRepository, RepositoryError};
use crate::models::{
    CurrentUser, NewOrder, NewOrderItem, Order, ShippingAddress, max_stored_amount,
};
use crate::razorpay::{CreateOrderRequest, OrderNotes, RazorpayClient, RazorpayError};

/// Payment method recorded on gateway-paid orders.
const PAYMENT_METHOD: &str = "razorpay";

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Invalid payment signature")]
    InvalidSignature,

    /// Order details failed validation.
    #[error("{0}")]
    InvalidOrder(String),

    #[error(transparent)]
    Gateway(#[from] RazorpayError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Body of `POST /api/payment/create-order`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateOrderInput {
    /// Whole rupees, as a JSON number or numeric string.
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    #[serde(default)]
    pub items: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub email: Option<String>,
}

/// What the checkout widget needs to open a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    pub order_id: String,
    /// Amount in paise.
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    /// Public key id.
    pub key: String,
}

/// Body of `POST /api/payment/verify`. Field names follow the widget callback.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyPaymentInput {
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_signature: Option<String>,
    /// Parsed only after the signature verifies.
    #[serde(default, rename = "orderData")]
    pub order_data: Option<serde_json::Value>,
}

/// Cart snapshot sent with a verified payment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    #[serde(default)]
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub shipping_method: Option<String>,
    pub shipping_address: ShippingAddress,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One cart line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(default)]
    pub product_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    pub quantity: i32,
    /// Unit price in rupees.
    pub price: Decimal,
}

/// Parse an amount given as a JSON number or numeric string.
fn parse_amount(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Amount in paise for a create-order request.
///
/// # Errors
///
/// Returns `CheckoutError::InvalidAmount` for missing, non-numeric or
/// non-positive amounts.
pub fn amount_in_paise(input: &CreateOrderInput) -> Result<i64, CheckoutError> {
    let amount = input
        .amount
        .as_ref()
        .and_then(parse_amount)
        .ok_or(CheckoutError::InvalidAmount)?;

    Money::inr(amount)
        .to_minor_units()
        .map_err(|_| CheckoutError::InvalidAmount)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Turn a verified payment's cart snapshot into an insertable order.
///
/// # Errors
///
/// Returns `CheckoutError::InvalidOrder` for an empty cart, a non-positive
/// quantity, an amount that is negative or too large to store, or an
/// invalid email.
pub fn build_new_order(
    data: OrderData,
    user: Option<&CurrentUser>,
    order_number: String,
    razorpay_order_id: String,
    razorpay_payment_id: String,
    razorpay_signature: String,
) -> Result<NewOrder, CheckoutError> {
    if data.items.is_empty() {
        return Err(CheckoutError::InvalidOrder(
            "Order must contain at least one item".to_string(),
        ));
    }

    if data
        .items
        .iter()
        .any(|item| item.quantity <= 0 || item.price < Decimal::ZERO)
    {
        return Err(CheckoutError::InvalidOrder(
            "Item quantity must be a positive integer".to_string(),
        ));
    }

    if [data.subtotal, data.shipping_cost, data.tax, data.total]
        .iter()
        .any(|amount| *amount < Decimal::ZERO)
    {
        return Err(CheckoutError::InvalidOrder(
            "Order amounts cannot be negative".to_string(),
        ));
    }

    let max = max_stored_amount();
    if [data.subtotal, data.shipping_cost, data.tax, data.total]
        .iter()
        .chain(data.items.iter().map(|item| &item.price))
        .any(|amount| *amount > max)
    {
        return Err(CheckoutError::InvalidOrder(
            "Order amount is too large".to_string(),
        ));
    }

    let line_totals = data
        .items
        .iter()
        .map(|item| NewOrderItem::line_total(item.price, item.quantity))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| CheckoutError::InvalidOrder("Order amount is too large".to_string()))?;

    let email = Email::parse(&data.email)
        .map_err(|_| CheckoutError::InvalidOrder("Invalid email address".to_string()))?;

    let items = data
        .items
        .into_iter()
        .zip(line_totals)
        .map(|(item, total_price)| NewOrderItem {
            product_id: item
                .product_id
                .as_deref()
                .and_then(|id| ProductId::from_str(id).ok()),
            name: item.name,
            slug: non_empty(item.slug),
            material: non_empty(item.material),
            quantity: item.quantity,
            unit_price: item.price,
            total_price,
        })
        .collect();

    Ok(NewOrder {
        order_number,
        user_id: user.map(|u| u.id),
        status: OrderStatus::Confirmed,
        payment_status: PaymentStatus::Captured,
        payment_method: PAYMENT_METHOD.to_string(),
        subtotal: data.subtotal,
        shipping_cost: data.shipping_cost,
        tax: data.tax,
        total: data.total,
        shipping_method: non_empty(data.shipping_method),
        shipping_address: data.shipping_address,
        razorpay_order_id,
        razorpay_payment_id,
        razorpay_signature,
        email,
        phone: non_empty(data.phone),
        notes: non_empty(data.notes),
        items,
    })
}

/// Checkout operations.
pub struct CheckoutService<'a> {
    orders: OrderRepository<'a>,
    razorpay: &'a RazorpayClient,
    notifier: &'a Notifier,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, razorpay: &'a RazorpayClient, notifier: &'a Notifier) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            razorpay,
            notifier,
        }
    }

    /// Create a gateway order for the cart total. Persists nothing.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidAmount` before any gateway call if the
    /// amount is missing or not positive, and `CheckoutError::Gateway` if
    /// Razorpay fails.
    pub async fn create_payment_order(
        &self,
        input: &CreateOrderInput,
        user: Option<&CurrentUser>,
    ) -> Result<PaymentOrder, CheckoutError> {
        let paise = amount_in_paise(input)?;

        let email = input
            .email
            .clone()
            .filter(|e| !e.is_empty())
            .or_else(|| user.map(|u| u.email.to_string()))
            .unwrap_or_default();

        let notes = OrderNotes {
            user_id: user.map_or_else(|| "guest".to_string(), |u| u.id.to_string()),
            email,
            item_count: input.items.as_ref().map_or(0, Vec::len).to_string(),
        };

        let request = CreateOrderRequest::inr(paise, identifiers::payment_receipt(), notes);
        let order = self.razorpay.create_order(&request).await?;

        tracing::info!(
            razorpay_order_id = %order.id,
            amount = order.amount,
            "Payment order created"
        );

        Ok(PaymentOrder {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt,
            key: self.razorpay.key_id().to_string(),
        })
    }

    /// Verify a completed payment and record the order.
    ///
    /// Replaying a payment id that was already recorded returns the existing
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidSignature` if ids are missing or the
    /// signature does not match, `CheckoutError::InvalidOrder` if the cart
    /// snapshot is invalid, and `CheckoutError::Repository` on database failure.
    pub async fn verify_and_record(
        &self,
        input: VerifyPaymentInput,
        user: Option<&CurrentUser>,
    ) -> Result<Order, CheckoutError> {
        let order_id = input.razorpay_order_id.unwrap_or_default();
        let payment_id = input.razorpay_payment_id.unwrap_or_default();
        let signature = input.razorpay_signature.unwrap_or_default();

        if !self
            .razorpay
            .verify_signature(&order_id, &payment_id, &signature)
        {
            tracing::warn!(razorpay_order_id = %order_id, "Payment signature mismatch");
            return Err(CheckoutError::InvalidSignature);
        }

        if let Some(existing) = self.orders.get_by_payment_id(&payment_id).await? {
            tracing::info!(order_number = %existing.order_number, "Payment already recorded");
            return Ok(existing);
        }

        let data: OrderData = input
            .order_data
            .ok_or_else(|| CheckoutError::InvalidOrder("Missing order data".to_string()))
            .and_then(|value| {
                serde_json::from_value(value)
                    .map_err(|e| CheckoutError::InvalidOrder(format!("Invalid order data: {e}")))
            })?;

        let new_order = build_new_order(
            data,
            user,
            identifiers::order_number(),
            order_id,
            payment_id.clone(),
            signature,
        )?;

        let order = match self.orders.create_with_items(&new_order).await {
            Ok(order) => order,
            // A concurrent verify of the same payment won the insert
            Err(RepositoryError::Conflict(reason)) => self
                .orders
                .get_by_payment_id(&payment_id)
                .await?
                .ok_or(RepositoryError::Conflict(reason))?,
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            order_number = %order.order_number,
            items = order.items.len(),
            "Order recorded"
        );

        self.notifier.order_confirmation(&order).await;

        Ok(order)
    }
}
