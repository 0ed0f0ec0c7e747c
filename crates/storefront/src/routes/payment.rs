//! Razorpay checkout route handlers.

use axum::{Json, extract::State};
use serde::Serialize;

use akaar_core::OrderId;

use crate::error::{Result, add_breadcrumb};
use crate::extract::ApiJson;
use crate::middleware::OptionalAuth;
use crate::services::checkout::{CheckoutService, CreateOrderInput, PaymentOrder, VerifyPaymentInput};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerified {
    pub success: bool,
    pub order_id: OrderId,
    pub order_number: String,
}

/// `POST /api/payment/create-order`
#[tracing::instrument(skip_all)]
pub async fn create_order(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiJson(input): ApiJson<CreateOrderInput>,
) -> Result<Json<PaymentOrder>> {
    let service = CheckoutService::new(state.pool(), state.razorpay(), state.notifier());
    let order = service.create_payment_order(&input, user.as_ref()).await?;

    add_breadcrumb(
        "checkout",
        "Payment order created",
        Some(&[("razorpay_order_id", order.order_id.as_str())]),
    );

    Ok(Json(order))
}

/// `POST /api/payment/verify`
#[tracing::instrument(skip_all)]
pub async fn verify(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiJson(input): ApiJson<VerifyPaymentInput>,
) -> Result<Json<PaymentVerified>> {
    let service = CheckoutService::new(state.pool(), state.razorpay(), state.notifier());
    let order = service.verify_and_record(input, user.as_ref()).await?;

    Ok(Json(PaymentVerified {
        success: true,
        order_id: order.id,
        order_number: order.order_number,
    }))
}
