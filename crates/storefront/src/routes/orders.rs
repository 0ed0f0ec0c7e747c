//! Order detail.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use akaar_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::extract::ApiPath;
use crate::middleware::{OptionalAuth, ensure_can_view};
use crate::state::AppState;

/// `GET /api/orders/{id}`
///
/// Guest orders are readable by id; owned orders only by their owner.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Value>> {
    let not_found = || AppError::NotFound("Order not found".to_string());
    let id: OrderId = id.parse().map_err(|_| not_found())?;

    let order = OrderRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    ensure_can_view(order.user_id, user.as_ref())?;

    Ok(Json(json!({ "order": order })))
}
