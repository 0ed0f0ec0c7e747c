//! Razorpay Orders API request and response types.

use serde::{Deserialize, Serialize};

/// Currency sent with every gateway order.
pub const CURRENCY_INR: &str = "INR";

/// Body of `POST /v1/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrderRequest {
    /// Amount in paise.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: OrderNotes,
}

impl CreateOrderRequest {
    /// An INR order for `amount_paise`.
    #[must_use]
    pub fn inr(amount_paise: i64, receipt: String, notes: OrderNotes) -> Self {
        Self {
            amount: amount_paise,
            currency: CURRENCY_INR.to_string(),
            receipt,
            notes,
        }
    }
}

/// Free-form notes Razorpay stores with the order. Values must be strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNotes {
    /// Session user id, or `guest`.
    pub user_id: String,
    pub email: String,
    pub item_count: String,
}

/// Order entity returned by Razorpay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Amount in paise.
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_notes_serialize_camel_case() {
        let request = CreateOrderRequest::inr(
            49_900,
            "order_1_abc".to_string(),
            OrderNotes {
                user_id: "guest".to_string(),
                email: "asha@example.com".to_string(),
                item_count: "2".to_string(),
            },
        );

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["amount"], 49_900);
        assert_eq!(json["currency"], "INR");
        assert_eq!(json["notes"]["userId"], "guest");
        assert_eq!(json["notes"]["itemCount"], "2");
    }

    #[test]
    fn test_gateway_order_tolerates_extra_fields() {
        let order: GatewayOrder = serde_json::from_value(serde_json::json!({
            "id": "order_9A33XWu170gUtm",
            "entity": "order",
            "amount": 49900,
            "amount_paid": 0,
            "currency": "INR",
            "receipt": "order_1_abc",
            "status": "created",
            "attempts": 0
        }))
        .unwrap();
        assert_eq!(order.id, "order_9A33XWu170gUtm");
        assert_eq!(order.status.as_deref(), Some("created"));
    }
}
