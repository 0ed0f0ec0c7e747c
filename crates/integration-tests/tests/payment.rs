//! Integration tests for checkout: create-order, verify, and order reads.
//!
//! These tests require a running `PostgreSQL` database (task db:start).
//!
//! Run with: task test:integration

#![allow(clippy::unwrap_used)]

use akaar_integration_tests::{
    KEY_ID, TestContext, unique_email, unique_payment_id, verify_payload,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn count_orders_for_payment(ctx: &TestContext, payment_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM storefront.orders WHERE razorpay_payment_id = $1")
        .bind(payment_id)
        .fetch_one(&ctx.pool)
        .await
        .unwrap()
}

// ============================================================================
// Create Order
// ============================================================================

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_create_order_converts_to_paise() {
    let ctx = TestContext::new().await;
    ctx.mock_gateway_order("order_IntCreate1", 64_800).await;

    let resp = ctx
        .client()
        .post(ctx.url("/api/payment/create-order"))
        .json(&json!({ "amount": 648, "items": [{ "name": "Replacement Gear" }] }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["orderId"], "order_IntCreate1");
    assert_eq!(body["amount"], 64_800);
    assert_eq!(body["key"], KEY_ID);

    let requests = ctx.razorpay.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests.first().unwrap().body).unwrap();
    assert_eq!(sent["amount"], 64_800);
    assert_eq!(sent["currency"], "INR");
}

// ============================================================================
// Verify
// ============================================================================

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_verify_records_confirmed_order() {
    let ctx = TestContext::new().await;
    let client = ctx.client();
    let payment_id = unique_payment_id();
    let email = unique_email("guest");

    let resp = client
        .post(ctx.url("/api/payment/verify"))
        .json(&verify_payload("order_IntVerify1", &payment_id, &email))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["orderNumber"].as_str().unwrap().starts_with("AKR-"));

    let order_id = body["orderId"].as_str().unwrap();
    let resp = client
        .get(ctx.url(&format!("/api/orders/{order_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let order: Value = resp.json().await.unwrap();
    let order = &order["order"];
    assert_eq!(order["status"], "CONFIRMED");
    assert_eq!(order["paymentStatus"], "CAPTURED");
    assert_eq!(order["paymentMethod"], "razorpay");
    assert_eq!(order["total"], "648.00");
    assert_eq!(order["email"], email);
    assert!(order["userId"].is_null());

    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["totalPrice"], "598.00");
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_verify_is_idempotent_per_payment() {
    let ctx = TestContext::new().await;
    let client = ctx.client();
    let payment_id = unique_payment_id();
    let payload = verify_payload("order_IntReplay1", &payment_id, &unique_email("guest"));

    let mut order_ids = Vec::new();
    for _ in 0..2 {
        let resp = client
            .post(ctx.url("/api/payment/verify"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        order_ids.push(body["orderId"].clone());
    }

    assert_eq!(order_ids[0], order_ids[1]);
    assert_eq!(count_orders_for_payment(&ctx, &payment_id).await, 1);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_verify_bad_signature_records_nothing() {
    let ctx = TestContext::new().await;
    let payment_id = unique_payment_id();
    let mut payload = verify_payload("order_IntForged1", &payment_id, &unique_email("guest"));
    payload["razorpay_signature"] = json!("0".repeat(64));

    let resp = ctx
        .client()
        .post(ctx.url("/api/payment/verify"))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Invalid payment signature" }));
    assert_eq!(count_orders_for_payment(&ctx, &payment_id).await, 0);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_verify_empty_cart_records_nothing() {
    let ctx = TestContext::new().await;
    let payment_id = unique_payment_id();
    let mut payload = verify_payload("order_IntEmpty1", &payment_id, &unique_email("guest"));
    payload["orderData"]["items"] = json!([]);

    let resp = ctx
        .client()
        .post(ctx.url("/api/payment/verify"))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(count_orders_for_payment(&ctx, &payment_id).await, 0);
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_owned_order_hidden_from_other_sessions() {
    let ctx = TestContext::new().await;
    let owner = ctx.client();
    let email = ctx.register(&owner, "correct horse battery").await;

    let resp = owner
        .post(ctx.url("/api/payment/verify"))
        .json(&verify_payload("order_IntOwned1", &unique_payment_id(), &email))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let order_path = format!("/api/orders/{}", body["orderId"].as_str().unwrap());

    let resp = owner.get(ctx.url(&order_path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx.client().get(ctx.url(&order_path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let stranger = ctx.client();
    ctx.register(&stranger, "another long password").await;
    let resp = stranger.get(ctx.url(&order_path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = owner.get(ctx.url("/api/user/orders")).send().await.unwrap();
    let history: Value = resp.json().await.unwrap();
    assert_eq!(history["orders"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_unknown_order_is_404() {
    let ctx = TestContext::new().await;
    let resp = ctx
        .client()
        .get(ctx.url(&format!("/api/orders/{}", uuid::Uuid::new_v4())))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
