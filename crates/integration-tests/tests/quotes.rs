//! Integration tests for quote submission and quote reads.
//!
//! These tests require a running `PostgreSQL` database (task db:start).

#![allow(clippy::unwrap_used)]

use akaar_integration_tests::{TestContext, UPLOAD_BUCKET, unique_email};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

async fn submit_quote(ctx: &TestContext, client: &Client, email: &str) -> Value {
    let resp = client
        .post(ctx.url("/api/quotes"))
        .json(&json!({
            "name": "Ravi Kumar",
            "email": email,
            "service": "3d-printing",
            "material": "PETG",
            "quantity": "3",
            "notes": "Matte finish please",
            "files": [{
                "originalFilename": "bracket.stl",
                "s3Key": "quotes/uploads/6f1c2a9e/1717171717171-bracket.stl",
                "fileSize": 20480,
                "fileType": "model/stl"
            }]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_guest_quote_submission() {
    let ctx = TestContext::new().await;
    let client = ctx.client();
    let email = unique_email("maker");

    let body = submit_quote(&ctx, &client, &email).await;

    let quote_number = body["quoteNumber"].as_str().unwrap();
    assert!(quote_number.starts_with("QT-"));
    assert_eq!(quote_number.len(), 13);

    let quote = &body["quote"];
    assert_eq!(quote["quoteNumber"], quote_number);
    assert_eq!(quote["status"], "PENDING");
    assert_eq!(quote["quantity"], 3);
    assert!(quote["userId"].is_null());

    let files = quote["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["storedFilename"], "1717171717171-bracket.stl");
    assert_eq!(files[0]["s3Bucket"], UPLOAD_BUCKET);

    let stored: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM storefront.quote_requests WHERE quote_number = $1 AND email = $2",
    )
    .bind(quote_number)
    .bind(&email)
    .fetch_one(&ctx.pool)
    .await
    .unwrap();
    assert_eq!(stored, 1);

    // Guest quotes are readable by id from any session
    let resp = ctx
        .client()
        .get(ctx.url(&format!("/api/quotes/{}", quote["id"].as_str().unwrap())))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_quote_rejects_zero_quantity() {
    let ctx = TestContext::new().await;
    let resp = ctx
        .client()
        .post(ctx.url("/api/quotes"))
        .json(&json!({
            "name": "Ravi Kumar",
            "email": unique_email("maker"),
            "service": "cnc",
            "material": "Aluminium 6061",
            "quantity": 0
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Missing required fields" }));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_quote_rejects_foreign_file_keys() {
    let ctx = TestContext::new().await;
    let resp = ctx
        .client()
        .post(ctx.url("/api/quotes"))
        .json(&json!({
            "name": "Ravi Kumar",
            "email": unique_email("maker"),
            "service": "3d-printing",
            "material": "PLA",
            "quantity": 1,
            "files": [{
                "originalFilename": "payroll.csv",
                "s3Key": "private/payroll.csv",
                "s3Bucket": "someone-elses-bucket",
                "fileSize": 100,
                "fileType": "text/csv"
            }]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Invalid file reference" }));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_owned_quote_listing_and_access() {
    let ctx = TestContext::new().await;
    let owner = ctx.client();
    let email = ctx.register(&owner, "correct horse battery").await;

    let body = submit_quote(&ctx, &owner, &email).await;
    assert!(body["quote"]["userId"].is_string());
    let quote_path = format!("/api/quotes/{}", body["quote"]["id"].as_str().unwrap());

    for path in ["/api/quotes", "/api/user/quotes"] {
        let resp = owner.get(ctx.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let listing: Value = resp.json().await.unwrap();
        let quotes = listing["quotes"].as_array().unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0]["quoteNumber"], body["quoteNumber"]);
    }

    let resp = owner.get(ctx.url(&quote_path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx.client().get(ctx.url(&quote_path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_quote_file_download_link() {
    let ctx = TestContext::new().await;
    let client = ctx.client();

    let body = submit_quote(&ctx, &client, &unique_email("maker")).await;
    let quote = &body["quote"];
    let file_id = quote["files"][0]["id"].as_str().unwrap();

    let resp = client
        .get(ctx.url(&format!(
            "/api/quotes/{}/files/{file_id}/download",
            quote["id"].as_str().unwrap()
        )))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let link: Value = resp.json().await.unwrap();
    let url = link["url"].as_str().unwrap();
    assert!(url.contains(UPLOAD_BUCKET));
    assert!(url.contains("X-Amz-Signature"));
}
