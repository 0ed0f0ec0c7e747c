//! Razorpay REST client.

use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::{debug, instrument, warn};

use super::error::RazorpayError;
use super::types::{ApiErrorResponse, CreateOrderRequest, GatewayOrder};
use crate::config::RazorpayConfig;

/// Upper bound on any single gateway call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Razorpay API client.
#[derive(Clone)]
pub struct RazorpayClient {
    client: Client,
    key_id: String,
    key_secret: SecretString,
    api_base: String,
}

impl RazorpayClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `RazorpayError::Http` if the HTTP client fails to build.
    pub fn new(config: &RazorpayConfig) -> Result<Self, RazorpayError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Public key id, handed to the browser checkout widget.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Create a gateway order.
    ///
    /// # Errors
    ///
    /// Returns `RazorpayError::Http` on transport failure or timeout.
    /// Returns `RazorpayError::Api` if Razorpay rejects the request.
    /// Returns `RazorpayError::Response` if the response cannot be parsed.
    #[instrument(skip(self, request), fields(receipt = %request.receipt, amount = request.amount))]
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<GatewayOrder, RazorpayError> {
        let url = format!("{}/v1/orders", self.api_base);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorResponse>().await {
                Ok(body) => format!(
                    "{}: {}",
                    body.error.code.unwrap_or_default(),
                    body.error.description.unwrap_or_default()
                ),
                Err(_) => status.to_string(),
            };
            warn!(status = status.as_u16(), %message, "Razorpay rejected order creation");
            return Err(RazorpayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let order: GatewayOrder = response
            .json()
            .await
            .map_err(|e| RazorpayError::Response(e.to_string()))?;

        debug!(order_id = %order.id, "Razorpay order created");
        Ok(order)
    }

    /// Check the signature returned by the checkout widget.
    ///
    /// Missing ids or signature never verify.
    #[must_use]
    pub fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        if order_id.is_empty() || payment_id.is_empty() || signature.is_empty() {
            return false;
        }

        let expected = payment_signature(self.key_secret.expose_secret(), order_id, payment_id);
        constant_time_compare(&expected, signature)
    }
}

/// Lowercase hex HMAC-SHA256 of `"{order_id}|{payment_id}"`.
#[must_use]
pub fn payment_signature(key_secret: &str, order_id: &str, payment_id: &str) -> String {
    // HMAC accepts keys of any length
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(key_secret.as_bytes()) else {
        return String::new();
    };
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{basic_auth, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::razorpay::OrderNotes;

    const KEY_ID: &str = "rzp_test_1DP5mmOlF5G5ag";
    const KEY_SECRET: &str = "q8Kx2mVb7LwZ4nRt9YpC3sHd";

    fn client(api_base: &str) -> RazorpayClient {
        RazorpayClient::new(&RazorpayConfig {
            key_id: KEY_ID.to_string(),
            key_secret: SecretString::from(KEY_SECRET.to_string()),
            api_base: api_base.to_string(),
        })
        .unwrap()
    }

    fn request() -> CreateOrderRequest {
        CreateOrderRequest::inr(
            49_900,
            "order_1700000000000_k3j9x0abc".to_string(),
            OrderNotes {
                user_id: "guest".to_string(),
                email: "asha@example.com".to_string(),
                item_count: "1".to_string(),
            },
        )
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "ab"));
    }

    #[test]
    fn test_signature_round_trip() {
        let client = client("http://127.0.0.1:9");
        let signature = payment_signature(KEY_SECRET, "order_A", "pay_B");

        assert_eq!(signature.len(), 64);
        assert!(client.verify_signature("order_A", "pay_B", &signature));
        assert!(!client.verify_signature("order_A", "pay_C", &signature));
        assert!(!client.verify_signature("order_A", "pay_B", &signature.to_uppercase()));
    }

    #[test]
    fn test_signature_matches_reference_vector() {
        // HMAC-SHA256(key="secret", "order_1|pay_1")
        let mut mac = Hmac::<Sha256>::new_from_slice(b"secret").unwrap();
        mac.update(b"order_1|pay_1");
        let reference = hex::encode(mac.finalize().into_bytes());

        assert_eq!(payment_signature("secret", "order_1", "pay_1"), reference);
    }

    #[test]
    fn test_missing_fields_never_verify() {
        let client = client("http://127.0.0.1:9");
        assert!(!client.verify_signature("", "pay_B", "abc"));
        assert!(!client.verify_signature("order_A", "", "abc"));
        assert!(!client.verify_signature("order_A", "pay_B", ""));
    }

    #[tokio::test]
    async fn test_create_order_sends_paise_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/orders"))
            .and(basic_auth(KEY_ID, KEY_SECRET))
            .and(body_partial_json(serde_json::json!({
                "amount": 49900,
                "currency": "INR",
                "notes": { "userId": "guest", "itemCount": "1" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "order_Mock123",
                "entity": "order",
                "amount": 49900,
                "currency": "INR",
                "receipt": "order_1700000000000_k3j9x0abc",
                "status": "created"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let order = client(&server.uri()).create_order(&request()).await.unwrap();

        assert_eq!(order.id, "order_Mock123");
        assert_eq!(order.amount, 49_900);
        assert_eq!(order.receipt.as_deref(), Some("order_1700000000000_k3j9x0abc"));
    }

    #[tokio::test]
    async fn test_create_order_surfaces_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/orders"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {
                    "code": "BAD_REQUEST_ERROR",
                    "description": "Order amount less than minimum amount allowed"
                }
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .create_order(&request())
            .await
            .unwrap_err();

        match err {
            RazorpayError::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("minimum amount"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
