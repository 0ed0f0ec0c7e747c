//! Per-request correlation ids.
//!
//! An id supplied by the proxy in front of the API is reused when it looks
//! sane, otherwise a UUID v4 is minted. The id ends up in the request span,
//! as a Sentry tag, and on the response.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest inbound id we are willing to echo back.
const MAX_INBOUND_LEN: usize = 128;

/// The inbound id, if present, short enough and plain ASCII.
fn inbound_request_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    let usable = !value.is_empty()
        && value.len() <= MAX_INBOUND_LEN
        && value.chars().all(|c| c.is_ascii_graphic());
    usable.then(|| value.to_string())
}

/// Tag the request with an id and echo it in `x-request-id`.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id =
        inbound_request_id(request.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_inbound_id_reused() {
        assert_eq!(
            inbound_request_id(&headers("cf-8a1b2c3d")).as_deref(),
            Some("cf-8a1b2c3d")
        );
    }

    #[test]
    fn test_unusable_inbound_ids_ignored() {
        assert!(inbound_request_id(&HeaderMap::new()).is_none());
        assert!(inbound_request_id(&headers("   ")).is_none());
        assert!(inbound_request_id(&headers("has space")).is_none());
        assert!(inbound_request_id(&headers(&"a".repeat(MAX_INBOUND_LEN + 1))).is_none());
    }
}
