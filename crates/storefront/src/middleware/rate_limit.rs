//! Per-IP rate limiting with `governor` and `tower_governor`.
//!
//! Two tiers:
//! - [`auth_rate_limiter`]: login, registration, password reset and payment
//!   endpoints (~10/min)
//! - [`api_rate_limiter`]: everything else under `/api` (~100/min)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderValue, Request, Response, header};
use axum::response::IntoResponse;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use serde_json::json;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::AppError;

/// Proxy headers carrying the client address, most trusted first.
/// `x-forwarded-for` may hold a chain; its first hop is the client.
const CLIENT_IP_HEADERS: [&str; 4] = [
    "cf-connecting-ip",
    "x-forwarded-for",
    "x-real-ip",
    "fly-client-ip",
];

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Keys requests by client IP: proxy headers first, then the peer address
/// (available when served with `into_make_service_with_connect_info`).
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        CLIENT_IP_HEADERS
            .iter()
            .find_map(|name| header_ip(req.headers(), name))
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

pub type RateLimiterLayer = GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, Body>;

/// Render limiter rejections with the API's `{"error": ...}` body.
///
/// Rate limit headers from the limiter are kept, and `retry-after` is
/// always present on a 429.
fn rejection_response(err: GovernorError) -> Response<Body> {
    match err {
        GovernorError::TooManyRequests { wait_time, headers } => {
            let mut response = AppError::RateLimited.into_response();
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
                .headers_mut()
                .entry(header::RETRY_AFTER)
                .or_insert_with(|| HeaderValue::from(wait_time));
            response
        }
        GovernorError::UnableToExtractKey => {
            AppError::Internal("unable to determine client address".to_string()).into_response()
        }
        GovernorError::Other { code, msg, headers } => {
            let message = msg
                .or_else(|| code.canonical_reason().map(String::from))
                .unwrap_or_default();
            let mut response = (code, Json(json!({ "error": message }))).into_response();
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
    }
}

/// One token every `replenish_secs`, bursting to `burst`.
///
/// # Panics
///
/// Panics if either argument is zero; callers pass constants.
fn limiter(replenish_secs: u64, burst: u32) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(replenish_secs)
        .burst_size(burst)
        .finish()
        .expect("rate limiter period and burst must be non-zero");
    GovernorLayer::new(Arc::new(config)).error_handler(rejection_response)
}

/// Strict limiter: a token every 6 seconds, burst of 5.
///
/// Slows guessing of credentials, reset tokens and payment signatures.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    limiter(6, 5)
}

/// Relaxed limiter: a token per second, burst of 50.
#[must_use]
pub fn api_rate_limiter() -> RateLimiterLayer {
    limiter(1, 50)
}
