//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Database check
//!
//! # Catalog
//! GET  /api/products                   - Product listing (filter, search, sort, paginate)
//! GET  /api/products/{slug}            - Product detail + related products
//!
//! # Quotes
//! POST /api/quotes                     - Submit a quote request
//! GET  /api/quotes                     - Session user's quotes
//! GET  /api/quotes/{id}                - Quote detail (owner or guest quote)
//! GET  /api/quotes/{id}/files/{file_id}/download - Presigned download URL
//! POST /api/uploads/presign            - Presigned upload URL for a quote file
//!
//! # Geometry
//! POST /api/geometry/analyze           - Volume, area, bounds and estimates of an STL
//! POST /api/geometry/validate          - Printability issues of an STL
//!
//! # Payment
//! POST /api/payment/create-order       - Create a Razorpay order
//! POST /api/payment/verify             - Verify signature, record the order
//! GET  /api/orders/{id}                - Order detail (owner or guest order)
//!
//! # Auth
//! POST /api/auth/register              - Create account and log in
//! POST /api/auth/login                 - Log in
//! POST /api/auth/logout                - Log out
//! GET  /api/auth/session               - Current session user
//! POST /api/auth/forgot-password       - Email a reset link
//! GET  /api/auth/verify-reset-token    - Check a reset token
//! POST /api/auth/reset-password        - Set a new password with a token
//!
//! # Account (requires auth)
//! GET  /api/user/profile               - Profile
//! PUT  /api/user/profile               - Update name and phone
//! GET  /api/user/orders                - Order history
//! GET  /api/user/quotes                - Quote history
//! GET  /api/user/addresses             - Saved addresses
//! POST /api/user/addresses             - Add an address
//! PUT  /api/user/addresses/{id}        - Update an address
//! DELETE /api/user/addresses/{id}      - Delete an address
//! ```

pub mod auth;
pub mod geometry;
pub mod orders;
pub mod payment;
pub mod products;
pub mod quotes;
pub mod uploads;
pub mod user;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Whether per-IP rate limiting is applied to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimiting {
    Enabled,
    /// For in-process tests, where requests carry no client address.
    Disabled,
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the quote routes router.
pub fn quote_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(quotes::index).post(quotes::submit))
        .route("/{id}", get(quotes::show))
        .route("/{id}/files/{file_id}/download", get(quotes::download))
}

/// Create the upload routes router.
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/presign", post(uploads::presign))
}

/// Create the geometry routes router.
///
/// Mesh uploads may be as large as quote attachments.
pub fn geometry_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(geometry::analyze))
        .route("/validate", post(geometry::validate))
        .layer(DefaultBodyLimit::max(geometry::MAX_MESH_BYTES))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(payment::create_order))
        .route("/verify", post(payment::verify))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route("/{id}", get(orders::show))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/verify-reset-token", get(auth::verify_reset_token))
        .route("/reset-password", post(auth::reset_password))
}

/// Create the account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(user::profile).put(user::update_profile))
        .route("/orders", get(user::orders))
        .route("/quotes", get(user::quotes))
        .route(
            "/addresses",
            get(user::addresses).post(user::create_address),
        )
        .route(
            "/addresses/{id}",
            put(user::update_address).delete(user::delete_address),
        )
}

/// Create all `/api` routes.
///
/// Auth and payment endpoints get the strict limiter; everything else the
/// relaxed one.
pub fn routes(rate_limiting: RateLimiting) -> Router<AppState> {
    let sensitive = Router::new()
        .nest("/auth", auth_routes())
        .nest("/payment", payment_routes());

    let general = Router::new()
        .nest("/products", product_routes())
        .nest("/quotes", quote_routes())
        .nest("/uploads", upload_routes())
        .nest("/geometry", geometry_routes())
        .nest("/orders", order_routes())
        .nest("/user", user_routes());

    let (sensitive, general) = match rate_limiting {
        RateLimiting::Enabled => (
            sensitive.layer(auth_rate_limiter()),
            general.layer(api_rate_limiter()),
        ),
        RateLimiting::Disabled => (sensitive, general),
    };

    Router::new().nest("/api", sensitive.merge(general))
}
