//! Request extractors whose rejections render as `{"error": ...}` JSON.
//!
//! Axum's built-in `Json`, `Query`, `Path` and `Multipart` reject with
//! plain-text bodies; these wrappers route the rejection through
//! [`AppError`] instead.

use axum::extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request};
use axum::Json;

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `multipart/form-data` body.
#[derive(Debug)]
pub struct ApiMultipart(pub Multipart);

impl<S> FromRequest<S> for ApiMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Multipart::from_request(req, state)
            .await
            .map(Self)
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
    }
}
