//! Catalog route handlers.

use axum::{Json, extract::State};

use crate::error::{AppError, Result};
use crate::extract::{ApiPath, ApiQuery};
use crate::services::catalog::{CatalogQuery, CatalogService, ProductDetail, ProductListing};
use crate::state::AppState;

/// `GET /api/products`
#[tracing::instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CatalogQuery>,
) -> Result<Json<ProductListing>> {
    let listing = CatalogService::new(state.pool()).list(&query).await?;
    Ok(Json(listing))
}

/// `GET /api/products/{slug}`
#[tracing::instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<ProductDetail>> {
    CatalogService::new(state.pool())
        .detail(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}
