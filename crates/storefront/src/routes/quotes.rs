//! Quote request route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use serde_json::{Value, json};

use akaar_core::{QuoteFileId, QuoteId};

use crate::db::QuoteRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{OptionalAuth, RequireAuth, ensure_can_view};
use crate::models::{CurrentUser, QuoteRequest};
use crate::services::quotes::{QuoteService, QuoteSubmission};
use crate::services::storage::{PRESIGN_EXPIRY, is_upload_key};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteCreated {
    pub message: &'static str,
    pub quote_number: String,
    pub quote: QuoteRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub url: String,
    pub expires_in: u64,
}

fn quote_not_found() -> AppError {
    AppError::NotFound("Quote not found".to_string())
}

/// Load a quote the viewer is allowed to see.
async fn viewable_quote(
    state: &AppState,
    id: &str,
    viewer: Option<&CurrentUser>,
) -> Result<QuoteRequest> {
    // A malformed id can't name an existing quote
    let id: QuoteId = id.parse().map_err(|_| quote_not_found())?;

    let quote = QuoteRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(quote_not_found)?;

    ensure_can_view(quote.user_id, viewer)?;
    Ok(quote)
}

/// `POST /api/quotes`
#[tracing::instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiJson(submission): ApiJson<QuoteSubmission>,
) -> Result<(StatusCode, Json<QuoteCreated>)> {
    let service = QuoteService::new(
        state.pool(),
        state.notifier(),
        state.storage().bucket(),
    );
    let quote = service.submit(submission, user.map(|u| u.id)).await?;

    Ok((
        StatusCode::CREATED,
        Json(QuoteCreated {
            message: "Quote request submitted successfully",
            quote_number: quote.quote_number.clone(),
            quote,
        }),
    ))
}

/// `GET /api/quotes`
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let quotes = QuoteService::new(state.pool(), state.notifier(), state.storage().bucket())
        .list_for_user(user.id)
        .await?;
    Ok(Json(json!({ "quotes": quotes })))
}

/// `GET /api/quotes/{id}`
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Value>> {
    let quote = viewable_quote(&state, &id, user.as_ref()).await?;
    Ok(Json(json!({ "quote": quote })))
}

/// `GET /api/quotes/{id}/files/{file_id}/download`
pub async fn download(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiPath((id, file_id)): ApiPath<(String, String)>,
) -> Result<Json<DownloadLink>> {
    let quote = viewable_quote(&state, &id, user.as_ref()).await?;

    let file = file_id
        .parse::<QuoteFileId>()
        .ok()
        .and_then(|file_id| quote.file(file_id))
        .filter(|file| file.s3_bucket == state.storage().bucket() && is_upload_key(&file.s3_key))
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let url = state.storage().presign_download(&file.s3_key).await?;

    Ok(Json(DownloadLink {
        url,
        expires_in: PRESIGN_EXPIRY.as_secs(),
    }))
}
