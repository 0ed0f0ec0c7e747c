//! Presigned upload URLs for quote attachments.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignResponse {
    pub upload_url: String,
    pub key: String,
    pub bucket: String,
    pub expires_in: u64,
}

/// `POST /api/uploads/presign`
#[tracing::instrument(skip(state))]
pub async fn presign(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PresignRequest>,
) -> Result<Json<PresignResponse>> {
    let filename = request
        .filename
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Filename is required".to_string()))?;
    let content_type = request
        .content_type
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let file_size = request.file_size.unwrap_or_default();

    let upload = state
        .storage()
        .presign_upload(&filename, &content_type, file_size)
        .await?;

    Ok(Json(PresignResponse {
        upload_url: upload.upload_url,
        key: upload.key,
        bucket: upload.bucket,
        expires_in: upload.expires_in,
    }))
}
