//! STL analysis route handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;

use crate::error::{AppError, Result};
use crate::extract::ApiMultipart;
use crate::services::geometry::{self, GeometryError, Mesh, ModelAnalysis, ValidationReport};
use crate::services::storage::{MAX_UPLOAD_BYTES, StorageError};

/// Request body limit for mesh uploads, with room for the multipart framing.
pub const MAX_MESH_BYTES: usize = 101 * 1024 * 1024;

fn multipart_error(err: &MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        StorageError::TooLarge {
            max: MAX_UPLOAD_BYTES,
        }
        .into()
    } else {
        AppError::BadRequest(err.body_text())
    }
}

fn geometry_error(action: &str, err: GeometryError) -> AppError {
    match err {
        GeometryError::Parse(reason) => AppError::BadRequest(format!("Error {action} model: {reason}")),
        other => AppError::BadRequest(other.to_string()),
    }
}

/// Read the `file` field, rejecting unsupported extensions before the body.
async fn mesh_upload(ApiMultipart(mut multipart): ApiMultipart) -> Result<Bytes> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        geometry::check_extension(&filename).map_err(|e| geometry_error("reading", e))?;

        let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
        if bytes.is_empty() {
            return Err(StorageError::EmptyFile.into());
        }

        tracing::debug!(filename = %filename, size = bytes.len(), "Mesh received");
        return Ok(bytes);
    }

    Err(AppError::BadRequest("File is required".to_string()))
}

/// Parse and inspect a mesh off the async runtime.
async fn inspect<T, F>(bytes: Bytes, action: &'static str, check: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Mesh) -> std::result::Result<T, GeometryError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || Mesh::from_stl(&bytes).and_then(|mesh| check(&mesh)))
        .await
        .map_err(|e| AppError::Internal(format!("mesh analysis task failed: {e}")))?
        .map_err(|e| geometry_error(action, e))
}

/// `POST /api/geometry/analyze`
#[tracing::instrument(skip_all)]
pub async fn analyze(upload: ApiMultipart) -> Result<Json<ModelAnalysis>> {
    let bytes = mesh_upload(upload).await?;
    let analysis = inspect(bytes, "analyzing", geometry::analyze).await?;

    tracing::info!(
        triangles = analysis.triangle_count,
        watertight = analysis.is_watertight,
        "Mesh analyzed"
    );

    Ok(Json(analysis))
}

/// `POST /api/geometry/validate`
#[tracing::instrument(skip_all)]
pub async fn validate(upload: ApiMultipart) -> Result<Json<ValidationReport>> {
    let bytes = mesh_upload(upload).await?;
    let report = inspect(bytes, "validating", |mesh| Ok(geometry::validate(mesh))).await?;
    Ok(Json(report))
}
