//! Catalog products and their mesh files.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use akaar_core::{MeshFileId, ProductId};

/// Metadata for an uploaded 3D model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshFile {
    pub id: MeshFileId,
    pub original_filename: String,
    pub stored_filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub s3_key: String,
    pub s3_bucket: String,
    pub volume_mm3: Option<f64>,
    pub bounding_box_x: Option<f64>,
    pub bounding_box_y: Option<f64>,
    pub bounding_box_z: Option<f64>,
    pub is_processed: bool,
}

/// A catalog product with its (optional) mesh file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub mesh_file: Option<MeshFile>,
}

/// Flat row produced by `products LEFT JOIN mesh_files`.
#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub mesh_id: Option<MeshFileId>,
    pub mesh_original_filename: Option<String>,
    pub mesh_stored_filename: Option<String>,
    pub mesh_file_type: Option<String>,
    pub mesh_file_size: Option<i64>,
    pub mesh_s3_key: Option<String>,
    pub mesh_s3_bucket: Option<String>,
    pub mesh_volume_mm3: Option<f64>,
    pub mesh_bounding_box_x: Option<f64>,
    pub mesh_bounding_box_y: Option<f64>,
    pub mesh_bounding_box_z: Option<f64>,
    pub mesh_is_processed: Option<bool>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let mesh_file = match (
            row.mesh_id,
            row.mesh_original_filename,
            row.mesh_stored_filename,
            row.mesh_file_type,
            row.mesh_s3_key,
            row.mesh_s3_bucket,
        ) {
            (
                Some(id),
                Some(original_filename),
                Some(stored_filename),
                Some(file_type),
                Some(s3_key),
                Some(s3_bucket),
            ) => Some(MeshFile {
                id,
                original_filename,
                stored_filename,
                file_type,
                file_size: row.mesh_file_size.unwrap_or_default(),
                s3_key,
                s3_bucket,
                volume_mm3: row.mesh_volume_mm3,
                bounding_box_x: row.mesh_bounding_box_x,
                bounding_box_y: row.mesh_bounding_box_y,
                bounding_box_z: row.mesh_bounding_box_z,
                is_processed: row.mesh_is_processed.unwrap_or_default(),
            }),
            _ => None,
        };

        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            short_description: row.short_description,
            image_url: row.image_url,
            category: row.category,
            price: row.price,
            is_active: row.is_active,
            sort_order: row.sort_order,
            created_at: row.created_at,
            mesh_file,
        }
    }
}
