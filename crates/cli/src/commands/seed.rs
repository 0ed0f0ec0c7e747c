//! Seed the catalog with starter products.
//!
//! Each product is linked to a processed mesh file. Seeding is idempotent:
//! mesh files are matched on their S3 key and products on their slug, and
//! existing rows are left untouched.

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

use akaar_core::{MeshFileId, ProductId};

const MESH_BUCKET: &str = "akaar-meshes";

struct SeedMesh {
    filename: &'static str,
    file_size: i64,
    volume_mm3: f64,
    bounding_box: (f64, f64, f64),
}

struct SeedProduct {
    slug: &'static str,
    name: &'static str,
    description: &'static str,
    short_description: &'static str,
    image_url: &'static str,
    category: &'static str,
    /// Price in paise.
    price_minor: i64,
    sort_order: i32,
    mesh: SeedMesh,
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        slug: "replacement-gear",
        name: "Replacement Gear",
        description: "A standard replacement gear for small machinery. Highly durable and \
                      printed with precision for a perfect fit. Ideal for repairs and DIY projects.",
        short_description: "Durable 50mm replacement gear.",
        image_url: "/placeholders/gear.png",
        category: "Mechanical Parts",
        price_minor: 29_900,
        sort_order: 1,
        mesh: SeedMesh {
            filename: "gear.stl",
            file_size: 1024,
            volume_mm3: 10_000.0,
            bounding_box: (50.0, 50.0, 10.0),
        },
    },
    SeedProduct {
        slug: "minimalist-phone-stand",
        name: "Minimalist Phone Stand",
        description: "A sleek and minimalist phone stand, perfect for your desk. Holds your \
                      phone vertically or horizontally for easy viewing. Lightweight yet sturdy.",
        short_description: "Sleek and sturdy phone stand.",
        image_url: "/placeholders/phone-stand.png",
        category: "Desk Accessories",
        price_minor: 49_900,
        sort_order: 2,
        mesh: SeedMesh {
            filename: "phone-stand.stl",
            file_size: 2048,
            volume_mm3: 25_000.0,
            bounding_box: (80.0, 100.0, 60.0),
        },
    },
    SeedProduct {
        slug: "voronoi-lamp-shade",
        name: "Voronoi Lamp Shade",
        description: "A Voronoi pattern lamp shade that casts striking light patterns. \
                      A centerpiece for any room. Lamp base and bulb not included.",
        short_description: "Stylish Voronoi pattern lamp shade.",
        image_url: "/placeholders/voronoi-lamp.png",
        category: "Home Decor",
        price_minor: 149_900,
        sort_order: 3,
        mesh: SeedMesh {
            filename: "voronoi-lamp.stl",
            file_size: 4096,
            volume_mm3: 150_000.0,
            bounding_box: (120.0, 120.0, 200.0),
        },
    },
];

/// Seed the starter catalog.
///
/// Returns the number of products that were newly inserted.
///
/// # Errors
///
/// Returns an error if the database URL is missing or a query fails.
pub async fn catalog() -> Result<usize, Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    info!("Connecting to storefront database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    let mut inserted = 0;
    for product in PRODUCTS {
        let mesh_id = upsert_mesh(&pool, &product.mesh).await?;
        if insert_product(&pool, product, mesh_id).await? {
            info!(slug = product.slug, "Seeded product");
            inserted += 1;
        } else {
            info!(slug = product.slug, "Product already exists, skipping");
        }
    }

    pool.close().await;
    Ok(inserted)
}

async fn upsert_mesh(pool: &PgPool, mesh: &SeedMesh) -> Result<MeshFileId, sqlx::Error> {
    let s3_key = format!("product-meshes/{}", mesh.filename);
    let (x, y, z) = mesh.bounding_box;

    // DO UPDATE on a no-op column so RETURNING yields the existing row
    sqlx::query_scalar(
        r"
        INSERT INTO storefront.mesh_files (
            original_filename, stored_filename, file_type, file_size, s3_key, s3_bucket,
            volume_mm3, bounding_box_x, bounding_box_y, bounding_box_z, is_processed
        )
        VALUES ($1, $1, 'STL', $2, $3, $4, $5, $6, $7, $8, true)
        ON CONFLICT (s3_key) DO UPDATE SET s3_key = EXCLUDED.s3_key
        RETURNING id
        ",
    )
    .bind(mesh.filename)
    .bind(mesh.file_size)
    .bind(&s3_key)
    .bind(MESH_BUCKET)
    .bind(mesh.volume_mm3)
    .bind(x)
    .bind(y)
    .bind(z)
    .fetch_one(pool)
    .await
}

async fn insert_product(
    pool: &PgPool,
    product: &SeedProduct,
    mesh_id: MeshFileId,
) -> Result<bool, sqlx::Error> {
    let inserted: Option<ProductId> = sqlx::query_scalar(
        r"
        INSERT INTO storefront.products (
            slug, name, description, short_description, image_url, category,
            price, is_active, sort_order, mesh_file_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, true, $8, $9)
        ON CONFLICT (slug) DO NOTHING
        RETURNING id
        ",
    )
    .bind(product.slug)
    .bind(product.name)
    .bind(product.description)
    .bind(product.short_description)
    .bind(product.image_url)
    .bind(product.category)
    .bind(Decimal::new(product.price_minor, 2))
    .bind(product.sort_order)
    .bind(mesh_id)
    .fetch_optional(pool)
    .await?;

    Ok(inserted.is_some())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_seed_slugs_and_keys_are_unique() {
        let slugs: HashSet<_> = PRODUCTS.iter().map(|p| p.slug).collect();
        let meshes: HashSet<_> = PRODUCTS.iter().map(|p| p.mesh.filename).collect();
        assert_eq!(slugs.len(), PRODUCTS.len());
        assert_eq!(meshes.len(), PRODUCTS.len());
    }

    #[test]
    fn test_seed_prices_are_positive() {
        assert!(PRODUCTS.iter().all(|p| p.price_minor > 0));
        assert_eq!(Decimal::new(29_900, 2).to_string(), "299.00");
    }
}
