//! Product catalog queries.
//!
//! The storefront never writes products; rows come from the seed command or
//! back-office tooling.

use sqlx::{PgPool, Postgres, QueryBuilder};

use akaar_core::ProductId;

use super::RepositoryError;
use crate::models::Product;
use crate::models::product::ProductRow;

const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.slug, p.name, p.description, p.short_description, p.image_url,
           p.category, p.price, p.is_active, p.sort_order, p.created_at,
           m.id AS mesh_id,
           m.original_filename AS mesh_original_filename,
           m.stored_filename AS mesh_stored_filename,
           m.file_type AS mesh_file_type,
           m.file_size AS mesh_file_size,
           m.s3_key AS mesh_s3_key,
           m.s3_bucket AS mesh_s3_bucket,
           m.volume_mm3 AS mesh_volume_mm3,
           m.bounding_box_x AS mesh_bounding_box_x,
           m.bounding_box_y AS mesh_bounding_box_y,
           m.bounding_box_z AS mesh_bounding_box_z,
           m.is_processed AS mesh_is_processed
    FROM storefront.products p
    LEFT JOIN storefront.mesh_files m ON m.id = p.mesh_file_id
";

/// Sortable catalog columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    Price,
    Name,
    CreatedAt,
    /// Merchandising order (`sort_order` ascending).
    #[default]
    Featured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A normalized catalog listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    /// Exact category match, compared case-insensitively.
    pub category: Option<String>,
    /// Substring matched against name and both descriptions.
    pub search: Option<String>,
    pub sort: ProductSort,
    pub direction: SortDirection,
    /// 1-based page number.
    pub page: i64,
    pub limit: i64,
}

impl ProductFilter {
    /// `ORDER BY` clause built only from enum values.
    fn order_by(&self) -> String {
        let dir = self.direction.as_sql();
        match self.sort {
            ProductSort::Price => format!("p.price {dir}, p.id"),
            ProductSort::Name => format!("p.name {dir}, p.id"),
            ProductSort::CreatedAt => format!("p.created_at {dir}, p.id"),
            ProductSort::Featured => "p.sort_order ASC, p.created_at DESC, p.id".to_string(),
        }
    }

    const fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE p.is_active");

    if let Some(category) = &filter.category {
        qb.push(" AND lower(p.category) = lower(")
            .push_bind(category.clone())
            .push(")");
    }

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.short_description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List one page of active products and the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM storefront.products p");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut page = QueryBuilder::<Postgres>::new(PRODUCT_SELECT);
        push_filters(&mut page, filter);
        page.push(" ORDER BY ")
            .push(filter.order_by())
            .push(" LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let rows: Vec<ProductRow> = page.build_query_as().fetch_all(self.pool).await?;

        Ok((rows.into_iter().map(Product::from).collect(), total))
    }

    /// Distinct non-empty categories of active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories = sqlx::query_scalar::<_, String>(
            r"
            SELECT DISTINCT category
            FROM storefront.products
            WHERE is_active AND category IS NOT NULL AND category <> ''
            ORDER BY category
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Get an active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE p.slug = $1 AND p.is_active"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Up to `limit` other active products in the same category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(
        &self,
        category: &str,
        exclude: ProductId,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"{PRODUCT_SELECT}
            WHERE p.is_active AND p.category = $1 AND p.id <> $2
            ORDER BY p.sort_order ASC, p.created_at DESC
            LIMIT $3"
        ))
        .bind(category)
        .bind(exclude)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(sort: ProductSort, direction: SortDirection) -> ProductFilter {
        ProductFilter {
            category: None,
            search: None,
            sort,
            direction,
            page: 3,
            limit: 12,
        }
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("gear"), "gear");
    }

    #[test]
    fn test_offset() {
        assert_eq!(filter(ProductSort::Name, SortDirection::Asc).offset(), 24);

        let mut extreme = filter(ProductSort::Name, SortDirection::Asc);
        extreme.page = i64::MAX;
        extreme.limit = 100;
        assert_eq!(extreme.offset(), i64::MAX);
    }

    #[test]
    fn test_order_by() {
        assert_eq!(
            filter(ProductSort::Price, SortDirection::Desc).order_by(),
            "p.price DESC, p.id"
        );
        assert_eq!(
            filter(ProductSort::Featured, SortDirection::Desc).order_by(),
            "p.sort_order ASC, p.created_at DESC, p.id"
        );
    }

    #[test]
    fn test_offset_basic() {
        assert_eq!(filter(ProductSort::Name, SortDirection::Asc).offset(), 24);
    }

    #[test]
    fn test_push_filters_binds_user_input() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM storefront.products p");
        push_filters(
            &mut qb,
            &ProductFilter {
                category: Some("Home Decor".to_string()),
                search: Some("lamp".to_string()),
                ..filter(ProductSort::Featured, SortDirection::Asc)
            },
        );
        let sql = qb.sql();
        assert!(sql.contains("lower(p.category) = lower($1)"));
        assert!(sql.contains("p.short_description ILIKE $4"));
        assert!(!sql.contains("lamp"));
    }
}
