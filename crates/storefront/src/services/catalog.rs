//! Product catalog browsing.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::{ProductFilter, ProductRepository, ProductSort, RepositoryError, SortDirection};
use crate::models::Product;

/// Default page size.
pub const DEFAULT_LIMIT: i64 = 12;
/// Largest accepted page size.
pub const MAX_LIMIT: i64 = 100;
/// Largest accepted page number.
pub const MAX_PAGE: i64 = 10_000;
/// Related products shown on a detail page.
pub const RELATED_LIMIT: i64 = 4;

/// Raw listing query string. Everything is optional and leniently parsed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl CatalogQuery {
    /// Normalize into a repository filter.
    #[must_use]
    pub fn to_filter(&self) -> ProductFilter {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_PAGE);

        let limit = self
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);

        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
            .map(str::to_string);

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let sort = match self.sort_by.as_deref() {
            Some("price") => ProductSort::Price,
            Some("name") => ProductSort::Name,
            Some("createdAt") => ProductSort::CreatedAt,
            _ => ProductSort::Featured,
        };

        let direction = match self.sort_order.as_deref() {
            Some(order) if order.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        };

        ProductFilter {
            category,
            search,
            sort,
            direction,
            page,
            limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    #[must_use]
    pub const fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// One page of the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ProductListing {
    pub products: Vec<Product>,
    pub pagination: Pagination,
    pub categories: Vec<String>,
}

/// A product page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub product: Product,
    pub related_products: Vec<Product>,
}

/// Catalog reads.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
        }
    }

    /// List a page of active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, query: &CatalogQuery) -> Result<ProductListing, RepositoryError> {
        let filter = query.to_filter();
        let (products, total) = self.products.list(&filter).await?;
        let categories = self.products.categories().await?;

        Ok(ProductListing {
            products,
            pagination: Pagination::new(filter.page, filter.limit, total),
            categories,
        })
    }

    /// An active product by slug plus a few from the same category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn detail(&self, slug: &str) -> Result<Option<ProductDetail>, RepositoryError> {
        let Some(product) = self.products.get_active_by_slug(slug).await? else {
            return Ok(None);
        };

        let related_products = match product.category.as_deref() {
            Some(category) if !category.is_empty() => {
                self.products
                    .related(category, product.id, RELATED_LIMIT)
                    .await?
            }
            _ => Vec::new(),
        };

        Ok(Some(ProductDetail {
            product,
            related_products,
        }))
    }
}
