//! Order repository.
//!
//! Orders are inserted together with their items in one transaction; a
//! partially written order is never visible.

use std::collections::HashMap;

use sqlx::PgPool;
use sqlx::types::Json;

use akaar_core::{OrderId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::order::OrderRow;
use crate::models::{NewOrder, Order, OrderItem};

const ORDER_COLUMNS: &str = r"
    id, order_number, user_id, status, payment_status, payment_method,
    subtotal, shipping_cost, tax, total, shipping_method, shipping_address,
    razorpay_order_id, razorpay_payment_id, email, phone, notes, created_at
";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, name, slug, material, quantity, unit_price, total_price";

/// Repository for orders and order items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and all of its items atomically.
    ///
    /// Item product ids that no longer exist in the catalog are stored as
    /// `NULL`; the line keeps its name and price snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the gateway payment id or the
    /// order number is already recorded.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_items(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO storefront.orders (
                order_number, user_id, status, payment_status, payment_method,
                subtotal, shipping_cost, tax, total, shipping_method, shipping_address,
                razorpay_order_id, razorpay_payment_id, razorpay_signature,
                email, phone, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(&order.order_number)
        .bind(order.user_id)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(&order.payment_method)
        .bind(order.subtotal)
        .bind(order.shipping_cost)
        .bind(order.tax)
        .bind(order.total)
        .bind(order.shipping_method.as_deref())
        .bind(Json(&order.shipping_address))
        .bind(&order.razorpay_order_id)
        .bind(&order.razorpay_payment_id)
        .bind(&order.razorpay_signature)
        .bind(&order.email)
        .bind(order.phone.as_deref())
        .bind(order.notes.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "order for this payment"))?;

        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let inserted = sqlx::query_as::<_, OrderItem>(&format!(
                r"
                INSERT INTO storefront.order_items (
                    order_id, product_id, name, slug, material, quantity, unit_price, total_price
                )
                VALUES (
                    $1, (SELECT id FROM storefront.products WHERE id = $2),
                    $3, $4, $5, $6, $7, $8
                )
                RETURNING {ITEM_COLUMNS}
                "
            ))
            .bind(row.id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.slug.as_deref())
            .bind(item.material.as_deref())
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .fetch_one(&mut *tx)
            .await?;
            items.push(inserted);
        }

        tx.commit().await?;

        Ok(row.with_items(items))
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Get the order recorded for a gateway payment id, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_payment_id(&self, payment_id: &str) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.orders WHERE razorpay_payment_id = $1"
        ))
        .bind(payment_id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// All orders placed by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM storefront.orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// Load items for a batch of orders with a single query.
    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<OrderId> = rows.iter().map(|r| r.id).collect();
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            r"
            SELECT {ITEM_COLUMNS} FROM storefront.order_items
            WHERE order_id = ANY($1)
            ORDER BY name, id
            "
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                row.with_items(items)
            })
            .collect())
    }
}
