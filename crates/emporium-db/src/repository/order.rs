//! # Order Repository
//!
//! Orders are written by checkout, one row per cart line, and read back
//! joined with their product.

use chrono::{DateTime, Utc};
use emporium_core::{Money, Order, OrderDetail, OrderStatus};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct OrderDetailRow {
    id: String,
    user_id: String,
    product_id: String,
    qty: i64,
    status: OrderStatus,
    created_by: Option<String>,
    created_on: DateTime<Utc>,
    updated_by: Option<String>,
    updated_on: DateTime<Utc>,
    product_name: String,
    product_price_cents: i64,
}

impl From<OrderDetailRow> for OrderDetail {
    fn from(row: OrderDetailRow) -> Self {
        OrderDetail {
            order: Order {
                id: row.id,
                user_id: row.user_id,
                product_id: row.product_id,
                qty: row.qty,
                status: row.status,
                created_by: row.created_by,
                created_on: row.created_on,
                updated_by: row.updated_by,
                updated_on: row.updated_on,
            },
            product_name: row.product_name,
            product_price: Money::from_cents(row.product_price_cents),
        }
    }
}

const DETAIL_COLUMNS: &str = r#"
    SELECT o.id, o.user_id, o.product_id, o.qty, o.status,
           o.created_by, o.created_on, o.updated_by, o.updated_on,
           p.name AS product_name, p.price_cents AS product_price_cents
    FROM orders o
    JOIN products p ON p.id = o.product_id
"#;

/// Repository for order database operations.
#[derive(Debug)]
pub struct OrderRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> OrderRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        OrderRepository { conn }
    }

    pub async fn insert(&mut self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, product_id = %order.product_id, qty = order.qty, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, product_id, qty, status,
                created_by, created_on, updated_by, updated_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(&order.product_id)
        .bind(order.qty)
        .bind(order.status)
        .bind(&order.created_by)
        .bind(order.created_on)
        .bind(&order.updated_by)
        .bind(order.updated_on)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// A user's orders, newest first.
    pub async fn list_for_user(&mut self, user_id: &str) -> DbResult<Vec<OrderDetail>> {
        let sql = format!("{DETAIL_COLUMNS} WHERE o.user_id = ?1 ORDER BY o.created_on DESC, o.id");
        let rows = sqlx::query_as::<_, OrderDetailRow>(&sql)
            .bind(user_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows.into_iter().map(OrderDetail::from).collect())
    }

    pub async fn find_detail(&mut self, id: &str) -> DbResult<Option<OrderDetail>> {
        let sql = format!("{DETAIL_COLUMNS} WHERE o.id = ?1");
        let row = sqlx::query_as::<_, OrderDetailRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(row.map(OrderDetail::from))
    }

    /// Returns whether a row was deleted.
    pub async fn delete(&mut self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_for_user(&mut self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }
}
