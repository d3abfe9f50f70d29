//! # Cart Repository
//!
//! Carts, their lines, and the stored copy of the derived totals.
//!
//! ## Lines Are Read Live
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart_items (cart_id, product_id, qty)                                  │
//! │       │                                                                 │
//! │       ▼  JOIN products (active only)                                    │
//! │  CartItem { product_name, price, rating, qty }  ← current price         │
//! │       │                                                                 │
//! │       ▼  emporium_core::Cart::restore()                                 │
//! │  totals recomputed ──► write_totals() ──► carts.total_*                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines of a deactivated product stay in `cart_items` but are not part of
//! the cart: they are not counted and not ordered.

use chrono::{DateTime, Utc};
use emporium_core::{Cart, CartHeader, CartItem, CartTotals, Money};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct CartHeaderRow {
    id: String,
    user_id: String,
    created_by: Option<String>,
    created_on: DateTime<Utc>,
    updated_by: Option<String>,
    updated_on: DateTime<Utc>,
}

impl From<CartHeaderRow> for CartHeader {
    fn from(row: CartHeaderRow) -> Self {
        CartHeader {
            id: row.id,
            user_id: row.user_id,
            created_by: row.created_by,
            created_on: row.created_on,
            updated_by: row.updated_by,
            updated_on: row.updated_on,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    product_id: String,
    product_name: String,
    price_cents: i64,
    rating: Option<i64>,
    qty: i64,
}

impl From<CartLineRow> for CartItem {
    fn from(row: CartLineRow) -> Self {
        CartItem {
            product_id: row.product_id,
            product_name: row.product_name,
            price: Money::from_cents(row.price_cents),
            rating: row.rating,
            qty: row.qty,
        }
    }
}

/// Repository for cart database operations.
#[derive(Debug)]
pub struct CartRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> CartRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        CartRepository { conn }
    }

    pub async fn find_by_user(&mut self, user_id: &str) -> DbResult<Option<CartHeader>> {
        let row = sqlx::query_as::<_, CartHeaderRow>(
            r#"
            SELECT id, user_id, created_by, created_on, updated_by, updated_on
            FROM carts
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(CartHeader::from))
    }

    /// Lookup-or-create of the user's single cart.
    ///
    /// Starts with a write, so inside a transaction it takes the SQLite write
    /// lock before anything is read.
    pub async fn ensure_for_user(&mut self, user_id: &str, now: DateTime<Utc>) -> DbResult<CartHeader> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO carts (
                id, user_id, total_items, total_cost_cents,
                created_by, created_on, updated_by, updated_on
            ) VALUES (?1, ?2, 0, 0, ?2, ?3, NULL, ?3)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(now)
        .execute(&mut *self.conn)
        .await?;

        if inserted.rows_affected() > 0 {
            debug!(user_id = %user_id, "Created cart");
        }

        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("Cart", user_id))
    }

    /// Every counted line of the cart, joined with the current product row.
    pub async fn load_lines(&mut self, cart_id: &str) -> DbResult<Vec<CartItem>> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r#"
            SELECT ci.product_id, p.name AS product_name, p.price_cents, p.rating, ci.qty
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id AND p.status = 'active'
            WHERE ci.cart_id = ?1
            ORDER BY ci.created_on, ci.product_id
            "#,
        )
        .bind(cart_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    /// Header plus live lines, totals recomputed.
    pub async fn load(&mut self, user_id: &str) -> DbResult<Option<Cart>> {
        let Some(header) = self.find_by_user(user_id).await? else {
            return Ok(None);
        };
        let lines = self.load_lines(&header.id).await?;
        Ok(Some(Cart::restore(header, lines)))
    }

    /// Sets a line's quantity, inserting the line if needed.
    pub async fn upsert_line(
        &mut self,
        cart_id: &str,
        product_id: &str,
        qty: i64,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(cart_id = %cart_id, product_id = %product_id, qty, "Upserting cart line");

        sqlx::query(
            r#"
            INSERT INTO cart_items (cart_id, product_id, qty, created_on, updated_on)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(cart_id, product_id)
            DO UPDATE SET qty = excluded.qty, updated_on = excluded.updated_on
            "#,
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(qty)
        .bind(now)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Returns whether a line was deleted.
    pub async fn delete_line(&mut self, cart_id: &str, product_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1 AND product_id = ?2")
            .bind(cart_id)
            .bind(product_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every line, counted or not. Returns the number deleted.
    pub async fn delete_lines(&mut self, cart_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(cart_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Persists the cart's derived totals and audit columns.
    pub async fn write_totals(&mut self, cart: &Cart) -> DbResult<()> {
        debug!(
            cart_id = %cart.id(),
            total_items = cart.total_items(),
            total_cost = %cart.total_cost(),
            "Writing cart totals"
        );

        let result = sqlx::query(
            r#"
            UPDATE carts
            SET total_items = ?2, total_cost_cents = ?3, updated_by = ?4, updated_on = ?5
            WHERE id = ?1
            "#,
        )
        .bind(cart.id())
        .bind(cart.total_items())
        .bind(cart.total_cost().cents())
        .bind(&cart.header.updated_by)
        .bind(cart.header.updated_on)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart", cart.id()));
        }
        Ok(())
    }

    /// The totals as stored in the `carts` row.
    pub async fn stored_totals(&mut self, cart_id: &str) -> DbResult<CartTotals> {
        let (total_items, total_cost_cents): (i64, i64) =
            sqlx::query_as("SELECT total_items, total_cost_cents FROM carts WHERE id = ?1")
                .bind(cart_id)
                .fetch_optional(&mut *self.conn)
                .await?
                .ok_or_else(|| DbError::not_found("Cart", cart_id))?;

        Ok(CartTotals {
            total_items,
            total_cost: Money::from_cents(total_cost_cents),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::ProductRepository;
    use crate::repository::user::{tests::sample_user, UserRepository};
    use emporium_core::Product;

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        UserRepository::new(&mut conn)
            .insert(&sample_user("u1", "u1@example.com"))
            .await
            .unwrap();

        let mut repo = CartRepository::new(&mut conn);
        let first = repo.ensure_for_user("u1", Utc::now()).await.unwrap();
        let second = repo.ensure_for_user("u1", Utc::now()).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_lines_follow_product_state() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let now = Utc::now();
        UserRepository::new(&mut conn)
            .insert(&sample_user("u1", "u1@example.com"))
            .await
            .unwrap();
        let pen = Product::new("Pen", Money::from_cents(100), now);
        let ink = Product::new("Ink", Money::from_cents(40), now);
        ProductRepository::new(&mut conn).insert(&pen).await.unwrap();
        ProductRepository::new(&mut conn).insert(&ink).await.unwrap();

        let header = CartRepository::new(&mut conn).ensure_for_user("u1", now).await.unwrap();
        let mut repo = CartRepository::new(&mut conn);
        repo.upsert_line(&header.id, &pen.id, 2, now).await.unwrap();
        repo.upsert_line(&header.id, &ink.id, 1, now).await.unwrap();
        repo.upsert_line(&header.id, &pen.id, 3, now).await.unwrap();

        let cart = repo.load("u1").await.unwrap().unwrap();
        assert_eq!(cart.total_items(), 4);
        assert_eq!(cart.total_cost().cents(), 340);

        ProductRepository::new(&mut conn)
            .deactivate(&ink.id, "admin", now)
            .await
            .unwrap();
        let cart = CartRepository::new(&mut conn).load("u1").await.unwrap().unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_cost().cents(), 300);
    }

    #[tokio::test]
    async fn test_write_and_read_totals() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let now = Utc::now();
        UserRepository::new(&mut conn)
            .insert(&sample_user("u1", "u1@example.com"))
            .await
            .unwrap();
        let pen = Product::new("Pen", Money::from_cents(100), now);
        ProductRepository::new(&mut conn).insert(&pen).await.unwrap();

        let mut repo = CartRepository::new(&mut conn);
        let header = repo.ensure_for_user("u1", now).await.unwrap();
        let mut cart = Cart::from_header(header);
        cart.add_or_update_item(&pen, 2).unwrap();
        repo.write_totals(&cart).await.unwrap();

        let stored = repo.stored_totals(cart.id()).await.unwrap();
        assert_eq!(stored, cart.totals());
        assert!(repo.load("nobody").await.unwrap().is_none());
    }
}
