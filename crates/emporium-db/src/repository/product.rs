//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! Deleting a product is a soft delete (`status = 'inactive'`): orders keep
//! their foreign key, and cart lines pointing at it stop counting.

use chrono::{DateTime, Utc};
use emporium_core::{Money, Product, ProductStatus};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price_cents: i64,
    rating: Option<i64>,
    status: ProductStatus,
    created_by: Option<String>,
    created_on: DateTime<Utc>,
    updated_by: Option<String>,
    updated_on: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price: Money::from_cents(row.price_cents),
            rating: row.rating,
            status: row.status,
            created_by: row.created_by,
            created_on: row.created_on,
            updated_by: row.updated_by,
            updated_on: row.updated_on,
        }
    }
}

/// Repository for product database operations.
#[derive(Debug)]
pub struct ProductRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ProductRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ProductRepository { conn }
    }

    /// Gets a product by ID.
    ///
    /// ## Arguments
    /// * `only_active` - hide soft-deleted products
    pub async fn find(&mut self, id: &str, only_active: bool) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, price_cents, rating, status,
                   created_by, created_on, updated_by, updated_on
            FROM products
            WHERE id = ?1 AND (?2 = 0 OR status = 'active')
            "#,
        )
        .bind(id)
        .bind(only_active)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Finds a product with this exact name, optionally ignoring one id.
    pub async fn find_by_name(&mut self, name: &str, exclude_id: Option<&str>) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, price_cents, rating, status,
                   created_by, created_on, updated_by, updated_on
            FROM products
            WHERE name = ?1 AND (?2 IS NULL OR id <> ?2)
            "#,
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Lists products by name.
    pub async fn list(&mut self, only_active: bool) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, price_cents, rating, status,
                   created_by, created_on, updated_by, updated_on
            FROM products
            WHERE ?1 = 0 OR status = 'active'
            ORDER BY name
            "#,
        )
        .bind(only_active)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn insert(&mut self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, price_cents, rating, status,
                created_by, created_on, updated_by, updated_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.rating)
        .bind(product.status)
        .bind(&product.created_by)
        .bind(product.created_on)
        .bind(&product.updated_by)
        .bind(product.updated_on)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn update(&mut self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?2, price_cents = ?3, rating = ?4, status = ?5,
                updated_by = ?6, updated_on = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.rating)
        .bind(product.status)
        .bind(&product.updated_by)
        .bind(product.updated_on)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }
        Ok(())
    }

    /// Soft-deletes a product. Returns whether an active product was found.
    pub async fn deactivate(&mut self, id: &str, by: &str, now: DateTime<Utc>) -> DbResult<bool> {
        debug!(id = %id, "Deactivating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET status = 'inactive', updated_by = ?2, updated_on = ?3
            WHERE id = ?1 AND status = 'active'
            "#,
        )
        .bind(id)
        .bind(by)
        .bind(now)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets the price of a product directly.
    pub async fn set_price(&mut self, id: &str, price: Money, now: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET price_cents = ?2, updated_on = ?3 WHERE id = ?1")
            .bind(id)
            .bind(price.cents())
            .bind(now)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    pub async fn count(&mut self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE status = 'active'")
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_find_and_soft_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ProductRepository::new(&mut conn);

        let now = Utc::now();
        let product = Product::new("Pen", Money::from_cents(150), now);
        repo.insert(&product).await.unwrap();

        let found = repo.find(&product.id, true).await.unwrap().unwrap();
        assert_eq!(found.price.cents(), 150);
        assert_eq!(repo.count().await.unwrap(), 1);

        assert!(repo.deactivate(&product.id, "admin", now).await.unwrap());
        assert!(!repo.deactivate(&product.id, "admin", now).await.unwrap());
        assert!(repo.find(&product.id, true).await.unwrap().is_none());
        assert!(repo.find(&product.id, false).await.unwrap().is_some());
        assert!(repo.list(true).await.unwrap().is_empty());
        assert_eq!(repo.list(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_name_excludes_self() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ProductRepository::new(&mut conn);

        let product = Product::new("Pen", Money::from_cents(150), Utc::now());
        repo.insert(&product).await.unwrap();

        assert!(repo.find_by_name("Pen", None).await.unwrap().is_some());
        assert!(repo.find_by_name("Pen", Some(&product.id)).await.unwrap().is_none());

        let dup = Product::new("Pen", Money::from_cents(1), Utc::now());
        let err = repo.insert(&dup).await.unwrap_err();
        assert_eq!(err.violated_field(), Some("products.name"));
    }
}
