//! # Cart Service
//!
//! Persisted cart mutations.
//!
//! ```text
//! add_or_update_item(actor, product_id, qty)
//!   ├── authorize UPDATE_CART, validate qty          (no store access)
//!   ├── BEGIN
//!   ├── ensure_for_user          ← write first: takes the write lock
//!   ├── product active?          ← NotFound(Product), rollback
//!   ├── upsert_line(qty)         ← replace, never increment
//!   ├── load_lines               ← every line, current prices
//!   ├── Cart::try_restore        ← totals recomputed from scratch,
//!   │                              OutOfRange + rollback on overflow
//!   ├── write_totals
//!   └── COMMIT
//! ```
//!
//! Totals are never carried from one request to the next, so two racing
//! mutations of the same cart end with totals that match the committed
//! line set.

use chrono::Utc;
use emporium_core::validation::validate_quantity;
use emporium_core::{Actor, Cart, CartHeader, CoreError, Right};
use sqlx::SqliteConnection;
use tracing::info;

use crate::error::ServiceResult;
use crate::pool::Database;
use crate::repository::{CartRepository, ProductRepository};

#[derive(Debug, Clone)]
pub struct CartService {
    db: Database,
}

impl CartService {
    pub fn new(db: Database) -> Self {
        CartService { db }
    }

    /// The actor's cart with live lines.
    ///
    /// ## Errors
    /// `NotFound(Cart)` if the user never created one.
    pub async fn get_cart(&self, actor: &Actor<'_>) -> ServiceResult<Cart> {
        actor.authorize(Right::VIEW_CART)?;

        let mut conn = self.db.acquire().await?;
        let cart = CartRepository::new(&mut conn)
            .load(actor.user_id())
            .await?
            .ok_or_else(|| CoreError::not_found("Cart", actor.user_id()))?;
        Ok(cart)
    }

    /// Sets the quantity of a product in the actor's cart, creating the cart
    /// on first use.
    ///
    /// ## Errors
    /// - `InvalidQuantity` for `qty <= 0`, before any store access
    /// - `NotFound(Product)` for an unknown or inactive product
    /// - `OutOfRange` when the cart totals would overflow
    pub async fn add_or_update_item(&self, actor: &Actor<'_>, product_id: &str, qty: i64) -> ServiceResult<Cart> {
        actor.authorize(Right::UPDATE_CART)?;
        validate_quantity(qty)?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let header = CartRepository::new(&mut tx)
            .ensure_for_user(actor.user_id(), now)
            .await?;

        ProductRepository::new(&mut tx)
            .find(product_id, true)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        CartRepository::new(&mut tx)
            .upsert_line(&header.id, product_id, qty, now)
            .await?;

        let lines = CartRepository::new(&mut tx).load_lines(&header.id).await?;
        let mut cart = Cart::try_restore(header, lines)?;
        cart.touch(actor.user_id(), now);
        CartRepository::new(&mut tx).write_totals(&cart).await?;
        tx.commit().await?;

        info!(
            user_id = %actor.user_id(),
            product_id = %product_id,
            qty,
            total_items = cart.total_items(),
            "Cart line set"
        );
        Ok(cart)
    }

    /// Removes a product's line. A missing line is not an error.
    ///
    /// Returns `None` when the user has no cart; none is created.
    pub async fn remove_item(&self, actor: &Actor<'_>, product_id: &str) -> ServiceResult<Option<Cart>> {
        actor.authorize(Right::UPDATE_CART)?;

        let mut tx = self.db.begin_write().await?;
        let Some(header) = CartRepository::new(&mut tx).find_by_user(actor.user_id()).await? else {
            return Ok(None);
        };

        let removed = CartRepository::new(&mut tx)
            .delete_line(&header.id, product_id)
            .await?;

        let cart = recompute(&mut tx, header, actor.user_id()).await?;
        tx.commit().await?;

        info!(user_id = %actor.user_id(), product_id = %product_id, removed, "Cart line removed");
        Ok(Some(cart))
    }

    /// Deletes every line and zeroes the totals.
    ///
    /// Returns `None` when the user has no cart.
    pub async fn clear_cart(&self, actor: &Actor<'_>) -> ServiceResult<Option<Cart>> {
        actor.authorize(Right::UPDATE_CART)?;

        let mut tx = self.db.begin_write().await?;
        let Some(header) = CartRepository::new(&mut tx).find_by_user(actor.user_id()).await? else {
            return Ok(None);
        };

        CartRepository::new(&mut tx).delete_lines(&header.id).await?;
        let cart = recompute(&mut tx, header, actor.user_id()).await?;
        tx.commit().await?;

        info!(user_id = %actor.user_id(), "Cart cleared");
        Ok(Some(cart))
    }
}

/// Re-reads every line, rebuilds the aggregate and stores its totals.
async fn recompute(conn: &mut SqliteConnection, header: CartHeader, actor_id: &str) -> ServiceResult<Cart> {
    let lines = CartRepository::new(&mut *conn).load_lines(&header.id).await?;

    let mut cart = Cart::restore(header, lines);
    cart.touch(actor_id, Utc::now());

    CartRepository::new(&mut *conn).write_totals(&cart).await?;
    Ok(cart)
}
