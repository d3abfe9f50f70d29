//! # Checkout
//!
//! Converts the user's cart into orders and empties it, all or nothing.
//!
//! [`checkout`] runs on a connection the caller already holds, normally an
//! open transaction, so it can be composed with other writes.
//! [`CheckoutService`] is the authorized entry point that owns its own
//! transaction.

use chrono::{DateTime, Utc};
use emporium_core::{Actor, CheckoutPlan, Right};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::ServiceResult;
use crate::pool::Database;
use crate::repository::{CartRepository, OrderRepository};

/// Places one order per cart line, then clears the cart.
///
/// Returns `false` when there is nothing to check out; nothing is written
/// in that case. Any error leaves the caller's transaction dirty and must
/// be answered by rolling it back.
pub async fn checkout(conn: &mut SqliteConnection, user_id: &str, now: DateTime<Utc>) -> ServiceResult<bool> {
    let Some(mut cart) = CartRepository::new(&mut *conn).load(user_id).await? else {
        debug!(user_id = %user_id, "Checkout without a cart");
        return Ok(false);
    };

    let plan = CheckoutPlan::from_cart(&cart, now);
    if plan.is_empty() {
        debug!(user_id = %user_id, "Checkout of an empty cart");
        return Ok(false);
    }

    for order in plan.orders() {
        OrderRepository::new(&mut *conn).insert(order).await?;
    }

    CartRepository::new(&mut *conn).delete_lines(cart.id()).await?;
    cart.clear();
    cart.touch(user_id, now);
    CartRepository::new(&mut *conn).write_totals(&cart).await?;

    Ok(true)
}

#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
}

impl CheckoutService {
    pub fn new(db: Database) -> Self {
        CheckoutService { db }
    }

    /// Checks out the actor's cart in its own transaction.
    pub async fn checkout(&self, actor: &Actor<'_>) -> ServiceResult<bool> {
        actor.authorize(Right::CHECKOUT)?;

        let mut tx = self.db.begin_write().await?;
        let placed = checkout(&mut tx, actor.user_id(), Utc::now()).await?;
        tx.commit().await?;

        if placed {
            info!(user_id = %actor.user_id(), "Checkout completed");
        }
        Ok(placed)
    }
}
