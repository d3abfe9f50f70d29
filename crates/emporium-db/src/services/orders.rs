//! Order history.

use emporium_core::{Actor, CoreError, OrderDetail, Right};
use tracing::info;

use crate::error::ServiceResult;
use crate::pool::Database;
use crate::repository::OrderRepository;

#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
}

impl OrderService {
    pub fn new(db: Database) -> Self {
        OrderService { db }
    }

    /// The actor's own orders, newest first.
    pub async fn list_orders(&self, actor: &Actor<'_>) -> ServiceResult<Vec<OrderDetail>> {
        actor.authorize(Right::VIEW_ORDERS)?;

        let mut conn = self.db.acquire().await?;
        Ok(OrderRepository::new(&mut conn).list_for_user(actor.user_id()).await?)
    }

    /// An order of the actor's, or of anyone's with `MANAGE_ORDERS`.
    ///
    /// Someone else's order reads as `NotFound` to an actor without
    /// `MANAGE_ORDERS`, same as a missing id.
    pub async fn get_order(&self, actor: &Actor<'_>, id: &str) -> ServiceResult<OrderDetail> {
        actor.authorize(Right::VIEW_ORDERS)?;

        let mut conn = self.db.acquire().await?;
        OrderRepository::new(&mut conn)
            .find_detail(id)
            .await?
            .filter(|detail| detail.order.user_id == actor.user_id() || actor.can(Right::MANAGE_ORDERS))
            .ok_or_else(|| CoreError::not_found("Order", id).into())
    }

    pub async fn delete_order(&self, actor: &Actor<'_>, id: &str) -> ServiceResult<()> {
        actor.authorize(Right::MANAGE_ORDERS)?;

        let mut tx = self.db.begin().await?;
        if !OrderRepository::new(&mut tx).delete(id).await? {
            return Err(CoreError::not_found("Order", id).into());
        }
        tx.commit().await?;

        info!(order_id = %id, deleted_by = %actor.user_id(), "Order deleted");
        Ok(())
    }
}
