//! # Checkout Planning
//!
//! Turns a cart into the orders a checkout must write.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   EMPTY ──(add item)──► NONEMPTY ──(checkout ok)──► EMPTY + N orders    │
//! │                             │                                           │
//! │                             └──(checkout fails)──► NONEMPTY, 0 orders   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Planning is pure. Writing the plan and clearing the cart happen in one
//! store transaction in emporium-db; an empty plan means "nothing to
//! checkout" and is not an error.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cart::Cart;
use crate::types::{Order, OrderStatus};

/// The orders produced by checking out one cart.
#[derive(Debug, Clone)]
pub struct CheckoutPlan {
    orders: Vec<Order>,
}

impl CheckoutPlan {
    /// One active order per cart line, in line order.
    pub fn from_cart(cart: &Cart, now: DateTime<Utc>) -> Self {
        let user_id = cart.user_id();
        let orders = cart
            .items()
            .iter()
            .map(|line| Order {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                product_id: line.product_id.clone(),
                qty: line.qty,
                status: OrderStatus::Active,
                created_by: Some(user_id.to_string()),
                created_on: now,
                updated_by: None,
                updated_on: now,
            })
            .collect();

        CheckoutPlan { orders }
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn into_orders(self) -> Vec<Order> {
        self.orders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::Product;

    #[test]
    fn test_empty_cart_plans_nothing() {
        let cart = Cart::new("u1", Utc::now());
        assert!(CheckoutPlan::from_cart(&cart, Utc::now()).is_empty());
    }

    #[test]
    fn test_one_order_per_line() {
        let now = Utc::now();
        let a = Product::new("A", Money::from_cents(5), now);
        let b = Product::new("B", Money::from_cents(7), now);
        let mut cart = Cart::new("u1", now);
        cart.add_or_update_item(&a, 2).unwrap();
        cart.add_or_update_item(&b, 3).unwrap();

        let plan = CheckoutPlan::from_cart(&cart, now);
        assert_eq!(plan.len(), 2);

        let orders = plan.into_orders();
        assert_eq!(orders[0].product_id, a.id);
        assert_eq!(orders[0].qty, 2);
        assert_eq!(orders[1].qty, 3);
        assert!(orders.iter().all(|o| o.status == OrderStatus::Active && o.user_id == "u1"));
        assert_ne!(orders[0].id, orders[1].id);
    }
}
