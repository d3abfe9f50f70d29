//! # Cart Aggregate
//!
//! A user's cart and the operations that keep its totals honest.
//!
//! ## Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   total_items == Σ item.qty                                             │
//! │   total_cost  == Σ item.qty × item.price                                │
//! │   every item.qty > 0, at most one line per product                      │
//! │                                                                         │
//! │   Totals are recomputed from the full line set after every mutation.   │
//! │   They are never patched incrementally.                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//! ```text
//!   add_or_update_item(P, n)   line for P exists? qty := n  (replace)
//!                              otherwise push a new line
//!   remove_item(P)             drop the line, no-op when absent
//!   clear()                    drop every line
//!   load_lines(rows)           adopt lines read back from storage
//!   reprice(catalog)           refresh prices, drop vanished products
//! ```
//!
//! The fields that carry the invariant are private; the only way to change
//! them is through the methods above.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_quantity;

// =============================================================================
// Cart Item
// =============================================================================

/// One product line in a cart.
///
/// Name, price and rating mirror the product row the line was last
/// joined against; they are refreshed on every recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub product_name: String,
    pub price: Money,
    pub rating: Option<i64>,
    pub qty: i64,
}

impl CartItem {
    pub fn from_product(product: &Product, qty: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            price: product.price,
            rating: product.rating,
            qty,
        }
    }

    #[inline]
    pub fn line_cost(&self) -> Money {
        self.price.times(self.qty)
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Derived totals of a line set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub total_items: i64,
    pub total_cost: Money,
}

impl CartTotals {
    /// Totals of `items`, clamped at the `i64` bounds.
    pub fn of(items: &[CartItem]) -> Self {
        CartTotals {
            total_items: items.iter().fold(0i64, |n, i| n.saturating_add(i.qty)),
            total_cost: items.iter().map(CartItem::line_cost).sum(),
        }
    }

    /// Totals of `items`, or `None` if either total overflows.
    pub fn checked(items: &[CartItem]) -> Option<Self> {
        let mut totals = CartTotals::default();
        for item in items {
            totals.total_items = totals.total_items.checked_add(item.qty)?;
            totals.total_cost = totals.total_cost.checked_add(item.price.checked_times(item.qty)?)?;
        }
        Some(totals)
    }

    /// Like [`CartTotals::checked`], with overflow reported as a validation error.
    pub fn try_of(items: &[CartItem]) -> Result<Self, ValidationError> {
        CartTotals::checked(items).ok_or_else(|| ValidationError::OutOfRange {
            field: "totalCost".to_string(),
            min: 0,
            max: i64::MAX,
        })
    }
}

// =============================================================================
// Price Catalog
// =============================================================================

/// Source of current product rows for [`Cart::reprice`].
pub trait PriceCatalog {
    fn product(&self, product_id: &str) -> Option<&Product>;
}

impl PriceCatalog for HashMap<String, Product> {
    fn product(&self, product_id: &str) -> Option<&Product> {
        self.get(product_id)
    }
}

impl PriceCatalog for [Product] {
    fn product(&self, product_id: &str) -> Option<&Product> {
        self.iter().find(|p| p.id == product_id)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Identity and audit columns of a cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartHeader {
    pub id: String,
    pub user_id: String,
    pub created_by: Option<String>,
    pub created_on: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_on: DateTime<Utc>,
}

/// A user's cart. Exactly one per user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(flatten)]
    pub header: CartHeader,
    total_items: i64,
    total_cost: Money,
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart owned by `user_id`.
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        let user_id = user_id.into();
        Cart::from_header(CartHeader {
            id: Uuid::new_v4().to_string(),
            created_by: Some(user_id.clone()),
            user_id,
            created_on: now,
            updated_by: None,
            updated_on: now,
        })
    }

    /// An empty cart around an existing header.
    pub fn from_header(header: CartHeader) -> Self {
        Cart {
            header,
            total_items: 0,
            total_cost: Money::zero(),
            items: Vec::new(),
        }
    }

    /// Rebuilds a cart from its header and stored lines.
    pub fn restore(header: CartHeader, lines: Vec<CartItem>) -> Self {
        let mut cart = Cart::from_header(header);
        cart.load_lines(lines);
        cart
    }

    /// Like [`Cart::restore`], but fails if the totals do not fit in an `i64`.
    pub fn try_restore(header: CartHeader, lines: Vec<CartItem>) -> CoreResult<Self> {
        let cart = Cart::restore(header, lines);
        CartTotals::try_of(&cart.items)?;
        Ok(cart)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.header.id
    }

    pub fn user_id(&self) -> &str {
        &self.header.user_id
    }

    pub fn total_items(&self) -> i64 {
        self.total_items
    }

    pub fn total_cost(&self) -> Money {
        self.total_cost
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals {
            total_items: self.total_items,
            total_cost: self.total_cost,
        }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn line(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the cached totals match the line set.
    pub fn is_consistent(&self) -> bool {
        self.totals() == CartTotals::of(&self.items)
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Sets the quantity of `product` to `qty`, inserting a line if needed.
    ///
    /// ## Errors
    /// - `ValidationError::InvalidQuantity` when `qty <= 0`
    /// - `ValidationError::OutOfRange` when a total would overflow
    ///
    /// On error the cart is left untouched.
    pub fn add_or_update_item(&mut self, product: &Product, qty: i64) -> CoreResult<()> {
        validate_quantity(qty)?;

        let mut items = self.items.clone();
        match items.iter_mut().find(|i| i.product_id == product.id) {
            Some(line) => *line = CartItem::from_product(product, qty),
            None => items.push(CartItem::from_product(product, qty)),
        }
        let totals = CartTotals::try_of(&items)?;

        self.items = items;
        self.total_items = totals.total_items;
        self.total_cost = totals.total_cost;
        Ok(())
    }

    /// Removes the line for `product_id`. Returns whether a line was removed.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.recompute();
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.recompute();
    }

    /// Replaces the line set with rows read back from storage.
    ///
    /// Rows with a non-positive quantity are discarded; if the same product
    /// appears twice the last row wins.
    pub fn load_lines(&mut self, lines: Vec<CartItem>) {
        self.items.clear();
        for line in lines.into_iter().filter(|l| l.qty > 0) {
            match self.items.iter_mut().find(|i| i.product_id == line.product_id) {
                Some(existing) => *existing = line,
                None => self.items.push(line),
            }
        }
        self.recompute();
    }

    /// Refreshes every line from `catalog`.
    ///
    /// Lines whose product is missing from the catalog are dropped, the same
    /// way an inner join against the product table would drop them.
    pub fn reprice<C>(&mut self, catalog: &C)
    where
        C: PriceCatalog + ?Sized,
    {
        self.items = self
            .items
            .drain(..)
            .filter_map(|line| {
                catalog
                    .product(&line.product_id)
                    .map(|p| CartItem::from_product(p, line.qty))
            })
            .collect();
        self.recompute();
    }

    /// Stamps the audit columns.
    pub fn touch(&mut self, actor_id: &str, now: DateTime<Utc>) {
        self.header.updated_by = Some(actor_id.to_string());
        self.header.updated_on = now;
    }

    fn recompute(&mut self) {
        let totals = CartTotals::of(&self.items);
        self.total_items = totals.total_items;
        self.total_cost = totals.total_cost;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};

    fn product(id: &str, cents: i64) -> Product {
        let mut p = Product::new(format!("Product {id}"), Money::from_cents(cents), Utc::now());
        p.id = id.to_string();
        p
    }

    #[test]
    fn test_replace_not_increment_scenario() {
        let p1 = product("P1", 10);
        let mut cart = Cart::new("u1", Utc::now());

        cart.add_or_update_item(&p1, 3).unwrap();
        assert_eq!((cart.total_items(), cart.total_cost().cents()), (3, 30));

        cart.add_or_update_item(&p1, 1).unwrap();
        assert_eq!((cart.total_items(), cart.total_cost().cents()), (1, 10));
        assert_eq!(cart.items().len(), 1);

        assert!(cart.remove_item("P1"));
        assert_eq!((cart.total_items(), cart.total_cost().cents()), (0, 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_non_positive_quantity_rejected_without_change() {
        let p1 = product("P1", 10);
        let mut cart = Cart::new("u1", Utc::now());
        cart.add_or_update_item(&p1, 2).unwrap();

        for qty in [0, -4] {
            let err = cart.add_or_update_item(&p1, qty).unwrap_err();
            assert!(matches!(
                err,
                CoreError::Validation(ValidationError::InvalidQuantity { qty: q }) if q == qty
            ));
        }
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.line("P1").map(|l| l.qty), Some(2));
    }

    #[test]
    fn test_overflowing_quantity_rejected_without_change() {
        let p1 = product("P1", 100);
        let p2 = product("P2", 1);
        let mut cart = Cart::new("u1", Utc::now());
        cart.add_or_update_item(&p1, 2).unwrap();

        let err = cart.add_or_update_item(&p1, i64::MAX / 10).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));

        let err = cart.add_or_update_item(&p2, i64::MAX).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));

        assert_eq!((cart.total_items(), cart.total_cost().cents()), (2, 200));
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_try_restore_reports_overflow() {
        let header = Cart::new("u1", Utc::now()).header;
        let line = CartItem::from_product(&product("P1", 100), i64::MAX / 10);

        assert!(Cart::try_restore(header.clone(), vec![line.clone()]).is_err());

        let clamped = Cart::restore(header, vec![line]);
        assert_eq!(clamped.total_cost(), Money::MAX);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new("u1", Utc::now());
        cart.add_or_update_item(&product("P1", 5), 2).unwrap();

        assert!(!cart.remove_item("P9"));
        assert_eq!(cart.total_cost(), Money::from_cents(10));
    }

    #[test]
    fn test_totals_stay_consistent_over_mixed_sequence() {
        let products: Vec<Product> = (1..=5).map(|i| product(&format!("P{i}"), i * 7)).collect();
        let mut cart = Cart::new("u1", Utc::now());

        let script: &[(usize, i64)] = &[(0, 3), (1, 2), (0, 5), (2, 1), (3, 9), (1, 1), (4, 4)];
        for (step, &(idx, qty)) in script.iter().enumerate() {
            cart.add_or_update_item(&products[idx], qty).unwrap();
            if step % 3 == 2 {
                cart.remove_item(&products[(idx + 1) % 5].id);
            }
            assert!(cart.is_consistent());
        }

        let expected_items: i64 = cart.items().iter().map(|i| i.qty).sum();
        let expected_cost: i64 = cart.items().iter().map(|i| i.qty * i.price.cents()).sum();
        assert_eq!(cart.total_items(), expected_items);
        assert_eq!(cart.total_cost().cents(), expected_cost);
    }

    #[test]
    fn test_clear_resets_totals() {
        let mut cart = Cart::new("u1", Utc::now());
        cart.add_or_update_item(&product("P1", 10), 3).unwrap();
        cart.add_or_update_item(&product("P2", 4), 1).unwrap();

        cart.clear();
        assert_eq!(cart.totals(), CartTotals::default());
    }

    #[test]
    fn test_load_lines_drops_zero_and_dedups() {
        let p1 = product("P1", 10);
        let p2 = product("P2", 3);
        let mut cart = Cart::new("u1", Utc::now());

        cart.load_lines(vec![
            CartItem::from_product(&p1, 2),
            CartItem::from_product(&p2, 0),
            CartItem::from_product(&p1, 4),
        ]);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_items(), 4);
        assert_eq!(cart.total_cost().cents(), 40);
    }

    #[test]
    fn test_reprice_follows_live_prices() {
        let mut p1 = product("P1", 10);
        let p2 = product("P2", 20);
        let mut cart = Cart::new("u1", Utc::now());
        cart.add_or_update_item(&p1, 2).unwrap();
        cart.add_or_update_item(&p2, 1).unwrap();

        p1.price = Money::from_cents(15);
        let catalog: HashMap<String, Product> = [(p1.id.clone(), p1)].into_iter().collect();
        cart.reprice(&catalog);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_cost().cents(), 30);
    }

    #[test]
    fn test_reprice_with_slice() {
        let mut p1 = product("P1", 10);
        let mut cart = Cart::new("u1", Utc::now());
        cart.add_or_update_item(&p1, 3).unwrap();

        p1.price = Money::from_cents(1);
        cart.reprice(&[p1][..]);
        assert_eq!(cart.total_cost().cents(), 3);
    }
}
