//! # Rights Catalog
//!
//! Permission atoms grouped by the role tier that first grants them.
//!
//! ## Scopes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GENERAL      PING  TEST_API  VIEW_ROUTES                               │
//! │  USER         VIEW_PROFILE  UPDATE_PROFILE  CHANGE_PASSWORD             │
//! │               VIEW_CART  UPDATE_CART  CHECKOUT  VIEW_ORDERS             │
//! │  ADMIN        VIEW_USERS  MANAGE_PRODUCTS  MANAGE_ORDERS                │
//! │  SUPER_ADMIN  MANAGE_ADMINS  MANAGE_ROLES                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Scopes are disjoint: an atom belongs to exactly one of them. Aggregation
//! into cumulative role sets happens in [`crate::role`].

use serde::Serialize;
use std::fmt;

use crate::role::RoleTier;

// =============================================================================
// Right
// =============================================================================

/// A permission atom, e.g. `VIEW_PROFILE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Right(&'static str);

impl Right {
    // general
    pub const PING: Right = Right("PING");
    pub const TEST_API: Right = Right("TEST_API");
    pub const VIEW_ROUTES: Right = Right("VIEW_ROUTES");

    // user
    pub const VIEW_PROFILE: Right = Right("VIEW_PROFILE");
    pub const UPDATE_PROFILE: Right = Right("UPDATE_PROFILE");
    pub const CHANGE_PASSWORD: Right = Right("CHANGE_PASSWORD");
    pub const VIEW_CART: Right = Right("VIEW_CART");
    pub const UPDATE_CART: Right = Right("UPDATE_CART");
    pub const CHECKOUT: Right = Right("CHECKOUT");
    pub const VIEW_ORDERS: Right = Right("VIEW_ORDERS");

    // admin
    pub const VIEW_USERS: Right = Right("VIEW_USERS");
    pub const MANAGE_PRODUCTS: Right = Right("MANAGE_PRODUCTS");
    pub const MANAGE_ORDERS: Right = Right("MANAGE_ORDERS");

    // super admin
    pub const MANAGE_ADMINS: Right = Right("MANAGE_ADMINS");
    pub const MANAGE_ROLES: Right = Right("MANAGE_ROLES");

    /// Declares an atom outside the standard set.
    pub const fn new(name: &'static str) -> Self {
        Right(name)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

const GENERAL_RIGHTS: &[Right] = &[Right::PING, Right::TEST_API, Right::VIEW_ROUTES];

const USER_RIGHTS: &[Right] = &[
    Right::VIEW_PROFILE,
    Right::UPDATE_PROFILE,
    Right::CHANGE_PASSWORD,
    Right::VIEW_CART,
    Right::UPDATE_CART,
    Right::CHECKOUT,
    Right::VIEW_ORDERS,
];

const ADMIN_RIGHTS: &[Right] = &[Right::VIEW_USERS, Right::MANAGE_PRODUCTS, Right::MANAGE_ORDERS];

const SUPER_ADMIN_RIGHTS: &[Right] = &[Right::MANAGE_ADMINS, Right::MANAGE_ROLES];

// =============================================================================
// Catalog
// =============================================================================

/// Frozen per-scope sets of permission atoms.
///
/// Built once (normally [`RightsCatalog::standard`]) and handed to
/// [`crate::role::RoleTable::from_catalog`].
#[derive(Debug, Clone, Default)]
pub struct RightsCatalog {
    scopes: [Vec<Right>; RoleTier::COUNT],
}

impl RightsCatalog {
    /// An empty catalog; fill it with [`RightsCatalog::with_scope`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog the services authorize against.
    pub fn standard() -> Self {
        RightsCatalog::new()
            .with_scope(RoleTier::General, GENERAL_RIGHTS.iter().copied())
            .with_scope(RoleTier::User, USER_RIGHTS.iter().copied())
            .with_scope(RoleTier::Admin, ADMIN_RIGHTS.iter().copied())
            .with_scope(RoleTier::SuperAdmin, SUPER_ADMIN_RIGHTS.iter().copied())
    }

    /// Adds atoms to the scope of `tier`.
    ///
    /// An atom already present in any scope is skipped, keeping scopes disjoint.
    pub fn with_scope(mut self, tier: RoleTier, rights: impl IntoIterator<Item = Right>) -> Self {
        for right in rights {
            if !self.exists(right.as_str()) {
                self.scopes[tier.index()].push(right);
            }
        }
        self
    }

    /// Atoms introduced at exactly this tier.
    pub fn scope(&self, tier: RoleTier) -> &[Right] {
        &self.scopes[tier.index()]
    }

    /// Finds an atom by name.
    ///
    /// ## Example
    /// ```rust
    /// use emporium_core::rights::{Right, RightsCatalog};
    ///
    /// let catalog = RightsCatalog::standard();
    /// assert_eq!(catalog.lookup("CHECKOUT"), Some(Right::CHECKOUT));
    /// assert_eq!(catalog.lookup("checkout"), None);
    /// ```
    pub fn lookup(&self, name: &str) -> Option<Right> {
        self.iter().map(|(_, r)| r).find(|r| r.as_str() == name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// The tier that first grants `right`.
    pub fn scope_of(&self, right: Right) -> Option<RoleTier> {
        self.iter().find(|(_, r)| *r == right).map(|(tier, _)| tier)
    }

    /// Every (tier, atom) pair, lowest tier first.
    pub fn iter(&self) -> impl Iterator<Item = (RoleTier, Right)> + '_ {
        RoleTier::ALL
            .into_iter()
            .flat_map(move |tier| self.scope(tier).iter().map(move |r| (tier, *r)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_standard_scopes_are_disjoint_and_non_empty() {
        let catalog = RightsCatalog::standard();
        let mut seen = HashSet::new();
        for tier in RoleTier::ALL {
            assert!(!catalog.scope(tier).is_empty(), "{tier} scope is empty");
            for right in catalog.scope(tier) {
                assert!(seen.insert(*right), "{right} appears twice");
            }
        }
    }

    #[test]
    fn test_lookup_and_scope_of() {
        let catalog = RightsCatalog::standard();
        assert!(catalog.exists("PING"));
        assert!(!catalog.exists("FLY"));
        assert_eq!(catalog.scope_of(Right::MANAGE_ROLES), Some(RoleTier::SuperAdmin));
        assert_eq!(catalog.scope_of(Right::VIEW_CART), Some(RoleTier::User));
        assert_eq!(catalog.scope_of(Right::new("FLY")), None);
    }

    #[test]
    fn test_with_scope_skips_duplicates() {
        let catalog = RightsCatalog::new()
            .with_scope(RoleTier::General, [Right::PING])
            .with_scope(RoleTier::Admin, [Right::PING, Right::new("AUDIT")]);

        assert_eq!(catalog.scope(RoleTier::General), &[Right::PING]);
        assert_eq!(catalog.scope(RoleTier::Admin), &[Right::new("AUDIT")]);
    }

    #[test]
    fn test_serializes_as_name() {
        let json = serde_json::to_string(&Right::VIEW_PROFILE).unwrap();
        assert_eq!(json, "\"VIEW_PROFILE\"");
    }
}
