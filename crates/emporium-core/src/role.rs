//! # Roles
//!
//! Role tiers, their cumulative permission sets, and the [`Actor`] that
//! services authorize against.
//!
//! ## Aggregation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   GENERAL     = general                                                 │
//! │   USER        = general ∪ user                                          │
//! │   ADMIN       = general ∪ user ∪ admin                                  │
//! │   SUPER_ADMIN = general ∪ user ∪ admin ∪ super_admin                    │
//! │                                                                         │
//! │   GENERAL ⊆ USER ⊆ ADMIN ⊆ SUPER_ADMIN                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifetime
//! A [`RoleTable`] is built once at process start from a
//! [`RightsCatalog`] and passed by reference. It is never mutated, so it can
//! be shared across tasks behind an `Arc` or a `&'static`.
//!
//! ```rust
//! use emporium_core::rights::Right;
//! use emporium_core::role::RoleTable;
//!
//! let roles = RoleTable::standard();
//! assert!(roles.has_right("ADMIN", Right::VIEW_PROFILE).unwrap());
//! assert!(!roles.has_right("USER", Right::MANAGE_PRODUCTS).unwrap());
//! assert!(roles.resolve("JANITOR").is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::rights::{Right, RightsCatalog};

// =============================================================================
// Role Tier
// =============================================================================

/// A nested aggregation level. Ordering follows inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleTier {
    General,
    User,
    Admin,
    SuperAdmin,
}

impl RoleTier {
    pub const COUNT: usize = 4;

    /// All tiers, lowest first.
    pub const ALL: [RoleTier; RoleTier::COUNT] = [
        RoleTier::General,
        RoleTier::User,
        RoleTier::Admin,
        RoleTier::SuperAdmin,
    ];

    /// Stable numeric id.
    pub const fn id(self) -> u8 {
        match self {
            RoleTier::General => 0,
            RoleTier::User => 1,
            RoleTier::Admin => 2,
            RoleTier::SuperAdmin => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            RoleTier::General => "GENERAL",
            RoleTier::User => "USER",
            RoleTier::Admin => "ADMIN",
            RoleTier::SuperAdmin => "SUPER_ADMIN",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self.id() as usize
    }
}

impl fmt::Display for RoleTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RoleTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleTier::ALL
            .into_iter()
            .find(|tier| tier.name() == s)
            .ok_or_else(|| CoreError::InvalidRole(s.to_string()))
    }
}

// =============================================================================
// Role
// =============================================================================

/// A tier together with its aggregated, frozen permission set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    tier: RoleTier,
    rights: BTreeSet<Right>,
}

impl Role {
    pub fn tier(&self) -> RoleTier {
        self.tier
    }

    pub fn id(&self) -> u8 {
        self.tier.id()
    }

    pub fn name(&self) -> &'static str {
        self.tier.name()
    }

    pub fn has_right(&self, right: Right) -> bool {
        self.rights.contains(&right)
    }

    pub fn rights(&self) -> &BTreeSet<Right> {
        &self.rights
    }
}

// =============================================================================
// Role Table
// =============================================================================

/// Read-only lookup from role name or tier to [`Role`].
#[derive(Debug, Clone)]
pub struct RoleTable {
    roles: Vec<Role>,
}

impl RoleTable {
    /// Aggregates each tier as the union of its own scope and every lower one.
    pub fn from_catalog(catalog: &RightsCatalog) -> Self {
        let mut acc = BTreeSet::new();
        let roles = RoleTier::ALL
            .into_iter()
            .map(|tier| {
                acc.extend(catalog.scope(tier).iter().copied());
                Role {
                    tier,
                    rights: acc.clone(),
                }
            })
            .collect();

        RoleTable { roles }
    }

    /// Table over [`RightsCatalog::standard`].
    pub fn standard() -> Self {
        Self::from_catalog(&RightsCatalog::standard())
    }

    pub fn get(&self, tier: RoleTier) -> &Role {
        &self.roles[tier.index()]
    }

    /// Looks up a role by name (`"USER"`, `"ADMIN"`, ...).
    pub fn resolve(&self, name: &str) -> CoreResult<&Role> {
        let tier: RoleTier = name.parse()?;
        Ok(self.get(tier))
    }

    pub fn has_right(&self, role_name: &str, right: Right) -> CoreResult<bool> {
        Ok(self.resolve(role_name)?.has_right(right))
    }

    /// The cumulative permission set of a role.
    pub fn aggregate(&self, role_name: &str) -> CoreResult<&BTreeSet<Right>> {
        Ok(self.resolve(role_name)?.rights())
    }

    /// Binds an authenticated user to their role.
    pub fn actor(&self, user_id: impl Into<String>, tier: RoleTier) -> Actor<'_> {
        Actor {
            user_id: user_id.into(),
            role: self.get(tier),
        }
    }
}

// =============================================================================
// Actor
// =============================================================================

/// An already-authenticated caller with a resolved role.
///
/// The core never authenticates; it only checks that the actor's role
/// carries the atom an operation needs.
#[derive(Debug, Clone)]
pub struct Actor<'r> {
    user_id: String,
    role: &'r Role,
}

impl<'r> Actor<'r> {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn role(&self) -> &'r Role {
        self.role
    }

    pub fn can(&self, right: Right) -> bool {
        self.role.has_right(right)
    }

    /// Fails with [`CoreError::Forbidden`] when the role lacks `right`.
    pub fn authorize(&self, right: Right) -> CoreResult<()> {
        if self.can(right) {
            Ok(())
        } else {
            Err(CoreError::Forbidden { right })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_nested(table: &RoleTable) {
        for pair in RoleTier::ALL.windows(2) {
            let lower = table.get(pair[0]).rights();
            let upper = table.get(pair[1]).rights();
            assert!(lower.is_subset(upper), "{} ⊄ {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_standard_table_is_nested() {
        let table = RoleTable::standard();
        assert_nested(&table);

        let admin = table.aggregate("ADMIN").unwrap();
        let user = table.aggregate("USER").unwrap();
        let general = table.aggregate("GENERAL").unwrap();
        assert!(admin.is_superset(user));
        assert!(user.is_superset(general));
        assert!(admin.len() > user.len());
    }

    #[test]
    fn test_custom_catalog_is_nested() {
        let catalog = RightsCatalog::new()
            .with_scope(RoleTier::User, [Right::new("READ")])
            .with_scope(RoleTier::SuperAdmin, [Right::new("NUKE")]);
        let table = RoleTable::from_catalog(&catalog);

        assert_nested(&table);
        assert!(table.get(RoleTier::General).rights().is_empty());
        assert!(table.get(RoleTier::Admin).has_right(Right::new("READ")));
        assert!(!table.get(RoleTier::Admin).has_right(Right::new("NUKE")));
    }

    #[test]
    fn test_user_role_rights() {
        let table = RoleTable::standard();
        let user = table.resolve("USER").unwrap();
        assert_eq!(user.id(), 1);
        assert_eq!(user.name(), "USER");
        assert!(user.has_right(Right::PING));
        assert!(user.has_right(Right::CHANGE_PASSWORD));
        assert!(!user.has_right(Right::VIEW_USERS));
    }

    #[test]
    fn test_unknown_role_is_invalid() {
        let table = RoleTable::standard();
        let err = table.has_right("user", Right::PING).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRole(ref name) if name == "user"));
    }

    #[test]
    fn test_actor_authorize() {
        let table = RoleTable::standard();
        let actor = table.actor("u-1", RoleTier::User);

        assert!(actor.authorize(Right::CHECKOUT).is_ok());
        let err = actor.authorize(Right::MANAGE_ORDERS).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Forbidden {
                right: Right::MANAGE_ORDERS
            }
        ));
        assert_eq!(actor.user_id(), "u-1");
    }

    #[test]
    fn test_tier_round_trips_through_name() {
        for tier in RoleTier::ALL {
            assert_eq!(tier.name().parse::<RoleTier>().unwrap(), tier);
        }
    }
}
