//! # Domain Types
//!
//! Entities owned by the persistence layer and the DTOs that arrive from
//! request handlers already shape-validated.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │      User       │   │     Product     │   │       Order         │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)          │   │
//! │  │  email (unique) │   │  name (unique)  │   │  user_id   (FK)     │   │
//! │  │  password_hash  │   │  price: Money   │   │  product_id (FK)    │   │
//! │  │  status, role   │   │  rating, status │   │  qty, status        │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! │                                                                         │
//! │  ┌───────────────────────┐   ┌───────────────────────────────────┐     │
//! │  │ PasswordResetToken    │   │ PasswordResetLog (append-only)    │     │
//! │  │  token (UUID, unique) │   │  user_id, ip, user_agent, token   │     │
//! │  │  created_on           │   │  timestamp                        │     │
//! │  │  consumed_on?         │   └───────────────────────────────────┘     │
//! │  └───────────────────────┘                                              │
//! │                                                                         │
//! │  Cart / CartItem live in crate::cart                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::credential::PasswordHash;
use crate::money::Money;
use crate::role::RoleTier;

// =============================================================================
// Statuses
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

/// Order status. Checkout only ever creates `Active` orders; later
/// transitions belong to fulfilment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

// =============================================================================
// User
// =============================================================================

/// A registered account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    /// Normalized (trimmed, lower-case). Unique.
    pub email: String,
    /// `None` for accounts that never set a password.
    pub password_hash: Option<PasswordHash>,
    pub status: UserStatus,
    pub role: RoleTier,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_by: Option<String>,
    pub created_on: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_on: DateTime<Utc>,
}

impl User {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Outward projection; never carries the password hash.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            status: self.status,
            role: self.role,
        }
    }
}

/// What callers get back from profile operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: UserStatus,
    pub role: RoleTier,
}

// =============================================================================
// Product
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: String,
    /// Display name. Unique across the catalog.
    pub name: String,
    /// Current price. Carts always re-read this.
    pub price: Money,
    pub rating: Option<i64>,
    pub status: ProductStatus,
    pub created_by: Option<String>,
    pub created_on: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_on: DateTime<Utc>,
}

impl Product {
    /// A fresh active product with a generated id.
    pub fn new(name: impl Into<String>, price: Money, now: DateTime<Utc>) -> Self {
        Product {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            price,
            rating: None,
            status: ProductStatus::Active,
            created_by: None,
            created_on: now,
            updated_by: None,
            updated_on: now,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

// =============================================================================
// Order
// =============================================================================

/// One row per cart line at checkout. Never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub qty: i64,
    pub status: OrderStatus,
    pub created_by: Option<String>,
    pub created_on: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_on: DateTime<Utc>,
}

/// An order joined with its product.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub product_name: String,
    pub product_price: Money,
}

// =============================================================================
// Password Reset
// =============================================================================

/// A single-use password-reset token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetToken {
    pub token: Uuid,
    pub user_id: String,
    pub created_on: DateTime<Utc>,
    pub consumed_on: Option<DateTime<Utc>>,
}

impl PasswordResetToken {
    #[inline]
    pub fn is_consumed(&self) -> bool {
        self.consumed_on.is_some()
    }

    /// `None` when `created_on + ttl` is past the representable range,
    /// which [`is_live`](Self::is_live) treats as never expiring.
    pub fn expires_at(&self, ttl: Duration) -> Option<DateTime<Utc>> {
        self.created_on.checked_add_signed(ttl)
    }

    /// Unconsumed and still inside its validity window.
    pub fn is_live(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        !self.is_consumed() && self.expires_at(ttl).map_or(true, |at| now < at)
    }
}

/// Audit row appended once per successful reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetLog {
    pub user_id: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub token: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Caller-supplied request context for the reset audit log.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

// =============================================================================
// Input DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupDto {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Partial profile update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileDto {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordDto {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordDto {
    pub reset_token: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProductDto {
    pub name: String,
    pub price: Money,
    pub rating: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductDto {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub rating: Option<i64>,
    pub status: Option<ProductStatus>,
}

// =============================================================================
// Unit Tests
// =============================================================================
