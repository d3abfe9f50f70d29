//! # emporium-core: Pure Business Logic for Emporium
//!
//! The commerce-transaction and trust core: everything with a real invariant
//! lives here as plain functions and types, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emporium Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Request handlers (outside this workspace)          │   │
//! │  │    routing, schema validation, authentication                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Actor + validated DTO                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               emporium-db (services + repositories)             │   │
//! │  │    transaction boundaries, SQL, notifier adapter                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ emporium-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌────────────┐ ┌──────────────┐    │   │
//! │  │   │  rights  │ │   role   │ │ credential │ │    token     │    │   │
//! │  │   │ catalog  │ │  table   │ │  argon2id  │ │  lifecycle   │    │   │
//! │  │   └──────────┘ └──────────┘ └────────────┘ └──────────────┘    │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌────────────┐ ┌──────────────┐    │   │
//! │  │   │   cart   │ │ checkout │ │ validation │ │ types/money  │    │   │
//! │  │   └──────────┘ └──────────┘ └────────────┘ └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO DATABASE • NO NETWORK • COLLABORATORS ARE TRAITS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`rights`] - Permission atoms grouped by scope
//! - [`role`] - Role tiers, aggregated permission sets, actors
//! - [`credential`] - Password hashing and verification
//! - [`token`] - Password-reset token issuance and consumption
//! - [`cart`] - Cart aggregate with derived totals
//! - [`checkout`] - Turning a cart into orders
//! - [`notify`] - Notification collaborator
//! - [`types`] - Domain entities and DTOs
//! - [`money`] - Integer money
//! - [`error`] - Domain error types
//! - [`validation`] - Semantic input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use emporium_core::{Cart, Money, Product};
//! use chrono::Utc;
//!
//! let now = Utc::now();
//! let product = Product::new("Notebook", Money::from_cents(10), now);
//!
//! let mut cart = Cart::new("user-1", now);
//! cart.add_or_update_item(&product, 3).unwrap();
//! assert_eq!(cart.total_items(), 3);
//! assert_eq!(cart.total_cost(), Money::from_cents(30));
//!
//! // Quantities are replaced, never accumulated
//! cart.add_or_update_item(&product, 1).unwrap();
//! assert_eq!(cart.total_items(), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod credential;
pub mod error;
pub mod money;
pub mod notify;
pub mod rights;
pub mod role;
pub mod token;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartHeader, CartItem, CartTotals, PriceCatalog};
pub use checkout::CheckoutPlan;
pub use credential::{CredentialEngine, PasswordHash};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use notify::Notifier;
pub use rights::{Right, RightsCatalog};
pub use role::{Actor, Role, RoleTable, RoleTier};
pub use token::{
    Clock, InsertError, RandomTokens, RedeemedToken, ResetTokenStore, SystemClock, TokenLifecycle,
    TokenSource,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Upper bound on attempts to mint a unique password-reset token.
///
/// Only a uniqueness violation on the token value consumes an attempt;
/// any other store failure aborts issuance immediately.
pub const MAX_TOKEN_GENERATION_ATTEMPTS: u32 = 5;

/// Default validity window for a password-reset token, in seconds.
pub const DEFAULT_RESET_TOKEN_TTL_SECS: i64 = 3600;

/// Longest accepted validity window for a password-reset token (30 days).
pub const MAX_RESET_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;

/// Role given to accounts created through sign-up.
pub const DEFAULT_SIGNUP_ROLE: RoleTier = RoleTier::User;
