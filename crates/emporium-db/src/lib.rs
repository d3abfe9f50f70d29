//! # emporium-db: Persistence and Transactional Services
//!
//! SQLite storage for Emporium, and the services that wrap every
//! state-changing operation in one transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emporium Data Flow                               │
//! │                                                                         │
//! │  Outer adapter (HTTP, CLI) ── authenticated Actor + validated DTO      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   emporium-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Services    │    │  Repositories │    │   Database   │  │   │
//! │  │   │               │    │               │    │   (pool.rs)  │  │   │
//! │  │   │ CartService   │───►│ CartRepo      │───►│ SqlitePool   │  │   │
//! │  │   │ Checkout      │    │ OrderRepo     │    │ Transactions │  │   │
//! │  │   │ PasswordReset │    │ ResetTokenRepo│    │ Migrations   │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  └───────────┼─────────────────────────────────────────────────────┘   │
//! │              ▼                                                          │
//! │  emporium-core: Cart totals, CheckoutPlan, TokenLifecycle, Rights      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Environment configuration and tracing setup
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and service error types
//! - [`repository`] - SQL, one repository per aggregate
//! - [`services`] - Authorized, transactional operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use emporium_core::{RoleTable, RoleTier};
//! use emporium_db::{CartService, Database, ServiceConfig};
//!
//! let config = ServiceConfig::load()?;
//! config.init_tracing();
//! let db = Database::new(config.db_config()).await?;
//!
//! let roles = RoleTable::standard();
//! let actor = roles.actor(user_id, RoleTier::User);
//! let cart = CartService::new(db.clone())
//!     .add_or_update_item(&actor, &product_id, 3)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod services;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, ServiceConfig};
pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use pool::{Database, DbConfig};

pub use repository::{CartRepository, OrderRepository, ProductRepository, ResetTokenRepository, UserRepository};

pub use services::{
    checkout, AccountService, CartService, CatalogService, CheckoutService, OrderService, PasswordResetService,
    TracingNotifier,
};
