//! # Repository Module
//!
//! SQL for every table, one repository per aggregate.
//!
//! ## Borrowed Connections
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  let mut tx = db.begin().await?;                                       │
//! │                                                                         │
//! │  CartRepository::new(&mut tx).ensure_for_user(..)     ┐                │
//! │  CartRepository::new(&mut tx).upsert_line(..)         │ one            │
//! │  CartRepository::new(&mut tx).load_lines(..)          │ transaction    │
//! │  CartRepository::new(&mut tx).write_totals(..)        ┘                │
//! │                                                                         │
//! │  tx.commit().await?;     (or drop tx → rollback)                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories hold `&mut SqliteConnection`, so the same code runs on a
//! pooled connection for reads and on a transaction for writes.
//!
//! ## Available Repositories
//!
//! - [`UserRepository`] - Accounts, credentials, profiles
//! - [`ProductRepository`] - Product catalog
//! - [`CartRepository`] - Carts, lines, derived totals
//! - [`OrderRepository`] - Orders and order details
//! - [`ResetTokenRepository`] - Reset tokens and the reset audit log

pub mod cart;
pub mod order;
pub mod product;
pub mod reset_token;
pub mod user;

pub use cart::CartRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use reset_token::ResetTokenRepository;
pub use user::UserRepository;
