//! # Transactional Services
//!
//! Each public operation authorizes the actor, then runs as one SQLite
//! transaction over the repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  actor.authorize(RIGHT)?          ← Forbidden, store untouched         │
//! │  validate input?                  ← ValidationError, store untouched   │
//! │  let mut tx = db.begin().await?;                                       │
//! │  ... repositories on &mut tx ...  ← any `?` drops tx → rollback        │
//! │  tx.commit().await?;                                                   │
//! │  info!(...)                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Password hashing never runs on the async executor and never runs while a
//! write transaction is open.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod notifier;
pub mod orders;
pub mod password_reset;

pub use account::AccountService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::{checkout, CheckoutService};
pub use notifier::TracingNotifier;
pub use orders::OrderService;
pub use password_reset::PasswordResetService;

use emporium_core::{CoreError, CredentialEngine, PasswordHash};

use crate::error::{DbError, ServiceError, ServiceResult};

/// Hashes on the blocking pool.
pub(crate) async fn hash_password(engine: &CredentialEngine, plaintext: &str) -> ServiceResult<PasswordHash> {
    let engine = engine.clone();
    let plaintext = plaintext.to_string();

    let hash = tokio::task::spawn_blocking(move || engine.hash(&plaintext))
        .await
        .map_err(|e| ServiceError::Worker(e.to_string()))??;
    Ok(hash)
}

/// Verifies on the blocking pool.
pub(crate) async fn verify_password(
    engine: &CredentialEngine,
    hash: &PasswordHash,
    plaintext: &str,
) -> ServiceResult<bool> {
    let engine = engine.clone();
    let hash = hash.clone();
    let plaintext = plaintext.to_string();

    tokio::task::spawn_blocking(move || engine.verify(&hash, &plaintext))
        .await
        .map_err(|e| ServiceError::Worker(e.to_string()))
}

/// Reports a unique violation as a `Conflict` on `entity.field`.
pub(crate) fn conflict_on_duplicate(
    err: DbError,
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> ServiceError {
    if err.is_unique_violation() {
        CoreError::conflict(entity, field, value).into()
    } else {
        err.into()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use emporium_core::{CredentialEngine, Money, Product, SignupDto, UserProfile};

    use super::AccountService;
    use crate::pool::{Database, DbConfig};
    use crate::repository::ProductRepository;

    pub(crate) async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Argon2id at the lowest cost the crate accepts.
    pub(crate) fn test_engine() -> CredentialEngine {
        CredentialEngine::with_cost(64, 1, 1).unwrap()
    }

    pub(crate) async fn signup(db: &Database, email: &str, password: &str) -> UserProfile {
        AccountService::new(db.clone(), test_engine())
            .signup(SignupDto {
                name: "Test User".to_string(),
                email: email.to_string(),
                password: password.to_string(),
                phone: Some("555-0100".to_string()),
                address: None,
            })
            .await
            .unwrap()
    }

    pub(crate) async fn product(db: &Database, name: &str, cents: i64) -> Product {
        let product = Product::new(name, Money::from_cents(cents), Utc::now());
        let mut conn = db.acquire().await.unwrap();
        ProductRepository::new(&mut conn).insert(&product).await.unwrap();
        product
    }
}
