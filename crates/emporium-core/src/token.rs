//! # Token Lifecycle
//!
//! Issuance and one-time consumption of password-reset tokens.
//!
//! ## Issue
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  issue(user_id)                                                         │
//! │     │                                                                   │
//! │     ├── live token already stored? ──► return it unchanged             │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  attempt 1..=max_attempts                                               │
//! │     ├── fresh random token                                              │
//! │     ├── store.insert_token()                                            │
//! │     │     ├── Ok                    ──► return token                    │
//! │     │     ├── UniquenessViolation   ──► next attempt                    │
//! │     │     └── Store(e)              ──► abort with e (no retry)         │
//! │     ▼                                                                   │
//! │  TokenIssuanceExhausted                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consume
//! ```text
//!   parse ─► find ─► live? ─► mark_consumed (guarded) ─► owning user
//!     └──────────┴───────┴──────────┴── any miss ─► InvalidToken
//! ```
//!
//! `consume` must run on the same transaction as the password update that
//! follows it; the store handle passed in is expected to be that
//! transaction.
//!
//! ## Errors
//! Both operations are generic over the caller's error type `E`, which only
//! has to absorb [`CoreError`] and the store's own error. A database-backed
//! store therefore surfaces its native errors without wrapping them twice.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::{PasswordResetToken, User};
use crate::validation::parse_reset_token;
use crate::{DEFAULT_RESET_TOKEN_TTL_SECS, MAX_TOKEN_GENERATION_ATTEMPTS};

// =============================================================================
// Collaborators
// =============================================================================

/// Source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of candidate token values. Sampled afresh on every attempt.
pub trait TokenSource: Send + Sync {
    fn next_token(&self) -> Uuid;
}

/// Random UUID v4 tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokens;

impl TokenSource for RandomTokens {
    fn next_token(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Outcome of a failed token insert.
#[derive(Debug)]
pub enum InsertError<E> {
    /// The token value is already taken. The only retryable outcome.
    UniquenessViolation,
    /// Any other store failure.
    Store(E),
}

/// Persistence the lifecycle needs.
///
/// Methods take `&mut self` so an implementation can borrow a live
/// transaction.
#[async_trait]
pub trait ResetTokenStore: Send {
    type Error: Send;

    /// Every token for `user_id` whose `consumed_on` is unset, expired or not.
    async fn unconsumed_tokens(
        &mut self,
        user_id: &str,
    ) -> Result<Vec<PasswordResetToken>, Self::Error>;

    async fn insert_token(
        &mut self,
        token: &PasswordResetToken,
    ) -> Result<(), InsertError<Self::Error>>;

    async fn find_token(&mut self, token: &Uuid) -> Result<Option<PasswordResetToken>, Self::Error>;

    /// Sets `consumed_on` if still unset. Returns whether this call did it.
    async fn mark_consumed(&mut self, token: &Uuid, at: DateTime<Utc>) -> Result<bool, Self::Error>;

    async fn find_owner(&mut self, user_id: &str) -> Result<Option<User>, Self::Error>;
}

// =============================================================================
// Lifecycle
// =============================================================================

/// A consumed token and the account it unlocks.
#[derive(Debug, Clone)]
pub struct RedeemedToken {
    pub user: User,
    pub token: PasswordResetToken,
}

/// Issuance and consumption policy.
#[derive(Clone)]
pub struct TokenLifecycle {
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenSource>,
    ttl: Duration,
    max_attempts: u32,
}

impl TokenLifecycle {
    /// Default TTL and attempt bound.
    pub fn new(clock: Arc<dyn Clock>, tokens: Arc<dyn TokenSource>) -> Self {
        TokenLifecycle {
            clock,
            tokens,
            ttl: Duration::seconds(DEFAULT_RESET_TOKEN_TTL_SECS),
            max_attempts: MAX_TOKEN_GENERATION_ATTEMPTS,
        }
    }

    /// Wall clock and random UUID v4 tokens.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(RandomTokens))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Clamped to at least one attempt.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn is_live(&self, token: &PasswordResetToken) -> bool {
        token.is_live(self.clock.now(), self.ttl)
    }

    /// Returns the user's live token, or mints and stores a new one.
    ///
    /// ## Errors
    /// - store failure other than a uniqueness violation: returned as is,
    ///   after exactly one attempt
    /// - [`CoreError::TokenIssuanceExhausted`] after `max_attempts`
    ///   consecutive collisions
    pub async fn issue<S, E>(&self, store: &mut S, user_id: &str) -> Result<PasswordResetToken, E>
    where
        S: ResetTokenStore + ?Sized,
        E: From<CoreError> + From<S::Error>,
    {
        let now = self.clock.now();

        let live = store
            .unconsumed_tokens(user_id)
            .await?
            .into_iter()
            .filter(|t| t.is_live(now, self.ttl))
            .max_by_key(|t| t.created_on);
        if let Some(token) = live {
            return Ok(token);
        }

        for _ in 0..self.max_attempts {
            let candidate = PasswordResetToken {
                token: self.tokens.next_token(),
                user_id: user_id.to_string(),
                created_on: now,
                consumed_on: None,
            };

            match store.insert_token(&candidate).await {
                Ok(()) => return Ok(candidate),
                Err(InsertError::UniquenessViolation) => continue,
                Err(InsertError::Store(e)) => return Err(e.into()),
            }
        }

        Err(CoreError::TokenIssuanceExhausted {
            attempts: self.max_attempts,
        }
        .into())
    }

    /// Marks `raw_token` consumed and returns the account it belongs to.
    ///
    /// ## Errors
    /// [`CoreError::InvalidToken`] if the token is malformed, unknown,
    /// consumed, expired, or consumed concurrently by someone else.
    pub async fn consume<S, E>(&self, store: &mut S, raw_token: &str) -> Result<RedeemedToken, E>
    where
        S: ResetTokenStore + ?Sized,
        E: From<CoreError> + From<S::Error>,
    {
        let value = parse_reset_token(raw_token)?;
        let now = self.clock.now();

        let mut token = store
            .find_token(&value)
            .await?
            .ok_or(CoreError::InvalidToken)?;

        if !token.is_live(now, self.ttl) {
            return Err(CoreError::InvalidToken.into());
        }

        if !store.mark_consumed(&value, now).await? {
            return Err(CoreError::InvalidToken.into());
        }
        token.consumed_on = Some(now);

        let user = store
            .find_owner(&token.user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", token.user_id.clone()))?;

        Ok(RedeemedToken { user, token })
    }
}

impl fmt::Debug for TokenLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenLifecycle")
            .field("ttl", &self.ttl)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::RoleTier;
    use crate::types::UserStatus;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug)]
    enum FakeError {
        Core(CoreError),
        Down,
    }

    impl From<CoreError> for FakeError {
        fn from(e: CoreError) -> Self {
            FakeError::Core(e)
        }
    }

    #[derive(Default)]
    struct FakeStore {
        tokens: Vec<PasswordResetToken>,
        users: Vec<User>,
        inserts_attempted: u32,
        down: bool,
    }

    #[async_trait]
    impl ResetTokenStore for FakeStore {
        type Error = FakeError;

        async fn unconsumed_tokens(
            &mut self,
            user_id: &str,
        ) -> Result<Vec<PasswordResetToken>, FakeError> {
            Ok(self
                .tokens
                .iter()
                .filter(|t| t.user_id == user_id && t.consumed_on.is_none())
                .cloned()
                .collect())
        }

        async fn insert_token(
            &mut self,
            token: &PasswordResetToken,
        ) -> Result<(), InsertError<FakeError>> {
            self.inserts_attempted += 1;
            if self.down {
                return Err(InsertError::Store(FakeError::Down));
            }
            if self.tokens.iter().any(|t| t.token == token.token) {
                return Err(InsertError::UniquenessViolation);
            }
            self.tokens.push(token.clone());
            Ok(())
        }

        async fn find_token(&mut self, token: &Uuid) -> Result<Option<PasswordResetToken>, FakeError> {
            Ok(self.tokens.iter().find(|t| t.token == *token).cloned())
        }

        async fn mark_consumed(&mut self, token: &Uuid, at: DateTime<Utc>) -> Result<bool, FakeError> {
            match self
                .tokens
                .iter_mut()
                .find(|t| t.token == *token && t.consumed_on.is_none())
            {
                Some(t) => {
                    t.consumed_on = Some(at);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn find_owner(&mut self, user_id: &str) -> Result<Option<User>, FakeError> {
            Ok(self.users.iter().find(|u| u.id == user_id).cloned())
        }
    }

    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    /// Replays a fixed sequence, then falls back to random values.
    struct ScriptedTokens(Mutex<VecDeque<Uuid>>);

    impl TokenSource for ScriptedTokens {
        fn next_token(&self) -> Uuid {
            self.0.lock().unwrap().pop_front().unwrap_or_else(Uuid::new_v4)
        }
    }

    fn user(id: &str) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            password_hash: None,
            status: UserStatus::Active,
            role: RoleTier::User,
            name: id.to_string(),
            phone: None,
            address: None,
            created_by: None,
            created_on: now,
            updated_by: None,
            updated_on: now,
        }
    }

    fn consumed(token: Uuid) -> PasswordResetToken {
        PasswordResetToken {
            token,
            user_id: "someone-else".into(),
            created_on: Utc::now(),
            consumed_on: Some(Utc::now()),
        }
    }

    /// A store pre-loaded with `collisions` taken values and a source that
    /// replays them before producing fresh ones.
    fn colliding(collisions: usize) -> (FakeStore, TokenLifecycle) {
        let taken: Vec<Uuid> = (0..collisions).map(|_| Uuid::new_v4()).collect();
        let store = FakeStore {
            tokens: taken.iter().copied().map(consumed).collect(),
            users: vec![user("u1")],
            ..Default::default()
        };
        let source = ScriptedTokens(Mutex::new(taken.into_iter().collect()));
        let lifecycle = TokenLifecycle::new(Arc::new(SystemClock), Arc::new(source));
        (store, lifecycle)
    }

    #[tokio::test]
    async fn test_issue_is_idempotent_until_consumed() {
        let lifecycle = TokenLifecycle::system();
        let mut store = FakeStore {
            users: vec![user("u1")],
            ..Default::default()
        };

        let first: PasswordResetToken = lifecycle.issue::<_, FakeError>(&mut store, "u1").await.unwrap();
        let second = lifecycle.issue::<_, FakeError>(&mut store, "u1").await.unwrap();
        assert_eq!(first.token, second.token);
        assert_eq!(store.inserts_attempted, 1);

        lifecycle
            .consume::<_, FakeError>(&mut store, &first.token.to_string())
            .await
            .unwrap();

        let third = lifecycle.issue::<_, FakeError>(&mut store, "u1").await.unwrap();
        assert_ne!(third.token, first.token);
    }

    #[tokio::test]
    async fn test_four_collisions_then_success() {
        let (mut store, lifecycle) = colliding(4);

        let token = lifecycle.issue::<_, FakeError>(&mut store, "u1").await.unwrap();
        assert_eq!(store.inserts_attempted, 5);
        assert_eq!(token.user_id, "u1");
    }

    #[tokio::test]
    async fn test_five_collisions_exhaust() {
        let (mut store, lifecycle) = colliding(5);

        let err = lifecycle.issue::<_, FakeError>(&mut store, "u1").await.unwrap_err();
        assert!(matches!(
            err,
            FakeError::Core(CoreError::TokenIssuanceExhausted { attempts: 5 })
        ));
        assert_eq!(store.inserts_attempted, 5);
    }

    #[tokio::test]
    async fn test_store_failure_is_not_retried() {
        let lifecycle = TokenLifecycle::system();
        let mut store = FakeStore {
            down: true,
            ..Default::default()
        };

        let err = lifecycle.issue::<_, FakeError>(&mut store, "u1").await.unwrap_err();
        assert!(matches!(err, FakeError::Down));
        assert_eq!(store.inserts_attempted, 1);
    }

    #[tokio::test]
    async fn test_expired_token_is_replaced_and_rejected() {
        let clock = Arc::new(ManualClock(Mutex::new(Utc::now())));
        let lifecycle = TokenLifecycle::new(clock.clone(), Arc::new(RandomTokens))
            .with_ttl(Duration::minutes(10));
        let mut store = FakeStore {
            users: vec![user("u1")],
            ..Default::default()
        };

        let old = lifecycle.issue::<_, FakeError>(&mut store, "u1").await.unwrap();
        clock.advance(Duration::minutes(11));

        let err = lifecycle
            .consume::<_, FakeError>(&mut store, &old.token.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, FakeError::Core(CoreError::InvalidToken)));

        let fresh = lifecycle.issue::<_, FakeError>(&mut store, "u1").await.unwrap();
        assert_ne!(fresh.token, old.token);
    }

    #[tokio::test]
    async fn test_consume_once() {
        let lifecycle = TokenLifecycle::system();
        let mut store = FakeStore {
            users: vec![user("u1")],
            ..Default::default()
        };
        let issued = lifecycle.issue::<_, FakeError>(&mut store, "u1").await.unwrap();
        let raw = issued.token.to_string();

        let redeemed = lifecycle.consume::<_, FakeError>(&mut store, &raw).await.unwrap();
        assert_eq!(redeemed.user.id, "u1");
        assert!(redeemed.token.is_consumed());

        let again = lifecycle.consume::<_, FakeError>(&mut store, &raw).await.unwrap_err();
        assert!(matches!(again, FakeError::Core(CoreError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_consume_rejects_garbage_and_unknown() {
        let lifecycle = TokenLifecycle::system();
        let mut store = FakeStore::default();

        for raw in ["", "not-a-uuid", &Uuid::new_v4().to_string()] {
            let err = lifecycle.consume::<_, FakeError>(&mut store, raw).await.unwrap_err();
            assert!(matches!(err, FakeError::Core(CoreError::InvalidToken)));
        }
    }

    #[test]
    fn test_attempts_clamped() {
        assert_eq!(TokenLifecycle::system().with_max_attempts(0).max_attempts(), 1);
        assert_eq!(TokenLifecycle::system().max_attempts(), 5);
    }
}
