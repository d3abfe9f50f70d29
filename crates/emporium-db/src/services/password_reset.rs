//! # Password Reset
//!
//! ```text
//! forgot_password(email)
//!   BEGIN ─► active user by email ─► issue token ─► notifier ─► COMMIT
//!                 └─ NotFound            └─ reused if live   └─ false: NotificationFailed, rollback
//!
//! reset_password(dto, meta)
//!   validate pair ─► hash ─► BEGIN ─► consume ─► store hash ─► append log ─► COMMIT
//!        └─ PasswordMismatch, nothing read or written
//! ```
//!
//! The token is consumed on the same transaction that writes the new hash:
//! either both happen or neither does.

use chrono::Utc;
use emporium_core::validation::{normalize_email, validate_password_change};
use emporium_core::{
    CoreError, CredentialEngine, Notifier, PasswordResetLog, RequestMetadata, ResetPasswordDto, TokenLifecycle,
};
use std::sync::Arc;
use tracing::{info, warn};

use super::hash_password;
use crate::error::{ServiceError, ServiceResult};
use crate::pool::Database;
use crate::repository::{ResetTokenRepository, UserRepository};

#[derive(Clone)]
pub struct PasswordResetService {
    db: Database,
    lifecycle: TokenLifecycle,
    notifier: Arc<dyn Notifier>,
    credentials: CredentialEngine,
}

impl PasswordResetService {
    pub fn new(
        db: Database,
        lifecycle: TokenLifecycle,
        notifier: Arc<dyn Notifier>,
        credentials: CredentialEngine,
    ) -> Self {
        PasswordResetService {
            db,
            lifecycle,
            notifier,
            credentials,
        }
    }

    /// Issues (or re-sends) a reset token for the account behind `email`.
    ///
    /// ## Errors
    /// - `NotFound(User)` when no active account has this email
    /// - `NotificationFailed` when delivery fails; the token is not kept
    /// - `TokenIssuanceExhausted` after repeated token collisions
    pub async fn forgot_password(&self, email: &str) -> ServiceResult<()> {
        let email = normalize_email(email)?;

        let mut tx = self.db.begin_write().await?;
        let user = UserRepository::new(&mut tx)
            .find_active_by_email(&email)
            .await?
            .ok_or_else(|| CoreError::not_found("User", email.as_str()))?;

        let token = {
            let mut store = ResetTokenRepository::new(&mut tx);
            self.lifecycle.issue::<_, ServiceError>(&mut store, &user.id).await?
        };

        if !self.notifier.send_password_reset(&user, &token).await {
            warn!(user_id = %user.id, "Password reset delivery failed");
            return Err(CoreError::NotificationFailed.into());
        }
        tx.commit().await?;

        info!(
            user_id = %user.id,
            expires_at = ?token.expires_at(self.lifecycle.ttl()),
            "Password reset requested"
        );
        Ok(())
    }

    /// Sets a new password using a reset token.
    ///
    /// ## Errors
    /// - `PasswordMismatch` before any store access
    /// - `InvalidToken` for a malformed, unknown, consumed or expired token
    pub async fn reset_password(&self, dto: ResetPasswordDto, meta: RequestMetadata) -> ServiceResult<()> {
        validate_password_change(&dto.new_password, &dto.confirm_password, None, false)?;

        let hash = hash_password(&self.credentials, &dto.new_password).await?;
        let now = Utc::now();

        let mut tx = self.db.begin_write().await?;
        let redeemed = {
            let mut store = ResetTokenRepository::new(&mut tx);
            self.lifecycle
                .consume::<_, ServiceError>(&mut store, &dto.reset_token)
                .await?
        };
        if !redeemed.user.is_active() {
            return Err(CoreError::not_found("User", redeemed.user.id).into());
        }

        UserRepository::new(&mut tx)
            .update_password(&redeemed.user.id, &hash, &redeemed.user.id, now)
            .await?;

        ResetTokenRepository::new(&mut tx)
            .append_log(&PasswordResetLog {
                user_id: redeemed.user.id.clone(),
                ip: meta.ip,
                user_agent: meta.user_agent,
                token: redeemed.token.token,
                timestamp: now,
            })
            .await?;
        tx.commit().await?;

        info!(user_id = %redeemed.user.id, "Password reset completed");
        Ok(())
    }
}
