//! Notification adapter that records deliveries in the log.

use async_trait::async_trait;
use emporium_core::{Notifier, PasswordResetToken, User};
use tracing::info;

/// Writes each password-reset delivery as an `info` event. Always succeeds.
///
/// The token value itself is not logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send_password_reset(&self, user: &User, token: &PasswordResetToken) -> bool {
        info!(
            user_id = %user.id,
            email = %user.email,
            issued_at = %token.created_on,
            "Password reset link sent"
        );
        true
    }
}
