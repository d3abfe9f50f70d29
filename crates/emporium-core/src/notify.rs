//! # Notification Collaborator
//!
//! Delivery of password-reset messages. The core only needs to know whether
//! delivery succeeded; a failure aborts the forgot-password flow.

use async_trait::async_trait;

use crate::types::{PasswordResetToken, User};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `token` to `user`. Returns `false` when delivery failed.
    async fn send_password_reset(&self, user: &User, token: &PasswordResetToken) -> bool;
}
