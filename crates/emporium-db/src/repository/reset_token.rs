//! # Reset Token Repository
//!
//! SQLite-backed [`ResetTokenStore`] plus the append-only reset log.
//!
//! Token values are stored as hyphenated UUID text. The primary key on
//! `password_reset_tokens.token` is what turns a value collision into a
//! retryable [`InsertError::UniquenessViolation`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use emporium_core::{InsertError, PasswordResetLog, PasswordResetToken, ResetTokenStore, User};
use sqlx::SqliteConnection;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::user::UserRepository;

#[derive(Debug, sqlx::FromRow)]
struct TokenRow {
    token: String,
    user_id: String,
    created_on: DateTime<Utc>,
    consumed_on: Option<DateTime<Utc>>,
}

impl TryFrom<TokenRow> for PasswordResetToken {
    type Error = DbError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        let token = Uuid::parse_str(&row.token).map_err(|_| DbError::Corrupt {
            column: "password_reset_tokens.token",
            value: row.token.clone(),
        })?;

        Ok(PasswordResetToken {
            token,
            user_id: row.user_id,
            created_on: row.created_on,
            consumed_on: row.consumed_on,
        })
    }
}

/// Repository for reset tokens and reset audit entries.
#[derive(Debug)]
pub struct ResetTokenRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ResetTokenRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ResetTokenRepository { conn }
    }

    /// Records a completed reset.
    pub async fn append_log(&mut self, entry: &PasswordResetLog) -> DbResult<()> {
        debug!(user_id = %entry.user_id, "Appending password reset log");

        sqlx::query(
            r#"
            INSERT INTO password_reset_logs (user_id, ip, user_agent, token, created_on)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&entry.user_id)
        .bind(&entry.ip)
        .bind(&entry.user_agent)
        .bind(entry.token.to_string())
        .bind(entry.timestamp)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn count_logs(&mut self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM password_reset_logs WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl<'c> ResetTokenStore for ResetTokenRepository<'c> {
    type Error = DbError;

    async fn unconsumed_tokens(&mut self, user_id: &str) -> DbResult<Vec<PasswordResetToken>> {
        let rows = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT token, user_id, created_on, consumed_on
            FROM password_reset_tokens
            WHERE user_id = ?1 AND consumed_on IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(PasswordResetToken::try_from).collect()
    }

    async fn insert_token(&mut self, token: &PasswordResetToken) -> Result<(), InsertError<DbError>> {
        let result = sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (token, user_id, created_on, consumed_on)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(token.token.to_string())
        .bind(&token.user_id)
        .bind(token.created_on)
        .bind(token.consumed_on)
        .execute(&mut *self.conn)
        .await;

        match result.map_err(DbError::from) {
            Ok(_) => {
                debug!(user_id = %token.user_id, "Stored reset token");
                Ok(())
            }
            Err(e) if e.violated_field() == Some("password_reset_tokens.token") => {
                warn!(user_id = %token.user_id, "Reset token collision, retrying");
                Err(InsertError::UniquenessViolation)
            }
            Err(e) => Err(InsertError::Store(e)),
        }
    }

    async fn find_token(&mut self, token: &Uuid) -> DbResult<Option<PasswordResetToken>> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT token, user_id, created_on, consumed_on
            FROM password_reset_tokens
            WHERE token = ?1
            "#,
        )
        .bind(token.to_string())
        .fetch_optional(&mut *self.conn)
        .await?;

        row.map(PasswordResetToken::try_from).transpose()
    }

    async fn mark_consumed(&mut self, token: &Uuid, at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET consumed_on = ?2
            WHERE token = ?1 AND consumed_on IS NULL
            "#,
        )
        .bind(token.to_string())
        .bind(at)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_owner(&mut self, user_id: &str) -> DbResult<Option<User>> {
        UserRepository::new(&mut *self.conn).find_by_id(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::pool::{Database, DbConfig};
    use crate::repository::user::tests::sample_user;
    use emporium_core::{CoreError, TokenLifecycle};

    #[tokio::test]
    async fn test_duplicate_token_is_retryable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        UserRepository::new(&mut conn)
            .insert(&sample_user("u1", "u1@example.com"))
            .await
            .unwrap();

        let token = PasswordResetToken {
            token: Uuid::new_v4(),
            user_id: "u1".to_string(),
            created_on: Utc::now(),
            consumed_on: None,
        };
        let mut repo = ResetTokenRepository::new(&mut conn);
        repo.insert_token(&token).await.unwrap();

        let again = repo.insert_token(&token).await.unwrap_err();
        assert!(matches!(again, InsertError::UniquenessViolation));
    }

    #[tokio::test]
    async fn test_unknown_user_is_store_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        let token = PasswordResetToken {
            token: Uuid::new_v4(),
            user_id: "ghost".to_string(),
            created_on: Utc::now(),
            consumed_on: None,
        };
        let err = ResetTokenRepository::new(&mut conn)
            .insert_token(&token)
            .await
            .unwrap_err();
        assert!(matches!(err, InsertError::Store(DbError::ForeignKeyViolation { .. })));
    }

    #[tokio::test]
    async fn test_lifecycle_against_sqlite() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        UserRepository::new(&mut conn)
            .insert(&sample_user("u1", "u1@example.com"))
            .await
            .unwrap();

        let lifecycle = TokenLifecycle::system();
        let mut repo = ResetTokenRepository::new(&mut conn);

        let issued = lifecycle.issue::<_, ServiceError>(&mut repo, "u1").await.unwrap();
        let reissued = lifecycle.issue::<_, ServiceError>(&mut repo, "u1").await.unwrap();
        assert_eq!(issued.token, reissued.token);

        let raw = issued.token.to_string();
        let redeemed = lifecycle.consume::<_, ServiceError>(&mut repo, &raw).await.unwrap();
        assert_eq!(redeemed.user.email, "u1@example.com");

        let err = lifecycle.consume::<_, ServiceError>(&mut repo, &raw).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::InvalidToken)));
        assert!(repo.unconsumed_tokens("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_log() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        UserRepository::new(&mut conn)
            .insert(&sample_user("u1", "u1@example.com"))
            .await
            .unwrap();

        let mut repo = ResetTokenRepository::new(&mut conn);
        repo.append_log(&PasswordResetLog {
            user_id: "u1".to_string(),
            ip: Some("10.0.0.1".to_string()),
            user_agent: None,
            token: Uuid::new_v4(),
            timestamp: Utc::now(),
        })
        .await
        .unwrap();
        assert_eq!(repo.count_logs("u1").await.unwrap(), 1);
    }
}
