//! # User Repository
//!
//! Accounts, password hashes and profile columns.

use chrono::{DateTime, Utc};
use emporium_core::{PasswordHash, RoleTier, User, UserStatus};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: Option<String>,
    status: UserStatus,
    role: RoleTier,
    name: String,
    phone: Option<String>,
    address: Option<String>,
    created_by: Option<String>,
    created_on: DateTime<Utc>,
    updated_by: Option<String>,
    updated_on: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash.map(PasswordHash::from_phc),
            status: row.status,
            role: row.role,
            name: row.name,
            phone: row.phone,
            address: row.address,
            created_by: row.created_by,
            created_on: row.created_on,
            updated_by: row.updated_by,
            updated_on: row.updated_on,
        }
    }
}

/// Repository for user database operations.
#[derive(Debug)]
pub struct UserRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> UserRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        UserRepository { conn }
    }

    pub async fn find_by_id(&mut self, id: &str) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, status, role, name, phone, address,
                   created_by, created_on, updated_by, updated_on
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(User::from))
    }

    /// Looks up by normalized email, regardless of status.
    pub async fn find_by_email(&mut self, email: &str) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, status, role, name, phone, address,
                   created_by, created_on, updated_by, updated_on
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(User::from))
    }

    pub async fn find_active_by_email(&mut self, email: &str) -> DbResult<Option<User>> {
        Ok(self
            .find_by_email(email)
            .await?
            .filter(|u| u.status == UserStatus::Active))
    }

    /// Inserts a new account.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation { field: "users.email" }` for a taken email.
    pub async fn insert(&mut self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, role = %user.role, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, password_hash, status, role, name, phone, address,
                created_by, created_on, updated_by, updated_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(user.password_hash.as_ref().map(PasswordHash::as_str))
        .bind(user.status)
        .bind(user.role)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.created_by)
        .bind(user.created_on)
        .bind(&user.updated_by)
        .bind(user.updated_on)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Writes name, email, phone, address and audit columns.
    pub async fn update_profile(&mut self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, "Updating user profile");

        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = ?2, email = ?3, phone = ?4, address = ?5,
                updated_by = ?6, updated_on = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.updated_by)
        .bind(user.updated_on)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", &user.id));
        }
        Ok(())
    }

    pub async fn update_password(
        &mut self,
        user_id: &str,
        hash: &PasswordHash,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %user_id, "Updating password hash");

        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?2, updated_by = ?3, updated_on = ?4
            WHERE id = ?1
            "#,
        )
        .bind(user_id)
        .bind(hash.as_str())
        .bind(updated_by)
        .bind(now)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }
        Ok(())
    }

    /// Compare-and-set on the password hash.
    ///
    /// Writes `hash` only while the stored value still equals `expected`.
    /// Returns `false` when the row is missing or its hash has moved on.
    pub async fn replace_password(
        &mut self,
        user_id: &str,
        expected: &PasswordHash,
        hash: &PasswordHash,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %user_id, "Replacing password hash");

        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?3, updated_by = ?4, updated_on = ?5
            WHERE id = ?1 AND password_hash = ?2
            "#,
        )
        .bind(user_id)
        .bind(expected.as_str())
        .bind(hash.as_str())
        .bind(updated_by)
        .bind(now)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn set_status(&mut self, user_id: &str, status: UserStatus, now: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET status = ?2, updated_on = ?3 WHERE id = ?1")
            .bind(user_id)
            .bind(status)
            .bind(now)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    pub(crate) fn sample_user(id: &str, email: &str) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: Some(PasswordHash::from_phc("$argon2id$placeholder")),
            status: UserStatus::Active,
            role: RoleTier::User,
            name: "Sample".to_string(),
            phone: Some("555-0100".to_string()),
            address: None,
            created_by: None,
            created_on: now,
            updated_by: None,
            updated_on: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = UserRepository::new(&mut conn);

        repo.insert(&sample_user("u1", "a@example.com")).await.unwrap();

        let by_id = repo.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");
        assert_eq!(by_id.role, RoleTier::User);
        assert_eq!(by_id.phone.as_deref(), Some("555-0100"));

        let by_email = repo.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, "u1");
        assert!(repo.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = UserRepository::new(&mut conn);

        repo.insert(&sample_user("u1", "a@example.com")).await.unwrap();
        let err = repo.insert(&sample_user("u2", "a@example.com")).await.unwrap_err();

        assert_eq!(err.violated_field(), Some("users.email"));
    }

    #[tokio::test]
    async fn test_inactive_hidden_from_active_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = UserRepository::new(&mut conn);

        repo.insert(&sample_user("u1", "a@example.com")).await.unwrap();
        repo.set_status("u1", UserStatus::Inactive, Utc::now()).await.unwrap();

        assert!(repo.find_active_by_email("a@example.com").await.unwrap().is_none());
        assert!(repo.find_by_email("a@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_password_missing_user() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        let err = UserRepository::new(&mut conn)
            .update_password("ghost", &PasswordHash::from_phc("x"), "ghost", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_replace_password_requires_expected_hash() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = UserRepository::new(&mut conn);
        let user = sample_user("u1", "a@example.com");
        repo.insert(&user).await.unwrap();

        let h0 = user.password_hash.clone().unwrap();
        let h1 = PasswordHash::from_phc("$argon2id$h1");
        let h2 = PasswordHash::from_phc("$argon2id$h2");

        assert!(repo.replace_password(&user.id, &h0, &h1, &user.id, Utc::now()).await.unwrap());
        assert!(!repo.replace_password(&user.id, &h0, &h2, &user.id, Utc::now()).await.unwrap());
        assert!(!repo.replace_password("ghost", &h1, &h2, "ghost", Utc::now()).await.unwrap());

        let stored = repo.find_by_id(&user.id).await.unwrap().unwrap().password_hash;
        assert_eq!(stored, Some(h1));
    }
}
