//! Account signup, profile and password change.

use chrono::Utc;
use emporium_core::validation::{normalize_email, validate_password_change};
use emporium_core::{
    Actor, ChangePasswordDto, CoreError, CredentialEngine, PasswordHash, Right, SignupDto, UpdateProfileDto, User,
    UserProfile, UserStatus, ValidationError, DEFAULT_SIGNUP_ROLE,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::{conflict_on_duplicate, hash_password, verify_password};
use crate::error::ServiceResult;
use crate::pool::Database;
use crate::repository::UserRepository;

/// Account operations for signed-up users.
#[derive(Clone)]
pub struct AccountService {
    db: Database,
    credentials: CredentialEngine,
}

impl AccountService {
    pub fn new(db: Database, credentials: CredentialEngine) -> Self {
        AccountService { db, credentials }
    }

    /// Creates an active account with the default signup role.
    ///
    /// ## Errors
    /// - `Conflict` when the normalized email is taken
    /// - `Validation` for an empty name or password, or a malformed email
    pub async fn signup(&self, dto: SignupDto) -> ServiceResult<UserProfile> {
        let email = normalize_email(&dto.email)?;
        let name = required("name", &dto.name)?;
        if dto.password.is_empty() {
            return Err(ValidationError::Required {
                field: "password".to_string(),
            }
            .into());
        }

        let hash = hash_password(&self.credentials, &dto.password).await?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            password_hash: Some(hash),
            status: UserStatus::Active,
            role: DEFAULT_SIGNUP_ROLE,
            name,
            phone: dto.phone,
            address: dto.address,
            created_by: None,
            created_on: now,
            updated_by: None,
            updated_on: now,
        };

        let mut tx = self.db.begin_write().await?;
        if UserRepository::new(&mut tx).find_by_email(&email).await?.is_some() {
            return Err(CoreError::conflict("User", "email", email).into());
        }
        UserRepository::new(&mut tx)
            .insert(&user)
            .await
            .map_err(|e| conflict_on_duplicate(e, "User", "email", &email))?;
        tx.commit().await?;

        info!(user_id = %user.id, role = %user.role, "User signed up");
        Ok(user.profile())
    }

    pub async fn fetch_profile(&self, actor: &Actor<'_>) -> ServiceResult<UserProfile> {
        actor.authorize(Right::VIEW_PROFILE)?;

        let mut conn = self.db.acquire().await?;
        let user = UserRepository::new(&mut conn)
            .find_by_id(actor.user_id())
            .await?
            .ok_or_else(|| CoreError::not_found("User", actor.user_id()))?;

        Ok(user.profile())
    }

    /// Applies the fields present in `dto`.
    ///
    /// ## Errors
    /// - `NotFound` when the actor's account is gone
    /// - `Conflict` when the new email belongs to another account
    pub async fn update_profile(&self, actor: &Actor<'_>, dto: UpdateProfileDto) -> ServiceResult<UserProfile> {
        actor.authorize(Right::UPDATE_PROFILE)?;

        let email = dto.email.as_deref().map(normalize_email).transpose()?;
        let name = dto.name.as_deref().map(|n| required("name", n)).transpose()?;

        let mut tx = self.db.begin_write().await?;
        let mut user = UserRepository::new(&mut tx)
            .find_by_id(actor.user_id())
            .await?
            .ok_or_else(|| CoreError::not_found("User", actor.user_id()))?;

        if let Some(email) = email {
            if email != user.email {
                let taken = UserRepository::new(&mut tx).find_by_email(&email).await?;
                if taken.is_some_and(|other| other.id != user.id) {
                    return Err(CoreError::conflict("User", "email", email).into());
                }
                user.email = email;
            }
        }
        if let Some(name) = name {
            user.name = name;
        }
        if dto.phone.is_some() {
            user.phone = dto.phone;
        }
        if dto.address.is_some() {
            user.address = dto.address;
        }
        user.updated_by = Some(actor.user_id().to_string());
        user.updated_on = Utc::now();

        UserRepository::new(&mut tx)
            .update_profile(&user)
            .await
            .map_err(|e| conflict_on_duplicate(e, "User", "email", &user.email))?;
        tx.commit().await?;

        info!(user_id = %user.id, "Profile updated");
        Ok(user.profile())
    }

    /// Replaces the actor's password after checking the old one.
    ///
    /// ## Errors
    /// - `PasswordMismatch` / `PasswordUnchanged` before any store access
    /// - `InvalidCredentials` when `old_password` does not verify, or the
    ///   stored hash changed between the check and the write
    pub async fn change_password(&self, actor: &Actor<'_>, dto: ChangePasswordDto) -> ServiceResult<()> {
        actor.authorize(Right::CHANGE_PASSWORD)?;
        validate_password_change(
            &dto.new_password,
            &dto.confirm_password,
            Some(dto.old_password.as_str()),
            true,
        )?;

        let current = {
            let mut conn = self.db.acquire().await?;
            UserRepository::new(&mut conn)
                .find_by_id(actor.user_id())
                .await?
                .ok_or_else(|| CoreError::not_found("User", actor.user_id()))?
                .password_hash
        };

        let verified = match &current {
            Some(hash) => verify_password(&self.credentials, hash, &dto.old_password).await?,
            None => false,
        };
        let Some(current) = current.filter(|_| verified) else {
            return Err(ValidationError::InvalidCredentials.into());
        };

        let hash = hash_password(&self.credentials, &dto.new_password).await?;
        self.swap_password(actor.user_id(), &current, &hash).await?;

        info!(user_id = %actor.user_id(), "Password changed");
        Ok(())
    }

    /// Writes `hash` only if the stored hash is still the one that was verified.
    async fn swap_password(&self, user_id: &str, verified: &PasswordHash, hash: &PasswordHash) -> ServiceResult<()> {
        let mut tx = self.db.begin_write().await?;
        let swapped = UserRepository::new(&mut tx)
            .replace_password(user_id, verified, hash, user_id, Utc::now())
            .await?;
        if !swapped {
            warn!(user_id = %user_id, "Password changed concurrently, rejecting stale change");
            return Err(ValidationError::InvalidCredentials.into());
        }
        tx.commit().await?;
        Ok(())
    }
}

fn required(field: &str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(value.to_string())
}
