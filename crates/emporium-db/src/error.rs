//! # Database and Service Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← categorized (unique / foreign key / not found / ...)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceError ← DbError or CoreError, one per failed operation         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kind() → ErrorKind → http_status() in the outer adapter               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use emporium_core::{CoreError, ErrorKind, ValidationError};
use sqlx::error::ErrorKind as SqlxErrorKind;
use thiserror::Error;

// =============================================================================
// DbError
// =============================================================================

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate user email or product name
    /// - Reset token value collision
    /// - Second cart for the same user
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Cart line or order referencing a missing product
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed (including CHECK constraints and triggers).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored value could not be turned back into a domain value.
    #[error("Corrupt {column} value: {value}")]
    Corrupt { column: &'static str, value: String },

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }

    /// The `table.column` of a unique violation, if that is what this is.
    pub fn violated_field(&self) -> Option<&str> {
        match self {
            DbError::UniqueViolation { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound          → DbError::NotFound
/// Database(kind = UniqueViolation)  → DbError::UniqueViolation { field: "table.column" }
/// Database(kind = ForeignKey...)    → DbError::ForeignKeyViolation
/// Database(other)                   → DbError::QueryFailed
/// sqlx::Error::PoolTimedOut         → DbError::PoolExhausted
/// Other                             → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                match db_err.kind() {
                    // SQLite reports "UNIQUE constraint failed: <table>.<column>"
                    SqlxErrorKind::UniqueViolation => {
                        let field = msg
                            .split("UNIQUE constraint failed: ")
                            .nth(1)
                            .unwrap_or("unknown")
                            .to_string();
                        DbError::duplicate(field, "unknown")
                    }
                    SqlxErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    },
                    _ => DbError::QueryFailed(msg.to_string()),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// ServiceError
// =============================================================================

/// Failure of a transactional service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    /// A blocking task (password hashing) panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Worker(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Core(e) => e.kind(),
            ServiceError::Db(DbError::NotFound { .. }) => ErrorKind::NotFound,
            ServiceError::Db(DbError::UniqueViolation { .. }) => ErrorKind::Conflict,
            ServiceError::Db(_) | ServiceError::Worker(_) => ErrorKind::Internal,
        }
    }

    /// The wrapped core error, if any.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            ServiceError::Core(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Db(err.into())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(err.into())
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_kind() {
        let err: ServiceError = ValidationError::PasswordMismatch.into();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err: ServiceError = DbError::duplicate("users.email", "a@b.c").into();
        assert_eq!(err.kind().http_status(), 409);

        let err: ServiceError = DbError::QueryFailed("boom".into()).into();
        assert_eq!(err.kind().http_status(), 500);
    }

    #[test]
    fn test_violated_field() {
        let err = DbError::duplicate("products.name", "x");
        assert!(err.is_unique_violation());
        assert_eq!(err.violated_field(), Some("products.name"));
        assert_eq!(DbError::PoolExhausted.violated_field(), None);
    }
}
