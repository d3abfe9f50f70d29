//! # Error Types
//!
//! Domain-specific error types for emporium-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  emporium-core errors (this file)                                      │
//! │  ├── CoreError        - Domain failures (not found, conflict, ...)     │
//! │  └── ValidationError  - Semantic input failures                        │
//! │                                                                         │
//! │  emporium-db errors (separate crate)                                   │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - CoreError | DbError at a service boundary      │
//! │                                                                         │
//! │  Every error answers kind() → ErrorKind → http_status()                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Kind Mapping
//! | Variant                       | Kind           | Status |
//! |-------------------------------|----------------|--------|
//! | `Validation`, `InvalidRole`   | Validation     | 400    |
//! | `NotFound`, `InvalidToken`    | NotFound       | 404    |
//! | `Conflict`                    | Conflict       | 409    |
//! | `Forbidden`                   | Authorization  | 403    |
//! | `TokenIssuanceExhausted`      | ExhaustedRetry | 500    |
//! | `NotificationFailed`, hashing | Internal       | 500    |

use thiserror::Error;

use crate::rights::Right;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification an outer adapter maps onto a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller can resubmit corrected input.
    Validation,
    NotFound,
    Conflict,
    Authorization,
    /// A bounded retry loop gave up. Never retried by the core itself.
    ExhaustedRetry,
    Internal,
}

impl ErrorKind {
    /// HTTP-equivalent status code.
    pub const fn http_status(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Authorization => 403,
            ErrorKind::ExhaustedRetry | ErrorKind::Internal => 500,
        }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every core operation either succeeds or returns exactly one of these.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Semantic input failure (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A user, product, cart, order or token does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Creating or renaming would duplicate a unique value.
    ///
    /// ## When This Occurs
    /// - Sign-up with an email that is already registered
    /// - Creating a product whose name is taken
    #[error("{entity} with {field} '{value}' already exists")]
    Conflict {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// The actor's role lacks the permission atom.
    #[error("Missing permission: {right}")]
    Forbidden { right: Right },

    /// A role name that is not in the role table.
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Reset token is malformed, unknown, consumed or expired.
    ///
    /// One variant for every reason, so callers cannot tell which check failed.
    #[error("Invalid or expired password reset token")]
    InvalidToken,

    /// Every attempt to mint a unique reset token collided.
    #[error("Could not issue a unique reset token after {attempts} attempts")]
    TokenIssuanceExhausted { attempts: u32 },

    /// The notification collaborator reported a delivery failure.
    #[error("Failed to deliver password reset notification")]
    NotificationFailed,

    /// The hasher rejected its parameters or input.
    #[error("Password hashing failed: {0}")]
    PasswordHashing(String),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a Conflict error.
    pub fn conflict(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        CoreError::Conflict {
            entity,
            field,
            value: value.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) | CoreError::InvalidRole(_) => ErrorKind::Validation,
            CoreError::NotFound { .. } | CoreError::InvalidToken => ErrorKind::NotFound,
            CoreError::Conflict { .. } => ErrorKind::Conflict,
            CoreError::Forbidden { .. } => ErrorKind::Authorization,
            CoreError::TokenIssuanceExhausted { .. } => ErrorKind::ExhaustedRetry,
            CoreError::NotificationFailed | CoreError::PasswordHashing(_) => ErrorKind::Internal,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Semantic validation errors.
///
/// Shape validation happens before the core is called; these cover the rules
/// that need domain knowledge.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Cart quantities must be strictly positive.
    #[error("Quantity must be positive, got {qty}")]
    InvalidQuantity { qty: i64 },

    /// New password and its confirmation differ.
    #[error("Password and confirmation do not match")]
    PasswordMismatch,

    /// New password equals the current one.
    #[error("New password must differ from the current password")]
    PasswordUnchanged,

    /// Supplied current password is wrong.
    #[error("Current password is incorrect")]
    InvalidCredentials,
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_status_mapping() {
        let err = CoreError::from(ValidationError::InvalidQuantity { qty: 0 });
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.kind().http_status(), 400);

        assert_eq!(CoreError::not_found("Cart", "u1").kind().http_status(), 404);
        assert_eq!(CoreError::InvalidToken.kind().http_status(), 404);
        assert_eq!(
            CoreError::conflict("User", "email", "a@b.c").kind().http_status(),
            409
        );
        assert_eq!(
            CoreError::Forbidden {
                right: Right::CHECKOUT
            }
            .kind()
            .http_status(),
            403
        );
        assert_eq!(
            CoreError::TokenIssuanceExhausted { attempts: 5 }.kind(),
            ErrorKind::ExhaustedRetry
        );
        assert_eq!(CoreError::NotificationFailed.kind().http_status(), 500);
    }

    #[test]
    fn test_messages_carry_context() {
        let err = CoreError::conflict("Product", "name", "Notebook");
        assert_eq!(err.to_string(), "Product with name 'Notebook' already exists");

        let err = CoreError::Forbidden {
            right: Right::MANAGE_PRODUCTS,
        };
        assert_eq!(err.to_string(), "Missing permission: MANAGE_PRODUCTS");
    }
}
