//! # Validation Module
//!
//! Semantic checks the core enforces on already shape-validated input.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request schema (outside this workspace)                      │
//! │  ├── Required fields present, types coerced                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Quantity positivity                                               │
//! │  ├── Password confirmation / reuse                                     │
//! │  └── Token and email format                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (email, product name, token)                               │
//! │  └── CHECK (qty > 0)                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use uuid::Uuid;

use crate::error::{CoreError, ValidationError};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Cart
// =============================================================================

/// Cart quantities must be strictly positive.
///
/// ## Example
/// ```rust
/// use emporium_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::InvalidQuantity { qty });
    }
    Ok(())
}

// =============================================================================
// Passwords
// =============================================================================

/// Checks a new password against its confirmation and, optionally, the old one.
///
/// ## Rules
/// - `new_password != confirm_password` → `PasswordMismatch`
/// - `block_same_as_old` and `old_password == Some(new_password)` → `PasswordUnchanged`
///
/// Runs before any store access.
pub fn validate_password_change(
    new_password: &str,
    confirm_password: &str,
    old_password: Option<&str>,
    block_same_as_old: bool,
) -> ValidationResult<()> {
    if new_password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }

    if block_same_as_old && old_password == Some(new_password) {
        return Err(ValidationError::PasswordUnchanged);
    }

    if new_password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Identifiers
// =============================================================================

/// Parses a reset token.
///
/// Malformed input is reported as [`CoreError::InvalidToken`], the same
/// failure an unknown or expired token produces.
pub fn parse_reset_token(raw: &str) -> Result<Uuid, CoreError> {
    Uuid::parse_str(raw.trim()).map_err(|_| CoreError::InvalidToken)
}

/// Trims and lower-cases an email, then checks its rough shape.
///
/// ## Example
/// ```rust
/// use emporium_core::validation::normalize_email;
///
/// assert_eq!(normalize_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
/// assert!(normalize_email("nobody").is_err());
/// ```
pub fn normalize_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_lowercase();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain.tld".to_string(),
        });
    }

    Ok(email)
}

// =============================================================================
// Catalog
// =============================================================================

/// Product names: non-empty after trimming, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Prices may be zero, never negative.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Ratings run from 0 to 5.
pub fn validate_rating(rating: i64) -> ValidationResult<()> {
    if !(0..=5).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: 0,
            max: 5,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
