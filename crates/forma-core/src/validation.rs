//! # Validation Module
//!
//! Input validation for the admin write path.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront command (Rust)                                    │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: names, SKUs, ids                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Catalog model (catalog.rs / constraint.rs)                   │
//! │  └── Rule shape, referenced ids exist                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use forma_core::validation::{validate_sku, validate_product_type_name};
//!
//! assert!(validate_sku("BIKE-CITY-01").is_ok());
//! assert!(validate_product_type_name("Bicycle").is_ok());
//! ```

use crate::error::ValidationError;
use crate::{MAX_NAME_LENGTH, MAX_PRODUCT_NAME_LENGTH, MAX_SKU_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Catalog Names
// =============================================================================

/// Validates a product type name (non-empty, at most 100 characters).
pub fn validate_product_type_name(name: &str) -> ValidationResult<()> {
    validate_name("product type name", name, MAX_NAME_LENGTH)
}

/// Validates an attribute name (non-empty, at most 100 characters).
pub fn validate_attribute_name(name: &str) -> ValidationResult<()> {
    validate_name("attribute name", name, MAX_NAME_LENGTH)
}

/// Validates an option name (non-empty, at most 100 characters).
pub fn validate_option_name(name: &str) -> ValidationResult<()> {
    validate_name("option name", name, MAX_NAME_LENGTH)
}

// =============================================================================
// Product Fields
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name, MAX_PRODUCT_NAME_LENGTH)
}

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use forma_core::validation::validate_sku;
///
/// assert!(validate_sku("BIKE-001").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    validate_name("sku", sku, MAX_SKU_LENGTH)?;

    if !sku
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string (product and product type ids).
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_names() {
        assert!(validate_product_type_name("Bicycle").is_ok());
        assert!(validate_attribute_name("  Frame finish ").is_ok());
        assert!(validate_option_name("").is_err());
        assert!(validate_option_name("   ").is_err());
        assert!(validate_attribute_name(&"A".repeat(101)).is_err());
        assert!(validate_attribute_name(&"A".repeat(100)).is_ok());
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("BIKE-001").is_ok());
        assert!(validate_sku("frame_red").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("City Bike").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
