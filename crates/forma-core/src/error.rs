//! # Error Types
//!
//! Domain-specific error types for forma-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  forma-core errors (this file)                                         │
//! │  ├── CoreError        - Catalog / configuration failures               │
//! │  ├── RuleError        - Malformed not-allowed combination              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  forma-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  storefront errors (in app)                                            │
//! │  └── ApiError         - What the storefront sees (serialized)          │
//! │                                                                         │
//! │  Flow: RuleError / ValidationError → CoreError → ApiError              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable: the caller re-prompts the shopper or rejects
//! the admin input. Nothing here is fatal to the process.

use thiserror::Error;

use crate::types::{AttributeId, CombinationId, OptionId, RuleId};

// =============================================================================
// Core Error
// =============================================================================

/// Catalog and configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product type id is unknown to the catalog provider.
    #[error("Product type not found: {0}")]
    ProductTypeNotFound(String),

    /// Product id is unknown to the catalog provider.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Attribute id does not belong to the product type.
    #[error("Attribute not found: {0}")]
    AttributeNotFound(AttributeId),

    /// Option id does not belong to the attribute.
    #[error("Option {option_id} not found on attribute {attribute_id}")]
    OptionNotFound {
        attribute_id: AttributeId,
        option_id: OptionId,
    },

    /// Combination id is not defined on the product type.
    #[error("Not-allowed combination not found: {0}")]
    CombinationNotFound(CombinationId),

    /// Availability was requested for an attribute the product hides.
    ///
    /// ## When This Occurs
    /// The attribute exists on the product type but is listed in the
    /// product's `deactivated_attributes`. The storefront should never ask
    /// for it; the resolver refuses instead of returning an empty list.
    #[error("Attribute {0} is deactivated for this product")]
    InvalidAttribute(AttributeId),

    /// A selection names an attribute or option that is deactivated or does
    /// not exist for the product.
    #[error("Unknown selection: {reason}")]
    UnknownSelection { reason: String },

    /// Validation was attempted before every live attribute had a choice.
    #[error("Selection is incomplete, missing attributes: {missing:?}")]
    Incomplete { missing: Vec<AttributeId> },

    /// The selection contains every pair of a live not-allowed combination.
    ///
    /// ## User Workflow
    /// ```text
    /// Frame = Red, Tires = Offroad
    ///      │
    ///      ▼
    /// rule type#4 {Frame=Red, Tires=Offroad} ⊆ selection
    ///      │
    ///      ▼
    /// ForbiddenCombination(type#4)
    ///      │
    ///      ▼
    /// UI: "This combination is not available"
    /// ```
    #[error("Selection violates not-allowed combination {0}")]
    ForbiddenCombination(RuleId),

    /// A not-allowed combination was rejected at definition time.
    #[error("Invalid not-allowed combination: {0}")]
    InvalidRule(#[from] RuleError),

    /// Attributes were added to a `not_customizable` product type.
    #[error("Product type {0} is not customizable")]
    NotCustomizable(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an UnknownSelection error.
    pub fn unknown_selection(reason: impl Into<String>) -> Self {
        CoreError::UnknownSelection {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Rule Error
// =============================================================================

/// Why a not-allowed combination cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// Fewer than two (attribute, option) pairs.
    #[error("a combination needs at least {min} pairs, found {found}")]
    TooFewPairs { found: usize, min: usize },

    /// The same attribute is named by two pairs of one combination.
    #[error("attribute {0} appears more than once")]
    RepeatedAttribute(AttributeId),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when admin input doesn't meet requirements.
/// Used for early validation before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., two options with the same name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::OptionNotFound {
            attribute_id: 3,
            option_id: 17,
        };
        assert_eq!(err.to_string(), "Option 17 not found on attribute 3");

        let err = CoreError::ForbiddenCombination(RuleId::ProductType(4));
        assert_eq!(
            err.to_string(),
            "Selection violates not-allowed combination type#4"
        );
    }

    #[test]
    fn test_rule_error_converts_to_core_error() {
        let err: CoreError = RuleError::TooFewPairs { found: 1, min: 2 }.into();
        assert!(matches!(err, CoreError::InvalidRule(_)));
        assert_eq!(
            err.to_string(),
            "Invalid not-allowed combination: a combination needs at least 2 pairs, found 1"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
