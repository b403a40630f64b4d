//! # forma-core: Compatibility Constraint Engine for Forma
//!
//! Pure logic for configurable products: which options a shopper may still
//! pick, and whether a finished selection is allowed. Zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Forma Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Storefront (apps/storefront)                 │   │
//! │  │   available_options, add_to_configuration, sessions, admin     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ forma-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌────────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ catalog  │  │ constraint │  │ overrides │  │ selection │  │   │
//! │  │   └────┬─────┘  └─────┬──────┘  └─────┬─────┘  └─────┬─────┘  │   │
//! │  │        └──────────────┴───────┬───────┴──────────────┘        │   │
//! │  │                     ┌─────────▼────────┐                      │   │
//! │  │                     │ resolver         │                      │   │
//! │  │                     │ validator        │                      │   │
//! │  │                     └──────────────────┘                      │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    forma-db (Database Layer)                    │   │
//! │  │            SQLite catalog provider, migrations, seed            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Product types, attributes, options
//! - [`constraint`] - Not-allowed combinations and the subset test
//! - [`overrides`] - Per-product deltas and the effective projection
//! - [`selection`] - The shopper's picks as an explicit value
//! - [`resolver`] - Available options for one attribute
//! - [`validator`] - Accept or reject a complete selection
//! - [`validation`] - Admin input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use forma_core::catalog::{Attribute, AttributeOption, ProductType};
//! use forma_core::constraint::NotAllowedCombination;
//! use forma_core::overrides::ProductOverride;
//! use forma_core::{resolver, validator, Customisation, OptionRef, Selection};
//!
//! let option = |id, name: &str| AttributeOption { id, name: name.to_string() };
//! let mut bike = ProductType::new("bike", "Bicycle", Customisation::FullyCustomizable);
//! bike.add_attribute(Attribute { id: 1, name: "Frame".into(), options: vec![option(1, "Full suspension"), option(2, "Diamond")] }).unwrap();
//! bike.add_attribute(Attribute { id: 2, name: "Wheels".into(), options: vec![option(3, "Road"), option(4, "Mountain")] }).unwrap();
//! bike.add_rule(NotAllowedCombination::new(1, vec![OptionRef::new(1, 2), OptionRef::new(2, 4)]).unwrap()).unwrap();
//!
//! let product = ProductOverride::default().apply(&bike);
//! let mut picks = Selection::new();
//! picks.select(1, 2);
//!
//! let wheels = resolver::available_options(&product.catalog, &product.constraints, &picks, 2).unwrap();
//! assert_eq!(wheels.options.len(), 1);
//!
//! picks.select(2, wheels.options[0].id);
//! assert!(validator::validate(&product.catalog, &product.constraints, &picks).is_ok());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod constraint;
pub mod error;
pub mod overrides;
pub mod resolver;
pub mod selection;
pub mod types;
pub mod validation;
pub mod validator;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{Attribute, AttributeOption, NewAttribute, ProductType};
pub use constraint::NotAllowedCombination;
pub use error::{CoreError, CoreResult, RuleError, ValidationError};
pub use overrides::{EffectiveCatalog, EffectiveConstraints, EffectiveProduct, ProductOverride};
pub use resolver::{AvailabilityMode, AvailableOptions};
pub use selection::Selection;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of product type, attribute and option names.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LENGTH: usize = 200;

/// Maximum length of a SKU.
pub const MAX_SKU_LENGTH: usize = 50;

/// Fewest pairs a not-allowed combination may have.
///
/// A single pair would just deactivate an option, which is what the
/// override layer is for.
pub const MIN_COMBINATION_PAIRS: usize = 2;
