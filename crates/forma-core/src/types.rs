//! # Domain Types
//!
//! Identifiers and small value types shared by every module of forma-core.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ProductType    │   │    Product      │   │   OptionRef     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  product_type_id│   │  attribute_id   │       │
//! │  │  name           │   │  id (UUID)      │   │  option_id      │       │
//! │  │  customisation  │   │  sku (business) │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │ Customisation   │   │     RuleId      │                              │
//! │  │  ─────────────  │   │  ─────────────  │                              │
//! │  │  Fully          │   │  ProductType(n) │                              │
//! │  │  NotCustomizable│   │  Product(n)     │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! - Product types and products: UUID v4 strings.
//! - Attributes, options and combinations: integer row ids, assigned in
//!   definition order.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Stable integer id of an attribute.
pub type AttributeId = i64;

/// Integer id of an option, unique within its attribute.
pub type OptionId = i64;

/// Integer id of a not-allowed combination.
pub type CombinationId = i64;

// =============================================================================
// Customisation
// =============================================================================

/// Whether a product type varies along attributes at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Customisation {
    /// Attributes, options and constraints apply.
    FullyCustomizable,
    /// A single fixed SKU: no attributes, no constraints.
    NotCustomizable,
}

impl Default for Customisation {
    fn default() -> Self {
        Customisation::FullyCustomizable
    }
}

// =============================================================================
// Option Reference
// =============================================================================

/// An `(attribute, option)` pair.
///
/// The unit of every rule, override set and selection entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OptionRef {
    pub attribute_id: AttributeId,
    pub option_id: OptionId,
}

impl OptionRef {
    #[inline]
    pub const fn new(attribute_id: AttributeId, option_id: OptionId) -> Self {
        OptionRef {
            attribute_id,
            option_id,
        }
    }
}

impl From<(AttributeId, OptionId)> for OptionRef {
    fn from((attribute_id, option_id): (AttributeId, OptionId)) -> Self {
        OptionRef::new(attribute_id, option_id)
    }
}

// =============================================================================
// Rule Identity
// =============================================================================

/// Identifies an enforced rule together with the layer that defined it.
///
/// Product-type rules and product-specific rules share one integer id space
/// in storage, but naming the origin makes rejections readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    /// Defined on the product type; can be deactivated per product.
    ProductType(CombinationId),
    /// Added by a product's override.
    Product(CombinationId),
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleId::ProductType(id) => write!(f, "type#{id}"),
            RuleId::Product(id) => write!(f, "product#{id}"),
        }
    }
}

// =============================================================================
// Product Type Summary
// =============================================================================

/// A product type without its attributes (for listings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductTypeSummary {
    pub id: String,
    pub name: String,
    pub customisation: Customisation,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A sellable product built on a product type.
///
/// Its [`ProductOverride`](crate::overrides::ProductOverride) is loaded
/// separately because it changes independently of the product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The product type this product configures.
    pub product_type_id: String,

    /// Display name.
    pub name: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Optional description for product details.
    pub description: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A product row for listings, with its product type's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub product_type_id: String,
    pub product_type_name: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
