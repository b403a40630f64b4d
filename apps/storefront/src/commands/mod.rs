//! # Commands Module
//!
//! Command functions called by the storefront UI and admin tools.
//!
//! ## Command Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Storefront Commands                             │
//! │                                                                         │
//! │  catalog.rs  ─► create_product_type, add_attributes,                    │
//! │                 add_not_allowed_combinations, get_product_type_details  │
//! │  product.rs  ─► create_product, get_product_details, list_products      │
//! │  configure.rs ► available_options, add_to_configuration                 │
//! │  session.rs  ─► start_session, select_option, finish_session, ...       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every shopper-facing command loads a fresh snapshot (product type plus
//! override) at the start of the call and hands it to forma-core.

pub mod catalog;
pub mod configure;
pub mod product;
pub mod session;

use forma_core::validation::validate_uuid;
use forma_core::{CoreError, EffectiveProduct, Product, ProductOverride, ProductType};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::DbState;

/// An `(attribute, option)` pair as entered by an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinationPairDto {
    pub attribute_id: i64,
    pub attribute_option_id: i64,
}

impl From<CombinationPairDto> for forma_core::OptionRef {
    fn from(pair: CombinationPairDto) -> Self {
        forma_core::OptionRef::new(pair.attribute_id, pair.attribute_option_id)
    }
}

/// A product with its type, its override and the projection of both.
#[derive(Debug, Clone)]
pub(crate) struct ProductSnapshot {
    pub product: Product,
    pub product_type: ProductType,
    pub overrides: ProductOverride,
    pub effective: EffectiveProduct,
}

/// Rejects a product or product type id that is not a UUID.
pub(crate) fn check_id(id: &str) -> Result<(), ApiError> {
    validate_uuid(id).map_err(CoreError::from)?;
    Ok(())
}

/// Loads a product type or fails with `NotFound`.
pub(crate) async fn load_product_type(db: &DbState, id: &str) -> Result<ProductType, ApiError> {
    check_id(id)?;
    db.inner()
        .product_types()
        .get(id)
        .await?
        .ok_or_else(|| CoreError::ProductTypeNotFound(id.to_string()).into())
}

/// Loads a product, its type and its override in one read, and applies the
/// override.
pub(crate) async fn load_product(db: &DbState, product_id: &str) -> Result<ProductSnapshot, ApiError> {
    check_id(product_id)?;
    let record = db
        .inner()
        .products()
        .load_snapshot(product_id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::ProductNotFound(product_id.to_string())))?;

    Ok(ProductSnapshot {
        effective: record.overrides.apply(&record.product_type),
        product: record.product,
        product_type: record.product_type,
        overrides: record.overrides,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixture: a shirt type (Color, Size) with rule {Red, S}.

    use forma_core::{Customisation, NewAttribute};
    use forma_db::{Database, DbConfig};

    use super::catalog::{self, CreateProductTypeRequest};
    use super::CombinationPairDto;
    use crate::state::DbState;

    pub struct Shirt {
        pub product_type_id: String,
        pub color: i64,
        pub red: i64,
        pub blue: i64,
        pub size: i64,
        pub small: i64,
        pub medium: i64,
        pub rule_id: i64,
    }

    pub async fn db() -> DbState {
        DbState::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    pub async fn shirt(db: &DbState) -> Shirt {
        let product_type = catalog::create_product_type(
            db,
            CreateProductTypeRequest {
                name: "Shirt".to_string(),
                customisation: Customisation::FullyCustomizable,
            },
        )
        .await
        .unwrap();

        let attributes = catalog::add_attributes(
            db,
            &product_type.id,
            vec![
                NewAttribute {
                    attribute_name: "Color".to_string(),
                    possible_options: vec!["Red".to_string(), "Blue".to_string()],
                },
                NewAttribute {
                    attribute_name: "Size".to_string(),
                    possible_options: vec!["S".to_string(), "M".to_string()],
                },
            ],
        )
        .await
        .unwrap();

        let (color, size) = (&attributes[0], &attributes[1]);
        let rules = catalog::add_not_allowed_combinations(
            db,
            &product_type.id,
            vec![vec![
                CombinationPairDto {
                    attribute_id: color.id,
                    attribute_option_id: color.options[0].id,
                },
                CombinationPairDto {
                    attribute_id: size.id,
                    attribute_option_id: size.options[0].id,
                },
            ]],
        )
        .await
        .unwrap();

        Shirt {
            product_type_id: product_type.id,
            color: color.id,
            red: color.options[0].id,
            blue: color.options[1].id,
            size: size.id,
            small: size.options[0].id,
            medium: size.options[1].id,
            rule_id: rules[0].combination_id,
        }
    }
}
