//! # Product Commands
//!
//! Products are product types plus an override. Creation checks every id
//! the override names against the product type before the product is
//! stored; reads return the effective catalog a shopper sees.

use std::time::Instant;

use forma_core::overrides::EffectiveAttribute;
use forma_core::resolver::resolve_all;
use forma_core::validation::{validate_product_name, validate_sku};
use forma_core::{
    AvailableOptions, CoreError, Customisation, NotAllowedCombination, OptionRef, ProductOverride,
    ProductSummary, Selection,
};
use forma_db::NewProduct;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::catalog::{combination_dto, CombinationDto};
use super::{check_id, load_product, load_product_type, CombinationPairDto, ProductSnapshot};
use crate::error::ApiError;
use crate::state::DbState;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRefDto {
    pub attribute_id: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionRefDto {
    pub attribute_id: i64,
    pub option_id: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinationRefDto {
    pub combination_id: i64,
}

/// Attribute and option level changes of a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttributeOverridesDto {
    pub deactivated_attributes: Vec<AttributeRefDto>,
    pub deactivated_options: Vec<OptionRefDto>,
    pub out_of_stock_options: Vec<OptionRefDto>,
}

/// Product type rules switched off for a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotAllowedCombinationsOverridesDto {
    pub deactivate: Vec<CombinationRefDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub product_type_id: String,
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attribute_overrides: AttributeOverridesDto,
    #[serde(default)]
    pub not_allowed_combinations_overrides: NotAllowedCombinationsOverridesDto,
    #[serde(default)]
    pub product_not_allowed_combinations: Vec<Vec<CombinationPairDto>>,
}

impl CreateProductRequest {
    /// Builds the override, rejecting malformed product rules.
    fn to_override(&self) -> Result<ProductOverride, CoreError> {
        let option_ref = |o: &OptionRefDto| OptionRef::new(o.attribute_id, o.option_id);

        let additional_not_allowed_combinations = self
            .product_not_allowed_combinations
            .iter()
            .map(|pairs| {
                let pairs = pairs.iter().copied().map(OptionRef::from).collect();
                // Ids are assigned when the product is stored.
                NotAllowedCombination::new(0, pairs).map_err(CoreError::from)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProductOverride {
            deactivated_attributes: self
                .attribute_overrides
                .deactivated_attributes
                .iter()
                .map(|a| a.attribute_id)
                .collect(),
            deactivated_options: self
                .attribute_overrides
                .deactivated_options
                .iter()
                .map(option_ref)
                .collect(),
            out_of_stock_options: self
                .attribute_overrides
                .out_of_stock_options
                .iter()
                .map(option_ref)
                .collect(),
            deactivated_combinations: self
                .not_allowed_combinations_overrides
                .deactivate
                .iter()
                .map(|c| c.combination_id)
                .collect(),
            additional_not_allowed_combinations,
        })
    }
}

/// A product as a shopper (and the admin preview) sees it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailsDto {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub product_type_id: String,
    pub product_type_name: String,
    pub customisation: Customisation,
    /// Live attributes with live options, out-of-stock flagged.
    pub attributes: Vec<EffectiveAttribute>,
    /// Options offered for each attribute before anything is picked.
    pub availability: Vec<AvailableOptions>,
    pub deactivated_combinations: Vec<i64>,
    pub product_not_allowed_combinations: Vec<CombinationDto>,
}

impl From<&ProductSnapshot> for ProductDetailsDto {
    fn from(s: &ProductSnapshot) -> Self {
        let catalog = &s.effective.catalog;
        ProductDetailsDto {
            id: s.product.id.clone(),
            name: s.product.name.clone(),
            sku: s.product.sku.clone(),
            description: s.product.description.clone(),
            product_type_id: s.product_type.id.clone(),
            product_type_name: s.product_type.name.clone(),
            customisation: s.product_type.customisation,
            attributes: catalog.attributes().to_vec(),
            availability: resolve_all(catalog, &s.effective.constraints, &Selection::new()),
            deactivated_combinations: s.overrides.deactivated_combinations.iter().copied().collect(),
            product_not_allowed_combinations: s
                .overrides
                .additional_not_allowed_combinations
                .iter()
                .map(|rule| combination_dto(&s.product_type, rule))
                .collect(),
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Creates a product with its override.
///
/// ## Errors
/// - `NotFound` for an unknown product type or any unknown id in the override
/// - `InvalidRule` for a malformed product rule
/// - `ValidationError` for bad name/SKU, a duplicate SKU, or a non-empty
///   override on a `not_customizable` type
pub async fn create_product(
    db: &DbState,
    request: CreateProductRequest,
) -> Result<ProductDetailsDto, ApiError> {
    let start = Instant::now();
    debug!(sku = %request.sku, product_type_id = %request.product_type_id, "create_product command");

    validate_product_name(&request.name).map_err(CoreError::from)?;
    validate_sku(&request.sku).map_err(CoreError::from)?;

    let product_type = load_product_type(db, &request.product_type_id).await?;
    let overrides = request.to_override()?;
    overrides.check_against(&product_type)?;

    let (product, overrides) = db
        .inner()
        .products()
        .create(
            &NewProduct {
                product_type_id: request.product_type_id,
                name: request.name,
                sku: request.sku,
                description: request.description,
            },
            &overrides,
        )
        .await?;

    let snapshot = ProductSnapshot {
        effective: overrides.apply(&product_type),
        product,
        product_type,
        overrides,
    };

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        id = %snapshot.product.id,
        "create_product complete"
    );
    Ok(ProductDetailsDto::from(&snapshot))
}

/// Gets a product with its effective attributes.
pub async fn get_product_details(db: &DbState, id: &str) -> Result<ProductDetailsDto, ApiError> {
    debug!(id = %id, "get_product_details command");
    let snapshot = load_product(db, id).await?;
    Ok(ProductDetailsDto::from(&snapshot))
}

/// Lists products by name.
///
/// ## Arguments
/// * `limit` - Maximum results to return (default: 20, max: 100)
pub async fn list_products(
    db: &DbState,
    limit: Option<u32>,
) -> Result<Vec<ProductSummary>, ApiError> {
    let limit = limit.unwrap_or(20).clamp(1, 100);
    debug!(limit = %limit, "list_products command");
    Ok(db.inner().products().list(limit).await?)
}

/// Deletes a product and its override.
pub async fn delete_product(db: &DbState, id: &str) -> Result<(), ApiError> {
    debug!(id = %id, "delete_product command");
    check_id(id)?;
    db.inner().products().delete(id).await?;
    info!(id = %id, "Product deleted");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
