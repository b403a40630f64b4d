//! # Catalog Commands
//!
//! Admin write path for product types: creation, attribute entry and
//! not-allowed combination entry, plus the read views the admin needs.
//!
//! ## Write Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_not_allowed_combinations(type, [[{attributeId, attributeOptionId}]])│
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load ProductType snapshot ──► NotFound                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  check_combination(rule) for EVERY rule ──► InvalidRule / NotFound      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  one transaction: insert all rules                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Instant;

use forma_core::validation::validate_product_type_name;
use forma_core::{
    Attribute, AttributeOption, CoreError, Customisation, NewAttribute, NotAllowedCombination,
    OptionRef, ProductType, ProductTypeSummary,
};
use forma_db::NewProductType;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{check_id, load_product_type, CombinationPairDto};
use crate::error::ApiError;
use crate::state::DbState;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductTypeRequest {
    pub name: String,
    pub customisation: Customisation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTypeDto {
    pub id: String,
    pub name: String,
    pub customisation: Customisation,
}

impl From<ProductTypeSummary> for ProductTypeDto {
    fn from(t: ProductTypeSummary) -> Self {
        ProductTypeDto {
            id: t.id,
            name: t.name,
            customisation: t.customisation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDto {
    pub id: i64,
    pub name: String,
}

impl From<AttributeOption> for OptionDto {
    fn from(o: AttributeOption) -> Self {
        OptionDto { id: o.id, name: o.name }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDto {
    pub id: i64,
    pub name: String,
    pub options: Vec<OptionDto>,
}

impl From<Attribute> for AttributeDto {
    fn from(a: Attribute) -> Self {
        AttributeDto {
            id: a.id,
            name: a.name,
            options: a.options.into_iter().map(OptionDto::from).collect(),
        }
    }
}

/// One pair of a rule, with the names an admin reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedPairDto {
    pub attribute_id: i64,
    pub attribute_name: String,
    pub option_id: i64,
    pub option_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinationDto {
    pub combination_id: i64,
    pub options: Vec<NamedPairDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTypeDetailsDto {
    pub id: String,
    pub name: String,
    pub customisation: Customisation,
    pub attributes: Vec<AttributeDto>,
    pub not_allowed_combinations: Vec<CombinationDto>,
}

/// Names the pairs of `rule` from `product_type`.
///
/// Pairs whose ids no longer resolve keep an empty name.
pub(crate) fn combination_dto(
    product_type: &ProductType,
    rule: &NotAllowedCombination,
) -> CombinationDto {
    CombinationDto {
        combination_id: rule.id,
        options: rule
            .pairs()
            .iter()
            .map(|pair| named_pair(product_type, *pair))
            .collect(),
    }
}

fn named_pair(product_type: &ProductType, pair: OptionRef) -> NamedPairDto {
    let attribute = product_type.attribute(pair.attribute_id).ok();
    let option = attribute.and_then(|a| a.option(pair.option_id).ok());
    NamedPairDto {
        attribute_id: pair.attribute_id,
        attribute_name: attribute.map(|a| a.name.clone()).unwrap_or_default(),
        option_id: pair.option_id,
        option_name: option.map(|o| o.name.clone()).unwrap_or_default(),
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Creates an empty product type.
pub async fn create_product_type(
    db: &DbState,
    request: CreateProductTypeRequest,
) -> Result<ProductTypeDto, ApiError> {
    debug!(name = %request.name, "create_product_type command");
    validate_product_type_name(&request.name).map_err(CoreError::from)?;

    let summary = db
        .inner()
        .product_types()
        .create(&NewProductType {
            name: request.name,
            customisation: request.customisation,
        })
        .await?;

    info!(id = %summary.id, "Product type created");
    Ok(ProductTypeDto::from(summary))
}

/// Lists product types by name.
pub async fn list_product_types(db: &DbState) -> Result<Vec<ProductTypeDto>, ApiError> {
    let types = db.inner().product_types().list().await?;
    Ok(types.into_iter().map(ProductTypeDto::from).collect())
}

/// Appends attributes, with their options, to a product type.
///
/// ## Errors
/// - `NotFound` for an unknown product type
/// - `ValidationError` for a `not_customizable` type, a bad name, an
///   attribute without options or two options with the same name
pub async fn add_attributes(
    db: &DbState,
    product_type_id: &str,
    attributes: Vec<NewAttribute>,
) -> Result<Vec<AttributeDto>, ApiError> {
    let start = Instant::now();
    debug!(product_type_id = %product_type_id, count = attributes.len(), "add_attributes command");

    let product_type = load_product_type(db, product_type_id).await?;
    product_type.check_new_attributes(&attributes)?;

    let stored = db
        .inner()
        .product_types()
        .add_attributes(product_type_id, &attributes)
        .await?;

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = stored.len(),
        "add_attributes complete"
    );
    Ok(stored.into_iter().map(AttributeDto::from).collect())
}

/// Adds shared not-allowed combinations to a product type.
///
/// Every rule is checked before anything is written; one bad rule rejects
/// the whole batch. Identical rules are accepted.
pub async fn add_not_allowed_combinations(
    db: &DbState,
    product_type_id: &str,
    combinations: Vec<Vec<CombinationPairDto>>,
) -> Result<Vec<CombinationDto>, ApiError> {
    let start = Instant::now();
    debug!(
        product_type_id = %product_type_id,
        count = combinations.len(),
        "add_not_allowed_combinations command"
    );

    let product_type = load_product_type(db, product_type_id).await?;

    let rules: Vec<Vec<OptionRef>> = combinations
        .into_iter()
        .map(|pairs| pairs.into_iter().map(OptionRef::from).collect())
        .collect();
    for pairs in &rules {
        product_type.check_combination(pairs)?;
    }

    let stored = db
        .inner()
        .product_types()
        .add_not_allowed_combinations(product_type_id, &rules)
        .await?;

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = stored.len(),
        "add_not_allowed_combinations complete"
    );
    Ok(stored
        .iter()
        .map(|rule| combination_dto(&product_type, rule))
        .collect())
}

/// Full definition of a product type: attributes, options and named rules.
pub async fn get_product_type_details(
    db: &DbState,
    id: &str,
) -> Result<ProductTypeDetailsDto, ApiError> {
    debug!(id = %id, "get_product_type_details command");
    let product_type = load_product_type(db, id).await?;

    let not_allowed_combinations = product_type
        .rules()
        .iter()
        .map(|rule| combination_dto(&product_type, rule))
        .collect();

    Ok(ProductTypeDetailsDto {
        not_allowed_combinations,
        attributes: product_type
            .attributes
            .into_iter()
            .map(AttributeDto::from)
            .collect(),
        id: product_type.id,
        name: product_type.name,
        customisation: product_type.customisation,
    })
}

/// Deletes a product type with its attributes, rules and products.
pub async fn delete_product_type(db: &DbState, id: &str) -> Result<(), ApiError> {
    debug!(id = %id, "delete_product_type command");
    check_id(id)?;
    db.inner().product_types().delete(id).await?;
    info!(id = %id, "Product type deleted");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{db, shirt};
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_details_name_rule_pairs() {
        let db = db().await;
        let shirt = shirt(&db).await;

        let details = get_product_type_details(&db, &shirt.product_type_id)
            .await
            .unwrap();

        assert_eq!(details.name, "Shirt");
        let names: Vec<_> = details.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Color", "Size"]);

        assert_eq!(details.not_allowed_combinations.len(), 1);
        let rule = &details.not_allowed_combinations[0];
        assert_eq!(rule.combination_id, shirt.rule_id);
        let pairs: Vec<_> = rule
            .options
            .iter()
            .map(|p| (p.attribute_name.as_str(), p.option_name.as_str()))
            .collect();
        assert_eq!(pairs, vec![("Color", "Red"), ("Size", "S")]);
    }

    #[tokio::test]
    async fn test_list_product_types() {
        let db = db().await;
        shirt(&db).await;

        let types = list_product_types(&db).await.unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].customisation, Customisation::FullyCustomizable);
    }

    #[tokio::test]
    async fn test_create_product_type_rejects_blank_name() {
        let db = db().await;

        let err = create_product_type(
            &db,
            CreateProductTypeRequest {
                name: "   ".to_string(),
                customisation: Customisation::FullyCustomizable,
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.error, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_not_customizable_rejects_attributes() {
        let db = db().await;
        let gift = create_product_type(
            &db,
            CreateProductTypeRequest {
                name: "Gift card".to_string(),
                customisation: Customisation::NotCustomizable,
            },
        )
        .await
        .unwrap();

        let err = add_attributes(
            &db,
            &gift.id,
            vec![NewAttribute {
                attribute_name: "Value".to_string(),
                possible_options: vec!["50".to_string()],
            }],
        )
        .await
        .unwrap_err();

        assert_eq!(err.error, ErrorCode::ValidationError);
        let details = get_product_type_details(&db, &gift.id).await.unwrap();
        assert!(details.attributes.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_rules_write_nothing() {
        let db = db().await;
        let shirt = shirt(&db).await;

        let good = vec![
            CombinationPairDto {
                attribute_id: shirt.color,
                attribute_option_id: shirt.blue,
            },
            CombinationPairDto {
                attribute_id: shirt.size,
                attribute_option_id: shirt.medium,
            },
        ];
        let one_pair = vec![CombinationPairDto {
            attribute_id: shirt.color,
            attribute_option_id: shirt.red,
        }];
        let same_attribute = vec![
            CombinationPairDto {
                attribute_id: shirt.color,
                attribute_option_id: shirt.red,
            },
            CombinationPairDto {
                attribute_id: shirt.color,
                attribute_option_id: shirt.blue,
            },
        ];
        let foreign_option = vec![
            CombinationPairDto {
                attribute_id: shirt.color,
                attribute_option_id: shirt.small,
            },
            CombinationPairDto {
                attribute_id: shirt.size,
                attribute_option_id: shirt.medium,
            },
        ];

        let err = add_not_allowed_combinations(
            &db,
            &shirt.product_type_id,
            vec![good.clone(), one_pair],
        )
        .await
        .unwrap_err();
        assert_eq!(err.error, ErrorCode::InvalidRule);

        let err = add_not_allowed_combinations(&db, &shirt.product_type_id, vec![same_attribute])
            .await
            .unwrap_err();
        assert_eq!(err.error, ErrorCode::InvalidRule);

        let err = add_not_allowed_combinations(&db, &shirt.product_type_id, vec![foreign_option])
            .await
            .unwrap_err();
        assert_eq!(err.error, ErrorCode::NotFound);

        let details = get_product_type_details(&db, &shirt.product_type_id)
            .await
            .unwrap();
        assert_eq!(details.not_allowed_combinations.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_rules_are_kept() {
        let db = db().await;
        let shirt = shirt(&db).await;

        let rule = vec![
            CombinationPairDto {
                attribute_id: shirt.color,
                attribute_option_id: shirt.red,
            },
            CombinationPairDto {
                attribute_id: shirt.size,
                attribute_option_id: shirt.small,
            },
        ];
        let stored = add_not_allowed_combinations(&db, &shirt.product_type_id, vec![rule])
            .await
            .unwrap();

        assert_ne!(stored[0].combination_id, shirt.rule_id);
        let details = get_product_type_details(&db, &shirt.product_type_id)
            .await
            .unwrap();
        assert_eq!(details.not_allowed_combinations.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_product_type() {
        let db = db().await;

        let missing = uuid::Uuid::new_v4().to_string();

        let err = get_product_type_details(&db, &missing).await.unwrap_err();
        assert_eq!(err.error, ErrorCode::NotFound);

        let err = delete_product_type(&db, &missing).await.unwrap_err();
        assert_eq!(err.error, ErrorCode::NotFound);

        let err = get_product_type_details(&db, "missing").await.unwrap_err();
        assert_eq!(err.error, ErrorCode::ValidationError);

        let err = delete_product_type(&db, "").await.unwrap_err();
        assert_eq!(err.error, ErrorCode::ValidationError);
    }
}
