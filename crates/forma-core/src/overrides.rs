//! # Override Layer
//!
//! Per-product deltas on top of a product type, and the projection that
//! turns a product type plus an override into the *effective* catalog and
//! constraint set the resolver and validator work on.
//!
//! ## Projection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ProductType  +  ProductOverride                      │
//! │                                                                         │
//! │  attributes ──── minus deactivated_attributes ──────► effective attrs  │
//! │  options    ──── minus deactivated_options ─────────► effective opts   │
//! │                  flag out_of_stock_options            (out_of_stock)   │
//! │  type rules ──── minus deactivated_combinations ──┐                    │
//! │                                                   ├─► effective rules  │
//! │  additional_not_allowed_combinations ─────────────┘                    │
//! │                                                                         │
//! │  Rules naming a deactivated attribute are dropped: that attribute is   │
//! │  never part of a valid selection, so such a rule can never fire.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The projection is pure and cheap. It is recomputed per request and never
//! cached, because an override can change between requests.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::ProductType;
use crate::constraint::{is_subset, NotAllowedCombination};
use crate::error::{CoreError, CoreResult};
use crate::selection::Selection;
use crate::types::{AttributeId, CombinationId, OptionId, OptionRef, RuleId};

// =============================================================================
// Product Override
// =============================================================================

/// What one product changes about its product type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOverride {
    /// Hidden entirely from configuration.
    pub deactivated_attributes: BTreeSet<AttributeId>,
    /// Never offered as selectable.
    pub deactivated_options: BTreeSet<OptionRef>,
    /// Offered, flagged `out_of_stock`.
    pub out_of_stock_options: BTreeSet<OptionRef>,
    /// Product-type rules not enforced for this product.
    pub deactivated_combinations: BTreeSet<CombinationId>,
    /// Extra rules for this product only.
    pub additional_not_allowed_combinations: Vec<NotAllowedCombination>,
}

impl ProductOverride {
    /// True if the override changes nothing.
    pub fn is_empty(&self) -> bool {
        self.deactivated_attributes.is_empty()
            && self.deactivated_options.is_empty()
            && self.out_of_stock_options.is_empty()
            && self.deactivated_combinations.is_empty()
            && self.additional_not_allowed_combinations.is_empty()
    }

    /// Write-time check that every referenced id belongs to `product_type`.
    ///
    /// ## Rules
    /// - A `not_customizable` type accepts only an empty override
    /// - Deactivated / out-of-stock entries name existing attributes and options
    /// - Deactivated combinations are rules of this product type
    /// - Additional rules pass [`ProductType::check_combination`]
    pub fn check_against(&self, product_type: &ProductType) -> CoreResult<()> {
        if !product_type.is_customizable() && !self.is_empty() {
            return Err(CoreError::NotCustomizable(product_type.id.clone()));
        }

        for attribute_id in &self.deactivated_attributes {
            product_type.attribute(*attribute_id)?;
        }

        for pair in self.deactivated_options.iter().chain(&self.out_of_stock_options) {
            product_type.option(pair.attribute_id, pair.option_id)?;
        }

        for combination_id in &self.deactivated_combinations {
            if product_type.rule(*combination_id).is_none() {
                return Err(CoreError::CombinationNotFound(*combination_id));
            }
        }

        for rule in &self.additional_not_allowed_combinations {
            product_type.check_combination(rule.pairs())?;
        }

        Ok(())
    }

    /// Projects `product_type` through this override.
    pub fn apply(&self, product_type: &ProductType) -> EffectiveProduct {
        let attributes = product_type
            .attributes()
            .iter()
            .filter(|a| !self.deactivated_attributes.contains(&a.id))
            .map(|a| EffectiveAttribute {
                id: a.id,
                name: a.name.clone(),
                options: a
                    .options
                    .iter()
                    .filter(|o| !self.deactivated_options.contains(&OptionRef::new(a.id, o.id)))
                    .map(|o| EffectiveOption {
                        id: o.id,
                        name: o.name.clone(),
                        out_of_stock: self
                            .out_of_stock_options
                            .contains(&OptionRef::new(a.id, o.id)),
                    })
                    .collect(),
            })
            .collect();

        let deactivated_attributes = product_type
            .attributes()
            .iter()
            .map(|a| a.id)
            .filter(|id| self.deactivated_attributes.contains(id))
            .collect();

        let live = |rule: &&NotAllowedCombination| {
            !rule
                .pairs()
                .iter()
                .any(|p| self.deactivated_attributes.contains(&p.attribute_id))
        };

        let type_rules = product_type
            .rules()
            .iter()
            .filter(|r| !self.deactivated_combinations.contains(&r.id))
            .filter(live)
            .map(|r| EffectiveRule {
                id: RuleId::ProductType(r.id),
                pairs: r.pairs().to_vec(),
            });

        let product_rules = self
            .additional_not_allowed_combinations
            .iter()
            .filter(live)
            .map(|r| EffectiveRule {
                id: RuleId::Product(r.id),
                pairs: r.pairs().to_vec(),
            });

        EffectiveProduct {
            catalog: EffectiveCatalog {
                product_type_id: product_type.id.clone(),
                attributes,
                deactivated_attributes,
            },
            constraints: EffectiveConstraints {
                rules: type_rules.chain(product_rules).collect(),
            },
        }
    }
}

// =============================================================================
// Effective Catalog
// =============================================================================

/// An option as the storefront may offer it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveOption {
    pub id: OptionId,
    pub name: String,
    pub out_of_stock: bool,
}

/// A live attribute with its live options, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveAttribute {
    pub id: AttributeId,
    pub name: String,
    pub options: Vec<EffectiveOption>,
}

impl EffectiveAttribute {
    pub fn option(&self, option_id: OptionId) -> Option<&EffectiveOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// The product type's catalog after a product's override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveCatalog {
    product_type_id: String,
    attributes: Vec<EffectiveAttribute>,
    /// Existing attributes hidden by the override.
    deactivated_attributes: BTreeSet<AttributeId>,
}

impl EffectiveCatalog {
    pub fn product_type_id(&self) -> &str {
        &self.product_type_id
    }

    /// Live attributes in catalog order.
    #[inline]
    pub fn attributes(&self) -> &[EffectiveAttribute] {
        &self.attributes
    }

    /// Live attribute lookup without error classification.
    pub fn get(&self, attribute_id: AttributeId) -> Option<&EffectiveAttribute> {
        self.attributes.iter().find(|a| a.id == attribute_id)
    }

    /// Live attribute lookup.
    ///
    /// ## Errors
    /// - `InvalidAttribute` if the product deactivated it
    /// - `AttributeNotFound` if the product type has no such attribute
    pub fn attribute(&self, attribute_id: AttributeId) -> CoreResult<&EffectiveAttribute> {
        if self.is_deactivated(attribute_id) {
            return Err(CoreError::InvalidAttribute(attribute_id));
        }
        self.get(attribute_id)
            .ok_or(CoreError::AttributeNotFound(attribute_id))
    }

    #[inline]
    pub fn is_deactivated(&self, attribute_id: AttributeId) -> bool {
        self.deactivated_attributes.contains(&attribute_id)
    }

    /// Live option lookup.
    pub fn option(&self, pair: OptionRef) -> Option<&EffectiveOption> {
        self.get(pair.attribute_id)?.option(pair.option_id)
    }

    /// Rebuilds a selection from a flat list of option ids.
    ///
    /// The storefront sends the other dropdowns' choices as bare option ids;
    /// each is mapped back to the live attribute that offers it. Ids owned
    /// by `requested` are dropped, since a selection never constrains its
    /// own attribute.
    ///
    /// ## Errors
    /// `UnknownSelection` when an id matches no live option, matches options
    /// on several attributes, or gives one attribute two different options.
    pub fn selection_from_option_ids(
        &self,
        option_ids: &[OptionId],
        requested: Option<AttributeId>,
    ) -> CoreResult<Selection> {
        let mut selection = Selection::new();

        for &option_id in option_ids {
            let mut owners = self
                .attributes
                .iter()
                .filter(|a| a.option(option_id).is_some());

            let owner = owners.next().ok_or_else(|| {
                CoreError::unknown_selection(format!(
                    "option {option_id} is not available for this product"
                ))
            })?;

            if owners.next().is_some() {
                return Err(CoreError::unknown_selection(format!(
                    "option {option_id} belongs to more than one attribute"
                )));
            }

            if Some(owner.id) == requested {
                continue;
            }

            if let Some(previous) = selection.select(owner.id, option_id) {
                if previous != option_id {
                    return Err(CoreError::unknown_selection(format!(
                        "attribute {} has two options selected ({previous}, {option_id})",
                        owner.id
                    )));
                }
            }
        }

        Ok(selection)
    }
}

// =============================================================================
// Effective Constraints
// =============================================================================

/// An enforced rule with the layer it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveRule {
    pub id: RuleId,
    pub pairs: Vec<OptionRef>,
}

/// Rules enforced for one product: type rules first, then product rules,
/// each in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveConstraints {
    rules: Vec<EffectiveRule>,
}

impl EffectiveConstraints {
    #[inline]
    pub fn rules(&self) -> &[EffectiveRule] {
        &self.rules
    }

    /// First rule whose pairs are all matched by `chosen`.
    pub fn violated_by<F>(&self, chosen: F) -> Option<RuleId>
    where
        F: Fn(AttributeId) -> Option<OptionId>,
    {
        self.rules
            .iter()
            .find(|rule| is_subset(&rule.pairs, &chosen))
            .map(|rule| rule.id)
    }
}

/// Effective catalog and constraints of one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveProduct {
    pub catalog: EffectiveCatalog,
    pub constraints: EffectiveConstraints,
}

// =============================================================================
// Unit Tests
// =============================================================================
