//! # Catalog Model
//!
//! A product type with its ordered attributes, each with ordered options,
//! and the not-allowed combinations defined on it.
//!
//! ## Ownership
//! ```text
//! ProductType ──owns──► Attribute ──owns──► AttributeOption
//!      │
//!      └──────owns──► NotAllowedCombination ──refers to──► (Attribute, Option)
//! ```
//!
//! The model is treated as an immutable snapshot once loaded. The only
//! mutations are the admin append operations (`add_attribute`, `add_rule`),
//! which enforce the write-time invariants.

use serde::{Deserialize, Serialize};

use crate::constraint::{check_pairs, NotAllowedCombination};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{AttributeId, CombinationId, Customisation, OptionId, OptionRef};
use crate::validation::{validate_attribute_name, validate_option_name};

/// One selectable value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeOption {
    pub id: OptionId,
    pub name: String,
}

/// A dimension a product type varies along, e.g. "Frame finish".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub name: String,
    /// In definition order.
    pub options: Vec<AttributeOption>,
}

impl Attribute {
    /// Looks up an option of this attribute.
    pub fn option(&self, option_id: OptionId) -> CoreResult<&AttributeOption> {
        self.options
            .iter()
            .find(|o| o.id == option_id)
            .ok_or(CoreError::OptionNotFound {
                attribute_id: self.id,
                option_id,
            })
    }
}

// =============================================================================
// New Attribute (admin input)
// =============================================================================

/// An attribute as entered by an admin, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttribute {
    pub attribute_name: String,
    pub possible_options: Vec<String>,
}

impl NewAttribute {
    /// Validates names, requires at least one option, and rejects two
    /// options with the same (trimmed, case-insensitive) name.
    pub fn validate(&self) -> CoreResult<()> {
        validate_attribute_name(&self.attribute_name)?;

        if self.possible_options.is_empty() {
            return Err(ValidationError::Required {
                field: format!("options of '{}'", self.attribute_name.trim()),
            }
            .into());
        }

        for (index, option) in self.possible_options.iter().enumerate() {
            validate_option_name(option)?;
            let key = option.trim().to_lowercase();
            if self.possible_options[..index]
                .iter()
                .any(|earlier| earlier.trim().to_lowercase() == key)
            {
                return Err(ValidationError::Duplicate {
                    field: "option".to_string(),
                    value: option.trim().to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

// =============================================================================
// Product Type
// =============================================================================

/// A template defining which attributes and options a family of products
/// can vary along.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductType {
    pub id: String,
    pub name: String,
    pub customisation: Customisation,
    /// In definition order.
    pub attributes: Vec<Attribute>,
    /// In definition order. Never deduplicated.
    pub not_allowed_combinations: Vec<NotAllowedCombination>,
}

impl ProductType {
    /// Creates a product type with no attributes yet.
    pub fn new(id: impl Into<String>, name: impl Into<String>, customisation: Customisation) -> Self {
        ProductType {
            id: id.into(),
            name: name.into(),
            customisation,
            attributes: Vec::new(),
            not_allowed_combinations: Vec::new(),
        }
    }

    #[inline]
    pub fn is_customizable(&self) -> bool {
        self.customisation == Customisation::FullyCustomizable
    }

    /// Attributes in definition order.
    #[inline]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Looks up an attribute of this product type.
    pub fn attribute(&self, attribute_id: AttributeId) -> CoreResult<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.id == attribute_id)
            .ok_or(CoreError::AttributeNotFound(attribute_id))
    }

    /// Options of an attribute in definition order.
    pub fn options(&self, attribute_id: AttributeId) -> CoreResult<&[AttributeOption]> {
        Ok(&self.attribute(attribute_id)?.options)
    }

    /// Looks up one option, distinguishing an unknown attribute from an
    /// unknown option.
    pub fn option(&self, attribute_id: AttributeId, option_id: OptionId) -> CoreResult<&AttributeOption> {
        self.attribute(attribute_id)?.option(option_id)
    }

    /// Rules defined on this product type.
    #[inline]
    pub fn rules(&self) -> &[NotAllowedCombination] {
        &self.not_allowed_combinations
    }

    pub fn rule(&self, combination_id: CombinationId) -> Option<&NotAllowedCombination> {
        self.not_allowed_combinations
            .iter()
            .find(|r| r.id == combination_id)
    }

    /// Rejects attribute input for a `not_customizable` type and validates
    /// each new attribute.
    pub fn check_new_attributes(&self, attributes: &[NewAttribute]) -> CoreResult<()> {
        if !self.is_customizable() {
            return Err(CoreError::NotCustomizable(self.id.clone()));
        }
        attributes.iter().try_for_each(NewAttribute::validate)
    }

    /// Appends an attribute with already assigned ids.
    ///
    /// ## Rules
    /// - The product type must be customizable
    /// - The attribute id must be new to this product type
    /// - Name and option names follow [`NewAttribute::validate`]
    pub fn add_attribute(&mut self, attribute: Attribute) -> CoreResult<()> {
        let input = NewAttribute {
            attribute_name: attribute.name.clone(),
            possible_options: attribute.options.iter().map(|o| o.name.clone()).collect(),
        };
        self.check_new_attributes(std::slice::from_ref(&input))?;

        if self.attributes.iter().any(|a| a.id == attribute.id) {
            return Err(ValidationError::Duplicate {
                field: "attribute id".to_string(),
                value: attribute.id.to_string(),
            }
            .into());
        }

        self.attributes.push(attribute);
        Ok(())
    }

    /// Validates a candidate combination against this catalog.
    ///
    /// ## Rules
    /// - Shape: at least two pairs, no attribute twice (`InvalidRule`)
    /// - Every attribute belongs to this type (`AttributeNotFound`)
    /// - Every option belongs to its attribute (`OptionNotFound`)
    pub fn check_combination(&self, pairs: &[OptionRef]) -> CoreResult<()> {
        check_pairs(pairs)?;
        for pair in pairs {
            self.option(pair.attribute_id, pair.option_id)?;
        }
        Ok(())
    }

    /// Appends a rule after [`check_combination`](Self::check_combination).
    ///
    /// Identical rules are accepted; no deduplication is performed.
    pub fn add_rule(&mut self, rule: NotAllowedCombination) -> CoreResult<()> {
        self.check_combination(rule.pairs())?;
        self.not_allowed_combinations.push(rule);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;

    fn attribute(id: AttributeId, name: &str, options: &[(OptionId, &str)]) -> Attribute {
        Attribute {
            id,
            name: name.to_string(),
            options: options
                .iter()
                .map(|(id, name)| AttributeOption {
                    id: *id,
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    fn bicycle() -> ProductType {
        let mut pt = ProductType::new("pt-1", "Bicycle", Customisation::FullyCustomizable);
        pt.add_attribute(attribute(1, "Frame", &[(10, "Red"), (11, "Blue")]))
            .unwrap();
        pt.add_attribute(attribute(2, "Tires", &[(20, "Road"), (21, "Offroad")]))
            .unwrap();
        pt
    }

    #[test]
    fn test_lookups_keep_definition_order() {
        let pt = bicycle();
        let names: Vec<_> = pt.attributes().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Frame", "Tires"]);

        let options: Vec<_> = pt.options(2).unwrap().iter().map(|o| o.id).collect();
        assert_eq!(options, vec![20, 21]);
    }

    #[test]
    fn test_not_found_distinguishes_attribute_and_option() {
        let pt = bicycle();
        assert_eq!(pt.option(9, 10).unwrap_err(), CoreError::AttributeNotFound(9));
        assert_eq!(
            pt.option(1, 20).unwrap_err(),
            CoreError::OptionNotFound {
                attribute_id: 1,
                option_id: 20
            }
        );
    }

    #[test]
    fn test_not_customizable_rejects_attributes() {
        let mut pt = ProductType::new("pt-2", "Gift card", Customisation::NotCustomizable);
        let err = pt
            .add_attribute(attribute(1, "Amount", &[(1, "10")]))
            .unwrap_err();
        assert_eq!(err, CoreError::NotCustomizable("pt-2".to_string()));
    }

    #[test]
    fn test_new_attribute_validation() {
        let empty = NewAttribute {
            attribute_name: "Color".to_string(),
            possible_options: vec![],
        };
        assert!(matches!(empty.validate(), Err(CoreError::Validation(_))));

        let duplicate = NewAttribute {
            attribute_name: "Color".to_string(),
            possible_options: vec!["Red".to_string(), " red ".to_string()],
        };
        assert!(matches!(
            duplicate.validate(),
            Err(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));

        let ok = NewAttribute {
            attribute_name: "Color".to_string(),
            possible_options: vec!["Red".to_string(), "Blue".to_string()],
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_check_combination() {
        let pt = bicycle();
        assert!(pt
            .check_combination(&[OptionRef::new(1, 10), OptionRef::new(2, 21)])
            .is_ok());
        assert_eq!(
            pt.check_combination(&[OptionRef::new(1, 10)]).unwrap_err(),
            CoreError::InvalidRule(RuleError::TooFewPairs { found: 1, min: 2 })
        );
        assert_eq!(
            pt.check_combination(&[OptionRef::new(1, 10), OptionRef::new(3, 30)])
                .unwrap_err(),
            CoreError::AttributeNotFound(3)
        );
    }

    #[test]
    fn test_duplicate_rules_are_kept() {
        let mut pt = bicycle();
        let pairs = vec![OptionRef::new(1, 10), OptionRef::new(2, 21)];
        pt.add_rule(NotAllowedCombination::new(1, pairs.clone()).unwrap())
            .unwrap();
        pt.add_rule(NotAllowedCombination::new(2, pairs).unwrap())
            .unwrap();
        assert_eq!(pt.rules().len(), 2);
        assert!(pt.rule(2).is_some());
    }
}
