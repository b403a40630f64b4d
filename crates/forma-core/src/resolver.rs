//! # Availability Resolver
//!
//! Answers "which options of attribute A can the shopper still pick, given
//! what they picked elsewhere".
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  others = selection minus A                                             │
//! │                                                                         │
//! │  for o in effective options of A (catalog order):                       │
//! │      if purchasable mode and o.out_of_stock  → skip                     │
//! │      hypothetical = others ∪ {A: o}                                     │
//! │      if some rule ⊆ hypothetical            → exclude                   │
//! │      else                                   → keep                      │
//! │                                                                         │
//! │  survivors in catalog order (possibly empty)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rule only excludes once every attribute it names has a value, so a
//! partial selection never hides options prematurely. The other selections
//! are not validated here; if they already contain a whole rule, every
//! option of A is excluded.
//!
//! Everything in this module is a pure function over borrowed snapshots.

use serde::Serialize;

use crate::error::CoreResult;
use crate::overrides::{EffectiveCatalog, EffectiveConstraints, EffectiveOption};
use crate::selection::Selection;
use crate::types::{AttributeId, OptionId, OptionRef};

/// How out-of-stock options are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AvailabilityMode {
    /// Out-of-stock options are listed, flagged `out_of_stock`.
    #[default]
    Browse,
    /// Only purchasable options are listed.
    Purchasable,
}

/// The options of one attribute that survive the constraint check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableOptions {
    pub attribute_id: AttributeId,
    pub options: Vec<EffectiveOption>,
}

impl AvailableOptions {
    pub fn contains(&self, option_id: OptionId) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }
}

/// Options of `requested` compatible with the rest of `selection`, in
/// browse mode.
///
/// ## Errors
/// - `InvalidAttribute` if the product deactivated `requested`
/// - `AttributeNotFound` if the product type has no such attribute
///
/// ## Example
/// ```rust
/// use forma_core::catalog::{Attribute, AttributeOption, ProductType};
/// use forma_core::constraint::NotAllowedCombination;
/// use forma_core::overrides::ProductOverride;
/// use forma_core::resolver::available_options;
/// use forma_core::{Customisation, OptionRef, Selection};
///
/// let option = |id, name: &str| AttributeOption { id, name: name.to_string() };
/// let mut shirt = ProductType::new("pt", "Shirt", Customisation::FullyCustomizable);
/// shirt.add_attribute(Attribute { id: 1, name: "Color".into(), options: vec![option(10, "Red"), option(11, "Blue")] }).unwrap();
/// shirt.add_attribute(Attribute { id: 2, name: "Size".into(), options: vec![option(20, "S"), option(21, "M")] }).unwrap();
/// shirt.add_rule(NotAllowedCombination::new(1, vec![OptionRef::new(1, 10), OptionRef::new(2, 20)]).unwrap()).unwrap();
///
/// let effective = ProductOverride::default().apply(&shirt);
/// let red: Selection = [(1, 10)].into_iter().collect();
///
/// let sizes = available_options(&effective.catalog, &effective.constraints, &red, 2).unwrap();
/// let names: Vec<_> = sizes.options.iter().map(|o| o.name.as_str()).collect();
/// assert_eq!(names, vec!["M"]);
/// ```
pub fn available_options(
    catalog: &EffectiveCatalog,
    constraints: &EffectiveConstraints,
    selection: &Selection,
    requested: AttributeId,
) -> CoreResult<AvailableOptions> {
    available_options_with_mode(catalog, constraints, selection, requested, AvailabilityMode::Browse)
}

/// [`available_options`] with an explicit [`AvailabilityMode`].
pub fn available_options_with_mode(
    catalog: &EffectiveCatalog,
    constraints: &EffectiveConstraints,
    selection: &Selection,
    requested: AttributeId,
    mode: AvailabilityMode,
) -> CoreResult<AvailableOptions> {
    let attribute = catalog.attribute(requested)?;

    let options = attribute
        .options
        .iter()
        .filter(|o| mode == AvailabilityMode::Browse || !o.out_of_stock)
        .filter(|o| {
            let chosen = |attribute_id: AttributeId| {
                if attribute_id == requested {
                    Some(o.id)
                } else {
                    selection.get(attribute_id)
                }
            };
            constraints.violated_by(chosen).is_none()
        })
        .cloned()
        .collect();

    Ok(AvailableOptions {
        attribute_id: requested,
        options,
    })
}

/// Availability of every effective attribute, in catalog order.
///
/// Each attribute is resolved against the selection minus its own entry, so
/// the currently chosen option of an attribute is listed if it is still
/// compatible with the others.
pub fn resolve_all(
    catalog: &EffectiveCatalog,
    constraints: &EffectiveConstraints,
    selection: &Selection,
) -> Vec<AvailableOptions> {
    catalog
        .attributes()
        .iter()
        .filter_map(|a| available_options(catalog, constraints, selection, a.id).ok())
        .collect()
}

/// True if `pair` is offered for its attribute under `selection`.
pub fn is_option_available(
    catalog: &EffectiveCatalog,
    constraints: &EffectiveConstraints,
    selection: &Selection,
    pair: OptionRef,
    mode: AvailabilityMode,
) -> CoreResult<bool> {
    let available =
        available_options_with_mode(catalog, constraints, selection, pair.attribute_id, mode)?;
    Ok(available.contains(pair.option_id))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Attribute, AttributeOption, ProductType};
    use crate::constraint::NotAllowedCombination;
    use crate::error::CoreError;
    use crate::overrides::{EffectiveProduct, ProductOverride};
    use crate::types::Customisation;
    use crate::validator::validate;

    const COLOR: AttributeId = 1;
    const SIZE: AttributeId = 2;
    const RED: OptionId = 10;
    const BLUE: OptionId = 11;
    const S: OptionId = 20;
    const M: OptionId = 21;

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

    fn shirt() -> ProductType {
        let mut pt = ProductType::new("pt", "Shirt", Customisation::FullyCustomizable);
        pt.add_attribute(attribute(COLOR, "Color", &[(RED, "Red"), (BLUE, "Blue")]))
            .unwrap();
        pt.add_attribute(attribute(SIZE, "Size", &[(S, "S"), (M, "M")]))
            .unwrap();
        pt.add_rule(
            NotAllowedCombination::new(1, vec![OptionRef::new(COLOR, RED), OptionRef::new(SIZE, S)])
                .unwrap(),
        )
        .unwrap();
        pt
    }

    fn ids(available: &AvailableOptions) -> Vec<OptionId> {
        available.options.iter().map(|o| o.id).collect()
    }

    #[test]
    fn test_empty_selection_offers_everything() {
        let EffectiveProduct { catalog, constraints } = ProductOverride::default().apply(&shirt());
        let sizes = available_options(&catalog, &constraints, &Selection::new(), SIZE).unwrap();
        assert_eq!(ids(&sizes), vec![S, M]);
    }

    #[test]
    fn test_rule_excludes_once_complete() {
        let EffectiveProduct { catalog, constraints } = ProductOverride::default().apply(&shirt());
        let red: Selection = [(COLOR, RED)].into_iter().collect();
        let sizes = available_options(&catalog, &constraints, &red, SIZE).unwrap();
        assert_eq!(ids(&sizes), vec![M]);

        let blue: Selection = [(COLOR, BLUE)].into_iter().collect();
        let sizes = available_options(&catalog, &constraints, &blue, SIZE).unwrap();
        assert_eq!(ids(&sizes), vec![S, M]);
    }

    #[test]
    fn test_own_selection_is_ignored() {
        let EffectiveProduct { catalog, constraints } = ProductOverride::default().apply(&shirt());
        let selection: Selection = [(COLOR, RED), (SIZE, S)].into_iter().collect();
        let sizes = available_options(&catalog, &constraints, &selection, SIZE).unwrap();
        assert_eq!(ids(&sizes), vec![M]);
    }

    #[test]
    fn test_deactivated_and_unknown_attributes() {
        let over = ProductOverride {
            deactivated_attributes: [COLOR].into_iter().collect(),
            ..Default::default()
        };
        let EffectiveProduct { catalog, constraints } = over.apply(&shirt());
        let selection = Selection::new();

        assert_eq!(
            available_options(&catalog, &constraints, &selection, COLOR).unwrap_err(),
            CoreError::InvalidAttribute(COLOR)
        );
        assert_eq!(
            available_options(&catalog, &constraints, &selection, 99).unwrap_err(),
            CoreError::AttributeNotFound(99)
        );
    }

    #[test]
    fn test_out_of_stock_modes() {
        let over = ProductOverride {
            out_of_stock_options: [OptionRef::new(SIZE, M)].into_iter().collect(),
            ..Default::default()
        };
        let EffectiveProduct { catalog, constraints } = over.apply(&shirt());
        let red: Selection = [(COLOR, RED)].into_iter().collect();

        let browse = available_options(&catalog, &constraints, &red, SIZE).unwrap();
        assert_eq!(ids(&browse), vec![M]);
        assert!(browse.options[0].out_of_stock);

        let strict = available_options_with_mode(
            &catalog,
            &constraints,
            &red,
            SIZE,
            AvailabilityMode::Purchasable,
        )
        .unwrap();
        assert!(strict.options.is_empty());
    }

    #[test]
    fn test_resolve_all_and_idempotence() {
        let EffectiveProduct { catalog, constraints } = ProductOverride::default().apply(&shirt());
        let red: Selection = [(COLOR, RED)].into_iter().collect();

        let first = resolve_all(&catalog, &constraints, &red);
        let second = resolve_all(&catalog, &constraints, &red);
        assert_eq!(first, second);

        assert_eq!(first.len(), 2);
        assert_eq!(ids(&first[0]), vec![RED, BLUE]);
        assert_eq!(ids(&first[1]), vec![M]);

        assert!(is_option_available(
            &catalog,
            &constraints,
            &red,
            OptionRef::new(SIZE, M),
            AvailabilityMode::Browse
        )
        .unwrap());
    }

    /// Over every complete selection of a three-attribute catalog, an option
    /// is offered against the other choices exactly when the validator
    /// accepts the whole selection.
    #[test]
    fn test_offered_iff_validator_accepts() {
        let mut pt = shirt();
        pt.add_attribute(attribute(3, "Print", &[(30, "None"), (31, "Logo"), (32, "Stripe")]))
            .unwrap();
        pt.add_rule(
            NotAllowedCombination::new(
                2,
                vec![OptionRef::new(SIZE, M), OptionRef::new(3, 31), OptionRef::new(COLOR, BLUE)],
            )
            .unwrap(),
        )
        .unwrap();
        pt.add_rule(
            NotAllowedCombination::new(3, vec![OptionRef::new(COLOR, RED), OptionRef::new(3, 32)])
                .unwrap(),
        )
        .unwrap();
        let EffectiveProduct { catalog, constraints } = ProductOverride::default().apply(&pt);

        for color in [RED, BLUE] {
            for size in [S, M] {
                for print in [30, 31, 32] {
                    let full: Selection = [(COLOR, color), (SIZE, size), (3, print)]
                        .into_iter()
                        .collect();
                    let accepted = validate(&catalog, &constraints, &full).is_ok();

                    for attribute in [COLOR, SIZE, 3] {
                        let others = full.without(attribute);
                        let offered =
                            available_options(&catalog, &constraints, &others, attribute)
                                .unwrap();
                        let chosen = full.get(attribute).unwrap();
                        assert_eq!(
                            offered.contains(chosen),
                            accepted,
                            "selection {full:?}, attribute {attribute}"
                        );
                    }
                }
            }
        }
    }
}
