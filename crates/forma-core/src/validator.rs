//! # Configuration Validator
//!
//! Final check of a complete selection before it becomes a configured line.
//!
//! ## Check Order
//! ```text
//! selection
//!    │
//!    ├── any entry on a deactivated / unknown attribute or option? ──► UnknownSelection
//!    │
//!    ├── any effective attribute without a choice? ──────────────────► Incomplete (all missing)
//!    │
//!    ├── first rule ⊆ selection (type rules, then product rules) ────► ForbiddenCombination
//!    │
//!    └── Ok
//! ```
//!
//! Out-of-stock options pass. Callers that care use [`out_of_stock`] to
//! report them alongside the accepted line.

use crate::error::{CoreError, CoreResult};
use crate::overrides::{EffectiveCatalog, EffectiveConstraints};
use crate::selection::Selection;
use crate::types::{AttributeId, OptionRef};

/// Accepts or rejects a selection for one product.
///
/// ## Example
/// ```rust
/// use forma_core::catalog::{Attribute, AttributeOption, ProductType};
/// use forma_core::constraint::NotAllowedCombination;
/// use forma_core::overrides::ProductOverride;
/// use forma_core::validator::validate;
/// use forma_core::{CoreError, Customisation, OptionRef, RuleId, Selection};
///
/// let option = |id, name: &str| AttributeOption { id, name: name.to_string() };
/// let mut shirt = ProductType::new("pt", "Shirt", Customisation::FullyCustomizable);
/// shirt.add_attribute(Attribute { id: 1, name: "Color".into(), options: vec![option(10, "Red"), option(11, "Blue")] }).unwrap();
/// shirt.add_attribute(Attribute { id: 2, name: "Size".into(), options: vec![option(20, "S"), option(21, "M")] }).unwrap();
/// shirt.add_rule(NotAllowedCombination::new(5, vec![OptionRef::new(1, 10), OptionRef::new(2, 20)]).unwrap()).unwrap();
///
/// let effective = ProductOverride::default().apply(&shirt);
/// let red_s: Selection = [(1, 10), (2, 20)].into_iter().collect();
/// let red_m: Selection = [(1, 10), (2, 21)].into_iter().collect();
///
/// assert_eq!(
///     validate(&effective.catalog, &effective.constraints, &red_s),
///     Err(CoreError::ForbiddenCombination(RuleId::ProductType(5)))
/// );
/// assert!(validate(&effective.catalog, &effective.constraints, &red_m).is_ok());
/// ```
pub fn validate(
    catalog: &EffectiveCatalog,
    constraints: &EffectiveConstraints,
    selection: &Selection,
) -> CoreResult<()> {
    for pair in selection.pairs() {
        check_known(catalog, pair)?;
    }

    let missing: Vec<AttributeId> = catalog
        .attributes()
        .iter()
        .map(|a| a.id)
        .filter(|id| !selection.has_attribute(*id))
        .collect();
    if !missing.is_empty() {
        return Err(CoreError::Incomplete { missing });
    }

    match constraints.violated_by(|attribute_id| selection.get(attribute_id)) {
        Some(rule) => Err(CoreError::ForbiddenCombination(rule)),
        None => Ok(()),
    }
}

fn check_known(catalog: &EffectiveCatalog, pair: OptionRef) -> CoreResult<()> {
    if catalog.is_deactivated(pair.attribute_id) {
        return Err(CoreError::unknown_selection(format!(
            "attribute {} is deactivated for this product",
            pair.attribute_id
        )));
    }

    let attribute = catalog.get(pair.attribute_id).ok_or_else(|| {
        CoreError::unknown_selection(format!("attribute {} does not exist", pair.attribute_id))
    })?;

    if attribute.option(pair.option_id).is_none() {
        return Err(CoreError::unknown_selection(format!(
            "option {} is not available for attribute {}",
            pair.option_id, pair.attribute_id
        )));
    }

    Ok(())
}

/// Chosen pairs that are flagged out of stock, in attribute order.
pub fn out_of_stock(catalog: &EffectiveCatalog, selection: &Selection) -> Vec<OptionRef> {
    selection
        .pairs()
        .filter(|pair| catalog.option(*pair).is_some_and(|o| o.out_of_stock))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
