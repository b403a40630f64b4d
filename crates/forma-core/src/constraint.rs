//! # Constraint Set
//!
//! Not-allowed combinations: sets of `(attribute, option)` pairs that must
//! never all appear in one configuration.
//!
//! ## The Subset Test
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rule      { Frame=Red, Tires=Offroad }                                 │
//! │                                                                         │
//! │  selection { Frame=Red }                    → rule does not fire        │
//! │            (Tires not chosen yet, never excludes prematurely)           │
//! │                                                                         │
//! │  selection { Frame=Red, Tires=Road }        → rule does not fire        │
//! │                                                                         │
//! │  selection { Frame=Red, Tires=Offroad,                                  │
//! │              Bell=Yes }                     → rule FIRES                │
//! │            (every pair of the rule is present)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rules are neither deduplicated nor checked for subsumption. Two identical
//! rules are legal and both are enforced.

use serde::Serialize;

use crate::error::RuleError;
use crate::selection::Selection;
use crate::types::{AttributeId, CombinationId, OptionId, OptionRef};
use crate::MIN_COMBINATION_PAIRS;

/// Checks the shape invariants of a combination.
///
/// ## Rules
/// - At least [`MIN_COMBINATION_PAIRS`] pairs
/// - No attribute named twice
///
/// Existence of the referenced attributes and options is a catalog concern,
/// see [`ProductType::check_combination`](crate::catalog::ProductType::check_combination).
pub fn check_pairs(pairs: &[OptionRef]) -> Result<(), RuleError> {
    if pairs.len() < MIN_COMBINATION_PAIRS {
        return Err(RuleError::TooFewPairs {
            found: pairs.len(),
            min: MIN_COMBINATION_PAIRS,
        });
    }

    for (index, pair) in pairs.iter().enumerate() {
        if pairs[..index]
            .iter()
            .any(|earlier| earlier.attribute_id == pair.attribute_id)
        {
            return Err(RuleError::RepeatedAttribute(pair.attribute_id));
        }
    }

    Ok(())
}

/// True if every pair is matched by `chosen`.
///
/// `chosen` answers "which option is selected for this attribute", so the
/// same test serves real selections and the resolver's hypothetical ones.
#[inline]
pub fn is_subset<F>(pairs: &[OptionRef], chosen: F) -> bool
where
    F: Fn(AttributeId) -> Option<OptionId>,
{
    pairs
        .iter()
        .all(|pair| chosen(pair.attribute_id) == Some(pair.option_id))
}

// =============================================================================
// Not-Allowed Combination
// =============================================================================

/// A forbidden set of options across distinct attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotAllowedCombination {
    pub id: CombinationId,
    /// Sorted by attribute id. Private so the invariant holds.
    pairs: Vec<OptionRef>,
}

impl NotAllowedCombination {
    /// Creates a combination, enforcing [`check_pairs`].
    ///
    /// ## Example
    /// ```rust
    /// use forma_core::constraint::NotAllowedCombination;
    /// use forma_core::OptionRef;
    ///
    /// let rule = NotAllowedCombination::new(1, vec![
    ///     OptionRef::new(1, 10),
    ///     OptionRef::new(2, 20),
    /// ]);
    /// assert!(rule.is_ok());
    ///
    /// let lonely = NotAllowedCombination::new(2, vec![OptionRef::new(1, 10)]);
    /// assert!(lonely.is_err());
    /// ```
    pub fn new(id: CombinationId, mut pairs: Vec<OptionRef>) -> Result<Self, RuleError> {
        check_pairs(&pairs)?;
        pairs.sort();
        Ok(NotAllowedCombination { id, pairs })
    }

    /// The pairs, ordered by attribute id.
    #[inline]
    pub fn pairs(&self) -> &[OptionRef] {
        &self.pairs
    }

    /// True if every pair of this rule is part of `selection`.
    pub fn is_contained_in(&self, selection: &Selection) -> bool {
        is_subset(&self.pairs, |attribute_id| selection.get(attribute_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
