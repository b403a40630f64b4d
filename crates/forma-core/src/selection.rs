//! # Selection State
//!
//! A shopper's picks for one configuration session: at most one option per
//! attribute, no ordering significance.
//!
//! The selection is an explicit value passed into every resolver and
//! validator call. It is created empty, mutated one entry at a time, and
//! dropped when the session ends. It is never persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{AttributeId, OptionId, OptionRef};

/// Mapping `attribute → chosen option`.
///
/// Serializes as a JSON object keyed by attribute id:
/// `{"1": 4, "2": 7}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeMap<AttributeId, OptionId>);

impl Selection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Selection(BTreeMap::new())
    }

    /// Chooses `option_id` for `attribute_id`, returning the previous choice.
    pub fn select(&mut self, attribute_id: AttributeId, option_id: OptionId) -> Option<OptionId> {
        self.0.insert(attribute_id, option_id)
    }

    /// Removes the choice for `attribute_id`, returning it.
    pub fn clear(&mut self, attribute_id: AttributeId) -> Option<OptionId> {
        self.0.remove(&attribute_id)
    }

    /// Returns the chosen option for `attribute_id`.
    #[inline]
    pub fn get(&self, attribute_id: AttributeId) -> Option<OptionId> {
        self.0.get(&attribute_id).copied()
    }

    /// True if the selection contains exactly this pair.
    #[inline]
    pub fn contains(&self, pair: OptionRef) -> bool {
        self.get(pair.attribute_id) == Some(pair.option_id)
    }

    /// True if `attribute_id` has a choice.
    #[inline]
    pub fn has_attribute(&self, attribute_id: AttributeId) -> bool {
        self.0.contains_key(&attribute_id)
    }

    /// Returns a copy without the choice for `attribute_id`.
    pub fn without(&self, attribute_id: AttributeId) -> Self {
        let mut other = self.clone();
        other.clear(attribute_id);
        other
    }

    /// Iterates the chosen pairs in attribute id order.
    pub fn pairs(&self) -> impl Iterator<Item = OptionRef> + '_ {
        self.0
            .iter()
            .map(|(attribute_id, option_id)| OptionRef::new(*attribute_id, *option_id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(AttributeId, OptionId)> for Selection {
    /// Later entries for the same attribute replace earlier ones.
    fn from_iter<I: IntoIterator<Item = (AttributeId, OptionId)>>(iter: I) -> Self {
        Selection(iter.into_iter().collect())
    }
}

impl FromIterator<OptionRef> for Selection {
    fn from_iter<I: IntoIterator<Item = OptionRef>>(iter: I) -> Self {
        iter.into_iter()
            .map(|pair| (pair.attribute_id, pair.option_id))
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_replaces_previous_choice() {
        let mut selection = Selection::new();
        assert_eq!(selection.select(1, 10), None);
        assert_eq!(selection.select(1, 11), Some(10));
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.get(1), Some(11));
    }

    #[test]
    fn test_without_leaves_original_untouched() {
        let selection: Selection = [(1, 10), (2, 20)].into_iter().collect();
        let others = selection.without(1);

        assert!(!others.has_attribute(1));
        assert!(others.contains(OptionRef::new(2, 20)));
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_json_shape_is_attribute_keyed_object() {
        let selection: Selection = [(2, 20), (1, 10)].into_iter().collect();
        let json = serde_json::to_string(&selection).unwrap();
        assert_eq!(json, r#"{"1":10,"2":20}"#);

        let parsed: Selection = serde_json::from_str(r#"{"5":7}"#).unwrap();
        assert_eq!(parsed.get(5), Some(7));
    }
}
