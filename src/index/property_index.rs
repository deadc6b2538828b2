//! B-Tree based property index

use crate::graph::PropertyValue;
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

/// Index for one property of one label (node index) or one relationship
/// type (edge index). `I` is the element id type.
#[derive(Debug, Clone)]
pub struct PropertyIndex<I> {
    index: BTreeMap<PropertyValue, HashSet<I>>,
}

impl<I: Copy + Eq + Hash + Ord> PropertyIndex<I> {
    pub fn new() -> Self {
        Self {
            index: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, value: PropertyValue, id: I) {
        self.index.entry(value).or_default().insert(id);
    }

    pub fn remove(&mut self, value: &PropertyValue, id: I) {
        if let Some(ids) = self.index.get_mut(value) {
            ids.remove(&id);
            if ids.is_empty() {
                self.index.remove(value);
            }
        }
    }

    /// Ids holding exactly `value`, sorted
    pub fn get(&self, value: &PropertyValue) -> Vec<I> {
        let mut ids: Vec<I> = self
            .index
            .get(value)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn range<R>(&self, range: R) -> Vec<I>
    where
        R: std::ops::RangeBounds<PropertyValue>,
    {
        let mut result = Vec::new();
        for (_, ids) in self.index.range(range) {
            result.extend(ids.iter().copied());
        }
        result.sort();
        result
    }

    /// Number of distinct indexed values
    pub fn cardinality(&self) -> usize {
        self.index.len()
    }
}

impl<I: Copy + Eq + Hash + Ord> Default for PropertyIndex<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeId, NodeId};
    use std::ops::Bound;

    #[test]
    fn test_property_index_ops() {
        let mut index = PropertyIndex::new();
        let val = PropertyValue::from("HIGH");

        index.insert(val.clone(), NodeId::new(1));
        index.insert(val.clone(), NodeId::new(2));
        assert_eq!(index.get(&val), vec![NodeId::new(1), NodeId::new(2)]);

        index.remove(&val, NodeId::new(1));
        assert_eq!(index.get(&val), vec![NodeId::new(2)]);

        index.remove(&val, NodeId::new(2));
        assert_eq!(index.cardinality(), 0);
    }

    #[test]
    fn test_strength_range_on_edges() {
        let mut index = PropertyIndex::new();
        for (i, s) in [0.4, 0.55, 0.6, 0.75, 0.9].iter().enumerate() {
            index.insert(PropertyValue::Float(*s), EdgeId::new(i as u64));
        }

        let strong = index.range((Bound::Included(PropertyValue::Float(0.6)), Bound::Unbounded));
        assert_eq!(strong, vec![EdgeId::new(2), EdgeId::new(3), EdgeId::new(4)]);
    }
}
