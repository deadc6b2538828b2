//! Manager for secondary property indexes and uniqueness constraints
//!
//! The store feeds every change through [`IndexManager::apply`], so indexes
//! declared after data exists are back-filled by the store before they are
//! registered here.

use super::property_index::PropertyIndex;
use crate::graph::{EdgeId, EdgeType, IndexEvent, Label, NodeId, PropertyMap, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Key for a node property index or uniqueness constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyIndexKey {
    pub label: Label,
    pub property: String,
}

impl PropertyIndexKey {
    pub fn new(label: impl Into<Label>, property: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            property: property.into(),
        }
    }
}

/// Key for a relationship property index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationshipIndexKey {
    pub edge_type: EdgeType,
    pub property: String,
}

impl RelationshipIndexKey {
    pub fn new(edge_type: impl Into<EdgeType>, property: impl Into<String>) -> Self {
        Self {
            edge_type: edge_type.into(),
            property: property.into(),
        }
    }
}

/// The kinds of schema object a store may or may not support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    UniqueConstraint,
    NodePropertyIndex,
    RelationshipPropertyIndex,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexKind::UniqueConstraint => "uniqueness constraint",
            IndexKind::NodePropertyIndex => "node property index",
            IndexKind::RelationshipPropertyIndex => "relationship property index",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
pub struct IndexManager {
    node_indices: HashMap<PropertyIndexKey, PropertyIndex<NodeId>>,
    edge_indices: HashMap<RelationshipIndexKey, PropertyIndex<EdgeId>>,
    unique: HashMap<PropertyIndexKey, HashMap<PropertyValue, NodeId>>,
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a populated node index. Returns false if it already existed.
    pub fn add_node_index(&mut self, key: PropertyIndexKey, index: PropertyIndex<NodeId>) -> bool {
        if self.node_indices.contains_key(&key) {
            return false;
        }
        self.node_indices.insert(key, index);
        true
    }

    /// Register a populated relationship index. Returns false if it already existed.
    pub fn add_edge_index(
        &mut self,
        key: RelationshipIndexKey,
        index: PropertyIndex<EdgeId>,
    ) -> bool {
        if self.edge_indices.contains_key(&key) {
            return false;
        }
        self.edge_indices.insert(key, index);
        true
    }

    /// Register a populated uniqueness constraint. Returns false if it already existed.
    pub fn add_unique_constraint(
        &mut self,
        key: PropertyIndexKey,
        entries: HashMap<PropertyValue, NodeId>,
    ) -> bool {
        if self.unique.contains_key(&key) {
            return false;
        }
        self.unique.insert(key, entries);
        true
    }

    pub fn has_node_index(&self, key: &PropertyIndexKey) -> bool {
        self.node_indices.contains_key(key)
    }

    pub fn has_edge_index(&self, key: &RelationshipIndexKey) -> bool {
        self.edge_indices.contains_key(key)
    }

    pub fn has_unique_constraint(&self, key: &PropertyIndexKey) -> bool {
        self.unique.contains_key(key)
    }

    /// Node owning `value` under a uniqueness constraint
    pub fn lookup_unique(&self, key: &PropertyIndexKey, value: &PropertyValue) -> Option<NodeId> {
        self.unique.get(key).and_then(|entries| entries.get(value)).copied()
    }

    /// Nodes holding `value`; `None` when no index covers the key
    pub fn lookup(&self, key: &PropertyIndexKey, value: &PropertyValue) -> Option<Vec<NodeId>> {
        self.node_indices.get(key).map(|index| index.get(value))
    }

    /// Edges whose indexed property lies in `range`; `None` when no index covers the key
    pub fn edge_range<R>(&self, key: &RelationshipIndexKey, range: R) -> Option<Vec<EdgeId>>
    where
        R: std::ops::RangeBounds<PropertyValue>,
    {
        self.edge_indices.get(key).map(|index| index.range(range))
    }

    /// First node other than `except` that already owns a uniquely
    /// constrained value present in `properties` under any of `labels`
    pub fn unique_conflict<'a>(
        &self,
        labels: impl IntoIterator<Item = &'a Label>,
        properties: &PropertyMap,
        except: Option<NodeId>,
    ) -> Option<(PropertyIndexKey, PropertyValue, NodeId)> {
        for label in labels {
            for (key, entries) in self.unique.iter().filter(|(k, _)| &k.label == label) {
                let Some(value) = properties.get(&key.property) else {
                    continue;
                };
                if let Some(&owner) = entries.get(value) {
                    if Some(owner) != except {
                        return Some((key.clone(), value.clone(), owner));
                    }
                }
            }
        }
        None
    }

    pub fn unique_constraints(&self) -> Vec<PropertyIndexKey> {
        let mut keys: Vec<_> = self.unique.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn node_indices(&self) -> Vec<PropertyIndexKey> {
        let mut keys: Vec<_> = self.node_indices.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn edge_indices(&self) -> Vec<RelationshipIndexKey> {
        let mut keys: Vec<_> = self.edge_indices.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Drop every index and constraint
    pub fn clear(&mut self) {
        self.node_indices.clear();
        self.edge_indices.clear();
        self.unique.clear();
    }

    /// Keep indexes in step with a graph change
    pub fn apply(&mut self, event: &IndexEvent) {
        use IndexEvent::*;
        match event {
            NodeCreated { id, labels, properties } => {
                for label in labels {
                    self.insert_node_entries(label, properties, *id);
                }
            }
            NodeDeleted { id, labels, properties } => {
                for label in labels {
                    self.remove_node_entries(label, properties, *id);
                }
            }
            NodePropertySet { id, labels, key, old_value, new_value } => {
                for label in labels {
                    let index_key = PropertyIndexKey::new(label.clone(), key.clone());
                    if let Some(old) = old_value {
                        self.remove_node_value(&index_key, old, *id);
                    }
                    self.insert_node_value(&index_key, new_value, *id);
                }
            }
            LabelAdded { id, label, properties } => {
                self.insert_node_entries(label, properties, *id);
            }
            LabelRemoved { id, label, properties } => {
                self.remove_node_entries(label, properties, *id);
            }
            EdgeCreated { id, edge_type, properties } => {
                for (key, value) in properties {
                    let index_key = RelationshipIndexKey::new(edge_type.clone(), key.clone());
                    if let Some(index) = self.edge_indices.get_mut(&index_key) {
                        index.insert(value.clone(), *id);
                    }
                }
            }
            EdgeDeleted { id, edge_type, properties } => {
                for (key, value) in properties {
                    let index_key = RelationshipIndexKey::new(edge_type.clone(), key.clone());
                    if let Some(index) = self.edge_indices.get_mut(&index_key) {
                        index.remove(value, *id);
                    }
                }
            }
            EdgePropertySet { id, edge_type, key, old_value, new_value } => {
                let index_key = RelationshipIndexKey::new(edge_type.clone(), key.clone());
                if let Some(index) = self.edge_indices.get_mut(&index_key) {
                    if let Some(old) = old_value {
                        index.remove(old, *id);
                    }
                    index.insert(new_value.clone(), *id);
                }
            }
        }
    }

    fn insert_node_entries(&mut self, label: &Label, properties: &PropertyMap, id: NodeId) {
        for (key, value) in properties {
            let index_key = PropertyIndexKey::new(label.clone(), key.clone());
            self.insert_node_value(&index_key, value, id);
        }
    }

    fn remove_node_entries(&mut self, label: &Label, properties: &PropertyMap, id: NodeId) {
        for (key, value) in properties {
            let index_key = PropertyIndexKey::new(label.clone(), key.clone());
            self.remove_node_value(&index_key, value, id);
        }
    }

    fn insert_node_value(&mut self, key: &PropertyIndexKey, value: &PropertyValue, id: NodeId) {
        if let Some(index) = self.node_indices.get_mut(key) {
            index.insert(value.clone(), id);
        }
        if let Some(entries) = self.unique.get_mut(key) {
            entries.insert(value.clone(), id);
        }
    }

    fn remove_node_value(&mut self, key: &PropertyIndexKey, value: &PropertyValue, id: NodeId) {
        if let Some(index) = self.node_indices.get_mut(key) {
            index.remove(value, id);
        }
        if let Some(entries) = self.unique.get_mut(key) {
            if entries.get(value) == Some(&id) {
                entries.remove(value);
            }
        }
    }
}
