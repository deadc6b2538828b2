//! Node of the property graph

use super::property::{PropertyMap, PropertyValue};
use super::types::{Label, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A node: an id, one or more labels and a property map.
///
/// Label and property changes made directly on a `Node` bypass the store's
/// indexes; loaders go through [`GraphStore`](super::GraphStore) instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,

    pub labels: HashSet<Label>,

    pub properties: PropertyMap,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl Node {
    pub fn new(id: NodeId, label: impl Into<Label>) -> Self {
        Self::new_with_properties(id, vec![label.into()], PropertyMap::new())
    }

    pub fn new_with_properties(id: NodeId, labels: Vec<Label>, properties: PropertyMap) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Node {
            id,
            labels: labels.into_iter().collect(),
            properties,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_label(&mut self, label: impl Into<Label>) -> bool {
        let added = self.labels.insert(label.into());
        if added {
            self.touch();
        }
        added
    }

    pub fn remove_label(&mut self, label: &Label) -> bool {
        let removed = self.labels.remove(label);
        if removed {
            self.touch();
        }
        removed
    }

    pub fn has_label(&self, label: &Label) -> bool {
        self.labels.contains(label)
    }

    /// Set a property, returning the previous value
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        let old = self.properties.insert(key.into(), value.into());
        self.touch();
        old
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn remove_property(&mut self, key: &str) -> Option<PropertyValue> {
        let removed = self.properties.remove(key);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// String property shortcut used throughout the analytics projection
    pub fn str_property(&self, key: &str) -> Option<&str> {
        self.get_property(key).and_then(|v| v.as_string())
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let mut node = Node::new(NodeId::new(1), "Disease");
        assert!(node.has_label(&Label::new("Disease")));

        assert!(node.add_label("HubDisease"));
        assert!(!node.add_label("HubDisease"));
        assert_eq!(node.label_count(), 2);

        assert!(node.remove_label(&Label::new("HubDisease")));
        assert_eq!(node.label_count(), 1);
    }

    #[test]
    fn test_properties() {
        let mut node = Node::new(NodeId::new(2), "Disease");
        assert!(node.set_property("name", "COPD").is_none());
        let old = node.set_property("name", "Chronic obstructive pulmonary disease");
        assert_eq!(old, Some(PropertyValue::from("COPD")));
        assert_eq!(
            node.str_property("name"),
            Some("Chronic obstructive pulmonary disease")
        );
        assert!(node.remove_property("name").is_some());
        assert!(!node.has_property("name"));
    }

    #[test]
    fn test_equality_by_id() {
        let a = Node::new(NodeId::new(7), "Disease");
        let b = Node::new(NodeId::new(7), "Patient");
        assert_eq!(a, b);
    }
}
