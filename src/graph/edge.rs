//! Directed, typed edge of the property graph

use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, EdgeType, NodeId};
use serde::{Deserialize, Serialize};

/// A directed edge. Several edges of different (or equal) types may join the
/// same pair of nodes; the loaders decide when an edge is "the same" one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,

    /// Edge goes FROM this node
    pub source: NodeId,

    /// Edge goes TO this node
    pub target: NodeId,

    pub edge_type: EdgeType,

    pub properties: PropertyMap,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

impl Edge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId, edge_type: impl Into<EdgeType>) -> Self {
        Self::new_with_properties(id, source, target, edge_type, PropertyMap::new())
    }

    pub fn new_with_properties(
        id: EdgeId,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
        properties: PropertyMap,
    ) -> Self {
        Edge {
            id,
            source,
            target,
            edge_type: edge_type.into(),
            properties,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.properties.insert(key.into(), value.into())
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn remove_property(&mut self, key: &str) -> Option<PropertyValue> {
        self.properties.remove(key)
    }

    /// The `strength` weight, if present and numeric
    pub fn strength(&self) -> Option<f64> {
        self.get_property("strength").and_then(|v| v.as_float())
    }

    pub fn is_type(&self, edge_type: &str) -> bool {
        self.edge_type.as_str() == edge_type
    }

    /// The endpoint opposite `node`, if `node` is one of the endpoints
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }

    /// Check if this edge connects two nodes (in either direction)
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_and_type() {
        let mut edge = Edge::new(EdgeId::new(1), NodeId::new(1), NodeId::new(2), "LEADS_TO");
        assert_eq!(edge.strength(), None);
        edge.set_property("strength", 0.9);
        assert_eq!(edge.strength(), Some(0.9));
        assert!(edge.is_type("LEADS_TO"));
        assert!(!edge.is_type("COMMONLY_OCCURS_WITH"));
    }

    #[test]
    fn test_endpoints() {
        let edge = Edge::new(EdgeId::new(2), NodeId::new(10), NodeId::new(20), "COMMONLY_OCCURS_WITH");
        assert_eq!(edge.other_end(NodeId::new(10)), Some(NodeId::new(20)));
        assert_eq!(edge.other_end(NodeId::new(20)), Some(NodeId::new(10)));
        assert_eq!(edge.other_end(NodeId::new(30)), None);
        assert!(edge.connects(NodeId::new(20), NodeId::new(10)));
    }
}
