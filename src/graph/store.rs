//! In-memory graph storage
//!
//! Arena-backed nodes and edges with adjacency lists, a label index, an edge
//! type index and the secondary [`IndexManager`]. All writes go through
//! `&mut self`; callers that share a store put it behind a lock
//! (see [`GraphService`](crate::service::GraphService)).

use super::edge::Edge;
use super::event::IndexEvent;
use super::node::Node;
use super::property::{PropertyMap, PropertyValue};
use super::types::{Direction, EdgeId, EdgeType, Label, NodeId};
use crate::index::{IndexKind, IndexManager, PropertyIndex, PropertyIndexKey, RelationshipIndexKey};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::RangeBounds;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),

    #[error("Uniqueness constraint on {label}.{property} violated by value {value} (held by {owner})")]
    UniqueConstraintViolation {
        label: Label,
        property: String,
        value: String,
        owner: NodeId,
    },

    #[error("The store does not support {0}")]
    Unsupported(IndexKind),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Which schema object kinds this store can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCapabilities {
    pub unique_constraints: bool,
    pub node_property_indexes: bool,
    pub relationship_property_indexes: bool,
}

impl StoreCapabilities {
    pub fn supports(&self, kind: IndexKind) -> bool {
        match kind {
            IndexKind::UniqueConstraint => self.unique_constraints,
            IndexKind::NodePropertyIndex => self.node_property_indexes,
            IndexKind::RelationshipPropertyIndex => self.relationship_property_indexes,
        }
    }
}

impl Default for StoreCapabilities {
    fn default() -> Self {
        Self {
            unique_constraints: true,
            node_property_indexes: true,
            relationship_property_indexes: true,
        }
    }
}

/// Result of a match-or-create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MergeStatus {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome<I> {
    pub id: I,
    pub status: MergeStatus,
}

/// Element counts per label and relationship type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub label_counts: BTreeMap<String, usize>,
    pub edge_type_counts: BTreeMap<String, usize>,
}

impl GraphStatistics {
    pub fn label(&self, label: &str) -> usize {
        self.label_counts.get(label).copied().unwrap_or(0)
    }

    pub fn edge_type(&self, edge_type: &str) -> usize {
        self.edge_type_counts.get(edge_type).copied().unwrap_or(0)
    }
}

#[derive(Debug)]
pub struct GraphStore {
    /// Node arena, slot = NodeId
    nodes: Vec<Option<Node>>,

    /// Edge arena, slot = EdgeId
    edges: Vec<Option<Edge>>,

    outgoing: Vec<Vec<EdgeId>>,

    incoming: Vec<Vec<EdgeId>>,

    free_node_ids: Vec<u64>,

    free_edge_ids: Vec<u64>,

    label_index: HashMap<Label, HashSet<NodeId>>,

    edge_type_index: HashMap<EdgeType, HashSet<EdgeId>>,

    indexes: IndexManager,

    capabilities: StoreCapabilities,

    next_node_id: u64,

    next_edge_id: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::with_capabilities(StoreCapabilities::default())
    }

    pub fn with_capabilities(capabilities: StoreCapabilities) -> Self {
        GraphStore {
            nodes: Vec::with_capacity(256),
            edges: Vec::with_capacity(1024),
            outgoing: Vec::with_capacity(256),
            incoming: Vec::with_capacity(256),
            free_node_ids: Vec::new(),
            free_edge_ids: Vec::new(),
            label_index: HashMap::new(),
            edge_type_index: HashMap::new(),
            indexes: IndexManager::new(),
            capabilities,
            next_node_id: 1,
            next_edge_id: 1,
        }
    }

    pub fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    pub fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    // ============================================================
    // Nodes
    // ============================================================

    /// Create a node with a single label and no properties
    pub fn create_node(&mut self, label: impl Into<Label>) -> NodeId {
        let id = self.allocate_node_id();
        let label = label.into();
        self.install_node(Node::new(id, label));
        id
    }

    /// Create a node with labels and properties, enforcing uniqueness constraints
    pub fn create_node_with_properties(
        &mut self,
        labels: Vec<Label>,
        properties: PropertyMap,
    ) -> GraphResult<NodeId> {
        if let Some((key, value, owner)) = self.indexes.unique_conflict(labels.iter(), &properties, None) {
            return Err(unique_violation(key, value, owner));
        }
        let id = self.allocate_node_id();
        self.install_node(Node::new_with_properties(id, labels, properties));
        Ok(id)
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot()).and_then(|n| n.as_ref())
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.get_node(id).is_some()
    }

    /// Set a node property, keeping indexes and constraints consistent.
    /// Returns the previous value.
    pub fn set_node_property(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let key = key.into();
        let value = value.into();

        let node = self.get_node(id).ok_or(GraphError::NodeNotFound(id))?;
        let probe: PropertyMap = [(key.clone(), value.clone())].into_iter().collect();
        if let Some((k, v, owner)) = self.indexes.unique_conflict(node.labels.iter(), &probe, Some(id)) {
            return Err(unique_violation(k, v, owner));
        }

        let node = self.node_slot_mut(id)?;
        let old_value = node.set_property(key.clone(), value.clone());
        let labels = node.labels.iter().cloned().collect();

        self.indexes.apply(&IndexEvent::NodePropertySet {
            id,
            labels,
            key,
            old_value: old_value.clone(),
            new_value: value,
        });
        Ok(old_value)
    }

    /// Add a label to an existing node and index the node under it.
    /// Returns false when the node already carried the label.
    pub fn add_label_to_node(&mut self, id: NodeId, label: impl Into<Label>) -> GraphResult<bool> {
        let label = label.into();
        let node = self.get_node(id).ok_or(GraphError::NodeNotFound(id))?;
        if node.has_label(&label) {
            return Ok(false);
        }
        if let Some((k, v, owner)) = self.indexes.unique_conflict([&label], &node.properties, Some(id)) {
            return Err(unique_violation(k, v, owner));
        }

        let node = self.node_slot_mut(id)?;
        node.add_label(label.clone());
        let properties = node.properties.clone();

        self.label_index.entry(label.clone()).or_default().insert(id);
        self.indexes.apply(&IndexEvent::LabelAdded { id, label, properties });
        Ok(true)
    }

    /// Remove a label from a node. Returns false when the label was absent.
    pub fn remove_label_from_node(&mut self, id: NodeId, label: &Label) -> GraphResult<bool> {
        let node = self.node_slot_mut(id)?;
        if !node.remove_label(label) {
            return Ok(false);
        }
        let properties = node.properties.clone();

        if let Some(ids) = self.label_index.get_mut(label) {
            ids.remove(&id);
        }
        self.indexes.apply(&IndexEvent::LabelRemoved {
            id,
            label: label.clone(),
            properties,
        });
        Ok(true)
    }

    /// Delete a node together with all its incident edges
    pub fn delete_node(&mut self, id: NodeId) -> GraphResult<Node> {
        let idx = id.slot();
        let node = self
            .nodes
            .get_mut(idx)
            .and_then(|n| n.take())
            .ok_or(GraphError::NodeNotFound(id))?;

        let incident: Vec<EdgeId> = self.outgoing[idx]
            .iter()
            .chain(self.incoming[idx].iter())
            .copied()
            .collect();
        for edge_id in incident {
            // A self-loop appears in both lists; the second delete is a no-op.
            let _ = self.delete_edge(edge_id);
        }
        self.outgoing[idx].clear();
        self.incoming[idx].clear();

        for label in &node.labels {
            if let Some(ids) = self.label_index.get_mut(label) {
                ids.remove(&id);
            }
        }
        self.indexes.apply(&IndexEvent::NodeDeleted {
            id,
            labels: node.labels.iter().cloned().collect(),
            properties: node.properties.clone(),
        });

        self.free_node_ids.push(id.as_u64());
        debug!("Deleted node {}", id);
        Ok(node)
    }

    /// All nodes with a label, in id order
    pub fn get_nodes_by_label(&self, label: &Label) -> Vec<&Node> {
        let mut ids: Vec<NodeId> = self
            .label_index
            .get(label)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids.into_iter().filter_map(|id| self.get_node(id)).collect()
    }

    pub fn label_count(&self, label: &Label) -> usize {
        self.label_index.get(label).map(|ids| ids.len()).unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn all_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().flatten().collect()
    }

    pub fn all_edges(&self) -> Vec<&Edge> {
        self.edges.iter().flatten().collect()
    }

    /// Find the node holding `value` for `label.key`.
    ///
    /// Served from a uniqueness constraint when one covers the key, then from a
    /// secondary index, then by scanning the label.
    pub fn find_node(&self, label: &Label, key: &str, value: &PropertyValue) -> Option<NodeId> {
        let index_key = PropertyIndexKey::new(label.clone(), key);
        if self.indexes.has_unique_constraint(&index_key) {
            return self.indexes.lookup_unique(&index_key, value);
        }
        self.find_nodes_by_property(label, key, value).into_iter().next()
    }

    /// All nodes of `label` whose `key` equals `value`, in id order
    pub fn find_nodes_by_property(&self, label: &Label, key: &str, value: &PropertyValue) -> Vec<NodeId> {
        let index_key = PropertyIndexKey::new(label.clone(), key);
        if let Some(ids) = self.indexes.lookup(&index_key, value) {
            return ids;
        }
        self.get_nodes_by_label(label)
            .into_iter()
            .filter(|node| node.get_property(key) == Some(value))
            .map(|node| node.id)
            .collect()
    }

    /// Match-or-create a node keyed by `label.key = value`.
    ///
    /// On a match, only properties whose value differs are written.
    pub fn merge_node(
        &mut self,
        label: impl Into<Label>,
        key: &str,
        value: impl Into<PropertyValue>,
        mut properties: PropertyMap,
    ) -> GraphResult<MergeOutcome<NodeId>> {
        let label = label.into();
        let value = value.into();

        if let Some(id) = self.find_node(&label, key, &value) {
            let status = self.update_node_properties(id, properties)?;
            return Ok(MergeOutcome { id, status });
        }

        properties.insert(key.to_string(), value);
        let id = self.create_node_with_properties(vec![label], properties)?;
        Ok(MergeOutcome {
            id,
            status: MergeStatus::Created,
        })
    }

    fn update_node_properties(&mut self, id: NodeId, properties: PropertyMap) -> GraphResult<MergeStatus> {
        let node = self.get_node(id).ok_or(GraphError::NodeNotFound(id))?;
        let mut changed: Vec<(String, PropertyValue)> = properties
            .into_iter()
            .filter(|(k, v)| node.get_property(k) != Some(v))
            .collect();
        if changed.is_empty() {
            return Ok(MergeStatus::Unchanged);
        }
        changed.sort_by(|a, b| a.0.cmp(&b.0));
        for (k, v) in changed {
            self.set_node_property(id, k, v)?;
        }
        Ok(MergeStatus::Updated)
    }

    // ============================================================
    // Edges
    // ============================================================

    pub fn create_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
    ) -> GraphResult<EdgeId> {
        self.create_edge_with_properties(source, target, edge_type, PropertyMap::new())
    }

    pub fn create_edge_with_properties(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
        properties: PropertyMap,
    ) -> GraphResult<EdgeId> {
        if !self.has_node(source) {
            return Err(GraphError::InvalidEdgeSource(source));
        }
        if !self.has_node(target) {
            return Err(GraphError::InvalidEdgeTarget(target));
        }

        let id = self.allocate_edge_id();
        let edge = Edge::new_with_properties(id, source, target, edge_type, properties);
        self.install_edge(edge);
        Ok(id)
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.slot()).and_then(|e| e.as_ref())
    }

    pub fn has_edge(&self, id: EdgeId) -> bool {
        self.get_edge(id).is_some()
    }

    pub fn set_edge_property(
        &mut self,
        id: EdgeId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let key = key.into();
        let value = value.into();
        let edge = self
            .edges
            .get_mut(id.slot())
            .and_then(|e| e.as_mut())
            .ok_or(GraphError::EdgeNotFound(id))?;
        let old_value = edge.set_property(key.clone(), value.clone());
        let edge_type = edge.edge_type.clone();

        self.indexes.apply(&IndexEvent::EdgePropertySet {
            id,
            edge_type,
            key,
            old_value: old_value.clone(),
            new_value: value,
        });
        Ok(old_value)
    }

    pub fn delete_edge(&mut self, id: EdgeId) -> GraphResult<Edge> {
        let edge = self
            .edges
            .get_mut(id.slot())
            .and_then(|e| e.take())
            .ok_or(GraphError::EdgeNotFound(id))?;

        self.free_edge_ids.push(id.as_u64());

        if let Some(ids) = self.edge_type_index.get_mut(&edge.edge_type) {
            ids.remove(&id);
        }
        if let Some(adj) = self.outgoing.get_mut(edge.source.slot()) {
            adj.retain(|&eid| eid != id);
        }
        if let Some(adj) = self.incoming.get_mut(edge.target.slot()) {
            adj.retain(|&eid| eid != id);
        }
        self.indexes.apply(&IndexEvent::EdgeDeleted {
            id,
            edge_type: edge.edge_type.clone(),
            properties: edge.properties.clone(),
        });
        Ok(edge)
    }

    pub fn get_outgoing_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.edges_in(&self.outgoing, node_id)
    }

    pub fn get_incoming_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.edges_in(&self.incoming, node_id)
    }

    /// Incident edges in the requested direction. With `Both`, a self-loop is
    /// reported once.
    pub fn edges_of(&self, node_id: NodeId, direction: Direction) -> Vec<&Edge> {
        match direction {
            Direction::Outgoing => self.get_outgoing_edges(node_id),
            Direction::Incoming => self.get_incoming_edges(node_id),
            Direction::Both => {
                let mut edges = self.get_outgoing_edges(node_id);
                edges.extend(
                    self.get_incoming_edges(node_id)
                        .into_iter()
                        .filter(|e| e.source != e.target),
                );
                edges
            }
        }
    }

    fn edges_in<'a>(&'a self, adjacency: &'a [Vec<EdgeId>], node_id: NodeId) -> Vec<&'a Edge> {
        adjacency
            .get(node_id.slot())
            .map(|ids| ids.iter().filter_map(|&id| self.get_edge(id)).collect())
            .unwrap_or_default()
    }

    /// All edges of a type, in id order
    pub fn get_edges_by_type(&self, edge_type: &EdgeType) -> Vec<&Edge> {
        let mut ids: Vec<EdgeId> = self
            .edge_type_index
            .get(edge_type)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids.into_iter().filter_map(|id| self.get_edge(id)).collect()
    }

    /// Edges of `edge_type` whose `key` property lies in `range`, served from
    /// a relationship index when one exists
    pub fn edges_in_property_range<R>(&self, edge_type: &EdgeType, key: &str, range: R) -> Vec<&Edge>
    where
        R: RangeBounds<PropertyValue>,
    {
        let bounds = (range.start_bound().cloned(), range.end_bound().cloned());
        let index_key = RelationshipIndexKey::new(edge_type.clone(), key);
        if let Some(ids) = self.indexes.edge_range(&index_key, bounds.clone()) {
            return ids.into_iter().filter_map(|id| self.get_edge(id)).collect();
        }
        self.get_edges_by_type(edge_type)
            .into_iter()
            .filter(|e| e.get_property(key).map(|v| bounds.contains(v)).unwrap_or(false))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    /// Match-or-create an edge.
    ///
    /// Without a discriminator the edge is identified by (type, source,
    /// target); with one, the discriminating property must also match.
    pub fn merge_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
        discriminator: Option<(&str, PropertyValue)>,
        mut properties: PropertyMap,
    ) -> GraphResult<MergeOutcome<EdgeId>> {
        let edge_type = edge_type.into();
        if !self.has_node(source) {
            return Err(GraphError::InvalidEdgeSource(source));
        }
        if !self.has_node(target) {
            return Err(GraphError::InvalidEdgeTarget(target));
        }

        let existing = self
            .get_outgoing_edges(source)
            .into_iter()
            .find(|e| {
                e.target == target
                    && e.edge_type == edge_type
                    && discriminator
                        .as_ref()
                        .map(|(k, v)| e.get_property(k) == Some(v))
                        .unwrap_or(true)
            })
            .map(|e| e.id);

        if let Some(id) = existing {
            let edge = self.get_edge(id).ok_or(GraphError::EdgeNotFound(id))?;
            let mut changed: Vec<(String, PropertyValue)> = properties
                .into_iter()
                .filter(|(k, v)| edge.get_property(k) != Some(v))
                .collect();
            if changed.is_empty() {
                return Ok(MergeOutcome {
                    id,
                    status: MergeStatus::Unchanged,
                });
            }
            changed.sort_by(|a, b| a.0.cmp(&b.0));
            for (k, v) in changed {
                self.set_edge_property(id, k, v)?;
            }
            return Ok(MergeOutcome {
                id,
                status: MergeStatus::Updated,
            });
        }

        if let Some((k, v)) = discriminator {
            properties.insert(k.to_string(), v);
        }
        let id = self.create_edge_with_properties(source, target, edge_type, properties)?;
        Ok(MergeOutcome {
            id,
            status: MergeStatus::Created,
        })
    }

    // ============================================================
    // Schema objects
    // ============================================================

    /// Declare a uniqueness constraint, back-filled from existing nodes.
    /// Returns false if it was already declared.
    pub fn create_unique_constraint(&mut self, label: impl Into<Label>, property: &str) -> GraphResult<bool> {
        self.require(IndexKind::UniqueConstraint)?;
        let key = PropertyIndexKey::new(label, property);
        if self.indexes.has_unique_constraint(&key) {
            return Ok(false);
        }

        let mut entries: HashMap<PropertyValue, NodeId> = HashMap::new();
        for node in self.get_nodes_by_label(&key.label) {
            let Some(value) = node.get_property(property) else {
                continue;
            };
            if let Some(&owner) = entries.get(value) {
                return Err(unique_violation(key, value.clone(), owner));
            }
            entries.insert(value.clone(), node.id);
        }
        Ok(self.indexes.add_unique_constraint(key, entries))
    }

    /// Declare a node property index, back-filled from existing nodes.
    /// Returns false if it was already declared.
    pub fn create_node_index(&mut self, label: impl Into<Label>, property: &str) -> GraphResult<bool> {
        self.require(IndexKind::NodePropertyIndex)?;
        let key = PropertyIndexKey::new(label, property);
        if self.indexes.has_node_index(&key) {
            return Ok(false);
        }

        let mut index = PropertyIndex::new();
        for node in self.get_nodes_by_label(&key.label) {
            if let Some(value) = node.get_property(property) {
                index.insert(value.clone(), node.id);
            }
        }
        Ok(self.indexes.add_node_index(key, index))
    }

    /// Declare a relationship property index, back-filled from existing edges.
    /// Returns false if it was already declared.
    pub fn create_edge_index(&mut self, edge_type: impl Into<EdgeType>, property: &str) -> GraphResult<bool> {
        self.require(IndexKind::RelationshipPropertyIndex)?;
        let key = RelationshipIndexKey::new(edge_type, property);
        if self.indexes.has_edge_index(&key) {
            return Ok(false);
        }

        let mut index = PropertyIndex::new();
        for edge in self.get_edges_by_type(&key.edge_type) {
            if let Some(value) = edge.get_property(property) {
                index.insert(value.clone(), edge.id);
            }
        }
        Ok(self.indexes.add_edge_index(key, index))
    }

    fn require(&self, kind: IndexKind) -> GraphResult<()> {
        if self.capabilities.supports(kind) {
            Ok(())
        } else {
            Err(GraphError::Unsupported(kind))
        }
    }

    // ============================================================
    // Whole-graph operations
    // ============================================================

    pub fn statistics(&self) -> GraphStatistics {
        let mut stats = GraphStatistics {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            ..Default::default()
        };
        for (label, ids) in &self.label_index {
            if !ids.is_empty() {
                stats.label_counts.insert(label.to_string(), ids.len());
            }
        }
        for (edge_type, ids) in &self.edge_type_index {
            if !ids.is_empty() {
                stats.edge_type_counts.insert(edge_type.to_string(), ids.len());
            }
        }
        stats
    }

    /// Remove all data, indexes and constraints
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.outgoing.clear();
        self.incoming.clear();
        self.free_node_ids.clear();
        self.free_edge_ids.clear();
        self.label_index.clear();
        self.edge_type_index.clear();
        self.indexes.clear();
        self.next_node_id = 1;
        self.next_edge_id = 1;
    }

    // ============================================================
    // Recovery - rebuild a graph from persisted data
    // ============================================================

    /// Insert a recovered node, preserving its id
    pub fn insert_recovered_node(&mut self, node: Node) {
        let id = node.id;
        if id.as_u64() >= self.next_node_id {
            self.next_node_id = id.as_u64() + 1;
        }
        self.install_node(node);
    }

    /// Insert a recovered edge, preserving its id. Both endpoints must
    /// already be present.
    pub fn insert_recovered_edge(&mut self, edge: Edge) -> GraphResult<()> {
        if !self.has_node(edge.source) {
            return Err(GraphError::InvalidEdgeSource(edge.source));
        }
        if !self.has_node(edge.target) {
            return Err(GraphError::InvalidEdgeTarget(edge.target));
        }
        if edge.id.as_u64() >= self.next_edge_id {
            self.next_edge_id = edge.id.as_u64() + 1;
        }
        self.install_edge(edge);
        Ok(())
    }

    /// Recompute free-slot lists after a recovery pass
    pub fn finish_recovery(&mut self) {
        self.free_node_ids = (1..self.next_node_id)
            .filter(|&id| !self.has_node(NodeId::new(id)))
            .collect();
        self.free_edge_ids = (1..self.next_edge_id)
            .filter(|&id| !self.has_edge(EdgeId::new(id)))
            .collect();
    }

    // ============================================================
    // Arena bookkeeping
    // ============================================================

    fn allocate_node_id(&mut self) -> NodeId {
        let id = self.free_node_ids.pop().unwrap_or_else(|| {
            let id = self.next_node_id;
            self.next_node_id += 1;
            id
        });
        NodeId::new(id)
    }

    fn allocate_edge_id(&mut self) -> EdgeId {
        let id = self.free_edge_ids.pop().unwrap_or_else(|| {
            let id = self.next_edge_id;
            self.next_edge_id += 1;
            id
        });
        EdgeId::new(id)
    }

    fn install_node(&mut self, node: Node) {
        let id = node.id;
        let idx = id.slot();
        if idx >= self.nodes.len() {
            self.nodes.resize(idx + 1, None);
            self.outgoing.resize(idx + 1, Vec::new());
            self.incoming.resize(idx + 1, Vec::new());
        }
        for label in &node.labels {
            self.label_index.entry(label.clone()).or_default().insert(id);
        }
        self.indexes.apply(&IndexEvent::NodeCreated {
            id,
            labels: node.labels.iter().cloned().collect(),
            properties: node.properties.clone(),
        });
        self.nodes[idx] = Some(node);
    }

    fn install_edge(&mut self, edge: Edge) {
        let id = edge.id;
        let idx = id.slot();
        if idx >= self.edges.len() {
            self.edges.resize(idx + 1, None);
        }
        self.outgoing[edge.source.slot()].push(id);
        self.incoming[edge.target.slot()].push(id);
        self.edge_type_index
            .entry(edge.edge_type.clone())
            .or_default()
            .insert(id);
        self.indexes.apply(&IndexEvent::EdgeCreated {
            id,
            edge_type: edge.edge_type.clone(),
            properties: edge.properties.clone(),
        });
        self.edges[idx] = Some(edge);
    }

    fn node_slot_mut(&mut self, id: NodeId) -> GraphResult<&mut Node> {
        self.nodes
            .get_mut(id.slot())
            .and_then(|n| n.as_mut())
            .ok_or(GraphError::NodeNotFound(id))
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

fn unique_violation(key: PropertyIndexKey, value: PropertyValue, owner: NodeId) -> GraphError {
    GraphError::UniqueConstraintViolation {
        label: key.label,
        property: key.property,
        value: value.to_string(),
        owner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Bound;

    fn props(pairs: &[(&str, PropertyValue)]) -> PropertyMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_create_and_get_node() {
        let mut store = GraphStore::new();
        let id = store.create_node("Disease");

        assert_eq!(store.node_count(), 1);
        let node = store.get_node(id).unwrap();
        assert!(node.has_label(&Label::new("Disease")));
    }

    #[test]
    fn test_edge_validation() {
        let mut store = GraphStore::new();
        let d = store.create_node("Disease");
        let missing = NodeId::new(999);

        assert_eq!(
            store.create_edge(missing, d, "LEADS_TO"),
            Err(GraphError::InvalidEdgeSource(missing))
        );
        assert_eq!(
            store.create_edge(d, missing, "LEADS_TO"),
            Err(GraphError::InvalidEdgeTarget(missing))
        );
    }

    #[test]
    fn test_adjacency_and_direction() {
        let mut store = GraphStore::new();
        let a = store.create_node("Disease");
        let b = store.create_node("Disease");
        let c = store.create_node("Disease");

        store.create_edge(a, b, "LEADS_TO").unwrap();
        store.create_edge(c, a, "COMMONLY_OCCURS_WITH").unwrap();

        assert_eq!(store.edges_of(a, Direction::Outgoing).len(), 1);
        assert_eq!(store.edges_of(a, Direction::Incoming).len(), 1);
        assert_eq!(store.edges_of(a, Direction::Both).len(), 2);
    }

    #[test]
    fn test_delete_node_detaches_edges() {
        let mut store = GraphStore::new();
        let a = store.create_node("Patient");
        let b = store.create_node("Disease");
        store.create_edge(a, b, "HAS_CONDITION").unwrap();

        store.delete_node(a).unwrap();
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.edge_count(), 0);
        assert!(store.get_incoming_edges(b).is_empty());
        assert_eq!(store.label_count(&Label::new("Patient")), 0);
    }

    #[test]
    fn test_merge_node_is_idempotent() {
        let mut store = GraphStore::new();
        store.create_unique_constraint("Disease", "id").unwrap();

        let first = store
            .merge_node("Disease", "id", 12i64, props(&[("name", "Hypertension".into())]))
            .unwrap();
        assert_eq!(first.status, MergeStatus::Created);

        let again = store
            .merge_node("Disease", "id", 12i64, props(&[("name", "Hypertension".into())]))
            .unwrap();
        assert_eq!(again, MergeOutcome { id: first.id, status: MergeStatus::Unchanged });

        let renamed = store
            .merge_node("Disease", "id", 12i64, props(&[("name", "Essential hypertension".into())]))
            .unwrap();
        assert_eq!(renamed.status, MergeStatus::Updated);
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_unique_constraint_enforced() {
        let mut store = GraphStore::new();
        store.create_unique_constraint("BodySystem", "name").unwrap();
        store
            .create_node_with_properties(vec![Label::new("BodySystem")], props(&[("name", "Eye".into())]))
            .unwrap();

        let dup = store.create_node_with_properties(vec![Label::new("BodySystem")], props(&[("name", "Eye".into())]));
        assert!(matches!(dup, Err(GraphError::UniqueConstraintViolation { .. })));
    }

    #[test]
    fn test_unique_constraint_rejects_existing_duplicates() {
        let mut store = GraphStore::new();
        for _ in 0..2 {
            store
                .create_node_with_properties(vec![Label::new("Disease")], props(&[("id", 1i64.into())]))
                .unwrap();
        }
        assert!(matches!(
            store.create_unique_constraint("Disease", "id"),
            Err(GraphError::UniqueConstraintViolation { .. })
        ));
    }

    #[test]
    fn test_merge_edge_keyed_by_type_and_endpoints() {
        let mut store = GraphStore::new();
        let a = store.create_node("Disease");
        let b = store.create_node("Disease");

        let first = store
            .merge_edge(a, b, "LEADS_TO", None, props(&[("strength", 0.7.into())]))
            .unwrap();
        let second = store
            .merge_edge(a, b, "LEADS_TO", None, props(&[("strength", 0.8.into())]))
            .unwrap();
        let other_type = store
            .merge_edge(a, b, "COMMONLY_OCCURS_WITH", None, props(&[("strength", 0.8.into())]))
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.status, MergeStatus::Updated);
        assert_eq!(other_type.status, MergeStatus::Created);
        assert_eq!(store.edge_count(), 2);
        assert_eq!(store.get_edge(first.id).unwrap().strength(), Some(0.8));
    }

    #[test]
    fn test_merge_edge_with_discriminator() {
        let mut store = GraphStore::new();
        let a = store.create_node("BodySystem");
        let b = store.create_node("BodySystem");

        let high = store
            .merge_edge(a, b, "SYSTEM_INTERACTION", Some(("type", "HIGH_INTERACTION".into())), PropertyMap::new())
            .unwrap();
        let moderate = store
            .merge_edge(a, b, "SYSTEM_INTERACTION", Some(("type", "MODERATE_INTERACTION".into())), PropertyMap::new())
            .unwrap();
        assert_ne!(high.id, moderate.id);
        assert_eq!(store.edge_count(), 2);
    }

    #[test]
    fn test_indexes_back_filled_and_maintained() {
        let mut store = GraphStore::new();
        let a = store
            .create_node_with_properties(vec![Label::new("Disease")], props(&[("complexity", "HIGH".into())]))
            .unwrap();
        assert!(store.create_node_index("Disease", "complexity").unwrap());
        assert!(!store.create_node_index("Disease", "complexity").unwrap());

        let high = PropertyValue::from("HIGH");
        assert_eq!(store.find_nodes_by_property(&Label::new("Disease"), "complexity", &high), vec![a]);

        store.set_node_property(a, "complexity", "LOW").unwrap();
        assert!(store.find_nodes_by_property(&Label::new("Disease"), "complexity", &high).is_empty());
    }

    #[test]
    fn test_edge_strength_range() {
        let mut store = GraphStore::new();
        store.create_edge_index("LEADS_TO", "strength").unwrap();
        let a = store.create_node("Disease");
        let b = store.create_node("Disease");
        let c = store.create_node("Disease");
        store.create_edge_with_properties(a, b, "LEADS_TO", props(&[("strength", 0.9.into())])).unwrap();
        store.create_edge_with_properties(b, c, "LEADS_TO", props(&[("strength", 0.4.into())])).unwrap();

        let strong = store.edges_in_property_range(
            &EdgeType::new("LEADS_TO"),
            "strength",
            (Bound::Included(PropertyValue::Float(0.6)), Bound::Unbounded),
        );
        assert_eq!(strong.len(), 1);
        assert_eq!(strong[0].source, a);
    }

    #[test]
    fn test_unsupported_index_kind() {
        let mut store = GraphStore::with_capabilities(StoreCapabilities {
            relationship_property_indexes: false,
            ..Default::default()
        });
        assert_eq!(
            store.create_edge_index("LEADS_TO", "strength"),
            Err(GraphError::Unsupported(IndexKind::RelationshipPropertyIndex))
        );
    }

    #[test]
    fn test_label_add_remove_updates_index() {
        let mut store = GraphStore::new();
        let id = store.create_node("Disease");
        assert!(store.add_label_to_node(id, "HubDisease").unwrap());
        assert!(!store.add_label_to_node(id, "HubDisease").unwrap());
        assert_eq!(store.get_nodes_by_label(&Label::new("HubDisease")).len(), 1);

        assert!(store.remove_label_from_node(id, &Label::new("HubDisease")).unwrap());
        assert!(store.get_nodes_by_label(&Label::new("HubDisease")).is_empty());
    }

    #[test]
    fn test_statistics_and_clear() {
        let mut store = GraphStore::new();
        let a = store.create_node("Disease");
        let b = store.create_node("BodySystem");
        store.create_edge(a, b, "AFFECTS_SYSTEM").unwrap();

        let stats = store.statistics();
        assert_eq!(stats.label("Disease"), 1);
        assert_eq!(stats.edge_type("AFFECTS_SYSTEM"), 1);

        store.clear();
        assert_eq!(store.node_count(), 0);
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.statistics(), GraphStatistics::default());
    }

    #[test]
    fn test_id_reuse() {
        let mut store = GraphStore::new();
        let first = store.create_node("Patient");
        store.create_node("Patient");
        store.delete_node(first).unwrap();

        let reused = store.create_node("Patient");
        assert_eq!(reused, first);
        assert_eq!(store.node_count(), 2);
    }
}
