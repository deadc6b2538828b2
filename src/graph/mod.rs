//! Core property graph
//!
//! This module implements the property graph data model with:
//! - Nodes with multiple labels and properties
//! - Directed, typed edges with properties
//! - Multiple edges between the same pair of nodes
//! - In-memory storage with label, type and secondary property indices

pub mod edge;
pub mod event;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

// Re-export main types
pub use edge::Edge;
pub use event::IndexEvent;
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use store::{
    GraphError, GraphResult, GraphStatistics, GraphStore, MergeOutcome, MergeStatus,
    StoreCapabilities,
};
pub use types::{Direction, EdgeId, EdgeType, Label, NodeId};
