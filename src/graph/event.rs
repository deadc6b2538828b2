//! Graph change events consumed by the index manager

use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, EdgeType, Label, NodeId};

#[derive(Debug, Clone)]
pub enum IndexEvent {
    NodeCreated {
        id: NodeId,
        labels: Vec<Label>,
        properties: PropertyMap,
    },
    NodeDeleted {
        id: NodeId,
        labels: Vec<Label>,
        properties: PropertyMap,
    },
    NodePropertySet {
        id: NodeId,
        labels: Vec<Label>,
        key: String,
        old_value: Option<PropertyValue>,
        new_value: PropertyValue,
    },
    LabelAdded {
        id: NodeId,
        label: Label,
        properties: PropertyMap,
    },
    LabelRemoved {
        id: NodeId,
        label: Label,
        properties: PropertyMap,
    },
    EdgeCreated {
        id: EdgeId,
        edge_type: EdgeType,
        properties: PropertyMap,
    },
    EdgeDeleted {
        id: EdgeId,
        edge_type: EdgeType,
        properties: PropertyMap,
    },
    EdgePropertySet {
        id: EdgeId,
        edge_type: EdgeType,
        key: String,
        old_value: Option<PropertyValue>,
        new_value: PropertyValue,
    },
}
