//! Schema & constraint layer
//!
//! Canonical label and relationship names, plus [`ensure_schema`] which
//! declares every uniqueness constraint and secondary index the loaders and
//! analytics rely on. Declaring is idempotent; unsupported kinds fail before
//! anything is declared.

use crate::graph::{GraphError, GraphStore};
use crate::index::IndexKind;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Node labels
pub mod labels {
    pub const DISEASE: &str = "Disease";
    pub const BODY_SYSTEM: &str = "BodySystem";
    pub const PATIENT: &str = "Patient";
    pub const MEDICAL_CODE: &str = "MedicalCode";
    /// Derived: diseases whose relationship count meets the hub threshold
    pub const HUB_DISEASE: &str = "HubDisease";
}

/// Relationship types
pub mod rel {
    pub const AFFECTS_SYSTEM: &str = "AFFECTS_SYSTEM";
    pub const COMMONLY_OCCURS_WITH: &str = "COMMONLY_OCCURS_WITH";
    pub const LEADS_TO: &str = "LEADS_TO";
    pub const INCREASES_RISK_OF: &str = "INCREASES_RISK_OF";
    pub const SYSTEM_INTERACTION: &str = "SYSTEM_INTERACTION";
    pub const HAS_CONDITION: &str = "HAS_CONDITION";
    pub const HAS_CODE: &str = "HAS_CODE";

    /// Weighted disease-to-disease relationship types
    pub const WEIGHTED: [&str; 3] = [COMMONLY_OCCURS_WITH, LEADS_TO, INCREASES_RISK_OF];
}

/// Uniqueness constraints as (label, property)
pub const UNIQUE_CONSTRAINTS: [(&str, &str); 4] = [
    (labels::DISEASE, "id"),
    (labels::BODY_SYSTEM, "name"),
    (labels::PATIENT, "id"),
    (labels::MEDICAL_CODE, "concept_id"),
];

/// Node property indexes as (label, property)
pub const NODE_INDEXES: [(&str, &str); 5] = [
    (labels::DISEASE, "name"),
    (labels::DISEASE, "complexity"),
    (labels::BODY_SYSTEM, "name"),
    (labels::BODY_SYSTEM, "system_num"),
    (labels::PATIENT, "age_group"),
];

/// Relationship property indexes as (type, property)
pub const RELATIONSHIP_INDEXES: [(&str, &str); 4] = [
    (rel::COMMONLY_OCCURS_WITH, "strength"),
    (rel::LEADS_TO, "strength"),
    (rel::INCREASES_RISK_OF, "strength"),
    (rel::SYSTEM_INTERACTION, "strength"),
];

#[derive(Error, Debug, PartialEq)]
pub enum SchemaError {
    #[error("Store cannot declare {kind} on {target}")]
    Unsupported { kind: IndexKind, target: String },

    #[error("Existing data violates {0}")]
    ConstraintViolation(GraphError),
}

pub type SchemaResult<T> = Result<T, SchemaError>;

/// One declared schema object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaObject {
    pub kind: String,
    pub target: String,
    pub property: String,
}

/// What an [`ensure_schema`] call declared
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaReport {
    pub created: Vec<SchemaObject>,
    pub existing: Vec<SchemaObject>,
}

impl SchemaReport {
    pub fn total(&self) -> usize {
        self.created.len() + self.existing.len()
    }

    fn record(&mut self, created: bool, kind: IndexKind, target: &str, property: &str) {
        let object = SchemaObject {
            kind: kind.to_string(),
            target: target.to_string(),
            property: property.to_string(),
        };
        if created {
            debug!("Declared {} on {}.{}", kind, target, property);
            self.created.push(object);
        } else {
            self.existing.push(object);
        }
    }
}

/// Declare all constraints and indexes. Safe to call repeatedly.
pub fn ensure_schema(store: &mut GraphStore) -> SchemaResult<SchemaReport> {
    check_capabilities(store)?;

    let mut report = SchemaReport::default();
    for (label, property) in UNIQUE_CONSTRAINTS {
        let created = store
            .create_unique_constraint(label, property)
            .map_err(|e| declare_error(e, label))?;
        report.record(created, IndexKind::UniqueConstraint, label, property);
    }
    for (label, property) in NODE_INDEXES {
        let created = store
            .create_node_index(label, property)
            .map_err(|e| declare_error(e, label))?;
        report.record(created, IndexKind::NodePropertyIndex, label, property);
    }
    for (edge_type, property) in RELATIONSHIP_INDEXES {
        let created = store
            .create_edge_index(edge_type, property)
            .map_err(|e| declare_error(e, edge_type))?;
        report.record(created, IndexKind::RelationshipPropertyIndex, edge_type, property);
    }

    info!(
        "Schema ensured: {} declared, {} already present",
        report.created.len(),
        report.existing.len()
    );
    Ok(report)
}

fn check_capabilities(store: &GraphStore) -> SchemaResult<()> {
    let caps = store.capabilities();
    let requested = UNIQUE_CONSTRAINTS
        .iter()
        .map(|(t, _)| (IndexKind::UniqueConstraint, *t))
        .chain(NODE_INDEXES.iter().map(|(t, _)| (IndexKind::NodePropertyIndex, *t)))
        .chain(
            RELATIONSHIP_INDEXES
                .iter()
                .map(|(t, _)| (IndexKind::RelationshipPropertyIndex, *t)),
        );
    for (kind, target) in requested {
        if !caps.supports(kind) {
            return Err(SchemaError::Unsupported {
                kind,
                target: target.to_string(),
            });
        }
    }
    Ok(())
}

fn declare_error(error: GraphError, target: &str) -> SchemaError {
    match error {
        GraphError::Unsupported(kind) => SchemaError::Unsupported {
            kind,
            target: target.to_string(),
        },
        other => SchemaError::ConstraintViolation(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Label, PropertyMap, StoreCapabilities};

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let mut store = GraphStore::new();
        let first = ensure_schema(&mut store).unwrap();
        assert_eq!(first.created.len(), 13);
        assert!(first.existing.is_empty());

        let second = ensure_schema(&mut store).unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.existing.len(), 13);
    }

    #[test]
    fn test_unsupported_relationship_index_fails_fast() {
        let mut store = GraphStore::with_capabilities(StoreCapabilities {
            relationship_property_indexes: false,
            ..Default::default()
        });
        let err = ensure_schema(&mut store).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::Unsupported { kind: IndexKind::RelationshipPropertyIndex, .. }
        ));
        assert!(store.indexes().unique_constraints().is_empty());
    }

    #[test]
    fn test_duplicate_data_blocks_constraint() {
        let mut store = GraphStore::new();
        for _ in 0..2 {
            let mut props = PropertyMap::new();
            props.insert("name".to_string(), "Eye".into());
            store
                .create_node_with_properties(vec![Label::new(labels::BODY_SYSTEM)], props)
                .unwrap();
        }
        assert!(matches!(
            ensure_schema(&mut store),
            Err(SchemaError::ConstraintViolation(_))
        ));
    }
}
