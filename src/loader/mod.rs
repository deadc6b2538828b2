//! Reference data and patient loaders
//!
//! Every entity and edge is written with match-or-create semantics, so a
//! load can be re-run in full after a partial failure. Bad records are
//! skipped and reported; only store-level failures abort a run.

pub mod patients;
pub mod report;

pub use patients::{load_patients, remove_patients};
pub use report::{Counter, EntityKind, LoadReport, RejectReason, Rejection};

use crate::dataset::{
    DiseaseRecord, DiseaseRef, MedicalCodeRecord, ReferenceDataset, RelationshipRecord,
    SystemInteractionRecord,
};
use crate::graph::{GraphError, GraphResult, GraphStore, Label, NodeId, PropertyMap, PropertyValue};
use crate::model::{RelationshipKind, Strength};
use crate::schema::{self, labels, rel, SchemaError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Populate body systems, diseases and curated relationships.
///
/// Order: schema, body systems, diseases, AFFECTS_SYSTEM, weighted disease
/// relationships, system interactions, medical codes.
pub fn load_reference_data(store: &mut GraphStore, dataset: &ReferenceDataset) -> LoadResult<LoadReport> {
    let mut report = LoadReport::new();
    info!("Reference load {} started", report.run_id);

    schema::ensure_schema(store)?;

    for system in &dataset.body_systems {
        let mut props = PropertyMap::new();
        props.insert("system_num".to_string(), system.system_num.into());
        props.insert("condition_count".to_string(), system.condition_count.into());
        let outcome = store.merge_node(labels::BODY_SYSTEM, "name", system.name.as_str(), props);
        if let Some(outcome) = per_record(&mut report, EntityKind::BodySystem, &system.name, outcome)? {
            report.record(EntityKind::BodySystem, outcome.status);
        }
    }
    info!("Loaded {} body systems", dataset.body_systems.len());

    let mut loaded = Vec::with_capacity(dataset.diseases.len());
    for disease in &dataset.diseases {
        let outcome = store.merge_node(labels::DISEASE, "id", disease.id, disease_properties(disease));
        if let Some(outcome) = per_record(&mut report, EntityKind::Disease, &disease.name, outcome)? {
            report.record(EntityKind::Disease, outcome.status);
            loaded.push((outcome.id, disease));
        }
    }
    info!("Loaded {} diseases", loaded.len());

    for (node, disease) in loaded {
        link_systems(store, &mut report, node, disease)?;
    }

    for record in &dataset.relationships {
        load_relationship(store, &mut report, record)?;
    }
    info!(
        "Loaded {} disease relationships",
        report.counter(EntityKind::Relationship).accepted()
    );

    for record in &dataset.system_interactions {
        load_system_interaction(store, &mut report, record)?;
    }

    for record in &dataset.medical_codes {
        load_medical_code(store, &mut report, record)?;
    }

    info!(
        "Reference load {} finished: {} created, {} updated, {} rejected",
        report.run_id,
        report.total_created(),
        report.total_updated(),
        report.rejections.len()
    );
    Ok(report)
}

fn disease_properties(disease: &DiseaseRecord) -> PropertyMap {
    let mut props = PropertyMap::new();
    props.insert("name".to_string(), disease.name.as_str().into());
    if let Some(original) = &disease.original_name {
        props.insert("original_name".to_string(), original.as_str().into());
    }
    props.insert("diagnosis_type".to_string(), disease.diagnosis_type.as_str().into());
    props.insert("complexity".to_string(), disease.complexity.as_str().into());
    props.insert("has_test_results".to_string(), disease.has_test_results.into());
    props
}

fn link_systems(
    store: &mut GraphStore,
    report: &mut LoadReport,
    disease: NodeId,
    record: &DiseaseRecord,
) -> LoadResult<()> {
    let mut linked = 0;
    for system in &record.systems {
        let label = format!("{} -> {}", record.name, system);
        let Some(system_node) = find_system(store, system) else {
            report.reject(
                EntityKind::AffectsSystem,
                label,
                RejectReason::UnknownBodySystem(system.clone()),
            );
            continue;
        };
        let outcome = store.merge_edge(disease, system_node, rel::AFFECTS_SYSTEM, None, PropertyMap::new());
        if let Some(outcome) = per_record(report, EntityKind::AffectsSystem, &label, outcome)? {
            report.record(EntityKind::AffectsSystem, outcome.status);
            linked += 1;
        }
    }
    if linked == 0 {
        warn!("Disease '{}' is not linked to any body system", record.name);
    }
    Ok(())
}

fn load_relationship(store: &mut GraphStore, report: &mut LoadReport, record: &RelationshipRecord) -> LoadResult<()> {
    let label = format!("{} -[{}]-> {}", record.source, record.kind, record.target);
    let kind: RelationshipKind = match record.kind.parse() {
        Ok(kind) => kind,
        Err(_) => {
            report.reject(
                EntityKind::Relationship,
                label,
                RejectReason::UnknownRelationshipType(record.kind.clone()),
            );
            return Ok(());
        }
    };

    let Some(source) = resolve_disease(store, &record.source) else {
        report.reject(
            EntityKind::Relationship,
            label,
            RejectReason::UnknownDisease(record.source.to_string()),
        );
        return Ok(());
    };
    let Some(target) = resolve_disease(store, &record.target) else {
        report.reject(
            EntityKind::Relationship,
            label,
            RejectReason::UnknownDisease(record.target.to_string()),
        );
        return Ok(());
    };
    if source == target {
        report.reject(
            EntityKind::Relationship,
            label,
            RejectReason::SelfRelationship(record.source.to_string()),
        );
        return Ok(());
    }
    let Some(strength) = Strength::new(record.strength) else {
        report.reject(
            EntityKind::Relationship,
            label,
            RejectReason::StrengthOutOfRange(record.strength),
        );
        return Ok(());
    };

    let mut props = PropertyMap::new();
    props.insert("strength".to_string(), strength.into());
    props.insert("evidence_source".to_string(), record.evidence.as_str().into());
    props.insert("discovery_method".to_string(), record.discovery_method.as_str().into());
    let discriminator = record
        .edge_key
        .as_deref()
        .map(|key| ("edge_key", PropertyValue::from(key)));

    let outcome = store.merge_edge(source, target, kind.as_str(), discriminator, props);
    if let Some(outcome) = per_record(report, EntityKind::Relationship, &label, outcome)? {
        debug!("{} ({:?})", label, outcome.status);
        report.record(EntityKind::Relationship, outcome.status);
    }
    Ok(())
}

fn load_system_interaction(
    store: &mut GraphStore,
    report: &mut LoadReport,
    record: &SystemInteractionRecord,
) -> LoadResult<()> {
    let label = format!("{} -[{}]-> {}", record.source, record.interaction_type, record.target);
    let Some(source) = find_system(store, &record.source) else {
        report.reject(
            EntityKind::SystemInteraction,
            label,
            RejectReason::UnknownBodySystem(record.source.clone()),
        );
        return Ok(());
    };
    let Some(target) = find_system(store, &record.target) else {
        report.reject(
            EntityKind::SystemInteraction,
            label,
            RejectReason::UnknownBodySystem(record.target.clone()),
        );
        return Ok(());
    };
    if !(record.strength.is_finite() && record.strength > 0.0) {
        report.reject(
            EntityKind::SystemInteraction,
            label,
            RejectReason::InvalidInteractionStrength(record.strength),
        );
        return Ok(());
    }

    let mut props = PropertyMap::new();
    props.insert("strength".to_string(), record.strength.into());
    props.insert("bidirectional".to_string(), record.bidirectional.into());
    let discriminator = Some(("type", PropertyValue::from(record.interaction_type.as_str())));

    let outcome = store.merge_edge(source, target, rel::SYSTEM_INTERACTION, discriminator, props);
    if let Some(outcome) = per_record(report, EntityKind::SystemInteraction, &label, outcome)? {
        report.record(EntityKind::SystemInteraction, outcome.status);
    }
    Ok(())
}

fn load_medical_code(store: &mut GraphStore, report: &mut LoadReport, record: &MedicalCodeRecord) -> LoadResult<()> {
    let Some(disease) = resolve_disease(store, &record.disease) else {
        report.reject(
            EntityKind::MedicalCode,
            record.concept_id.clone(),
            RejectReason::UnknownDisease(record.disease.to_string()),
        );
        return Ok(());
    };

    let mut props = PropertyMap::new();
    props.insert("description".to_string(), record.description.as_str().into());
    props.insert("mapping_method".to_string(), record.mapping_method.as_str().into());
    let outcome = store.merge_node(labels::MEDICAL_CODE, "concept_id", record.concept_id.as_str(), props);
    let Some(code) = per_record(report, EntityKind::MedicalCode, &record.concept_id, outcome)? else {
        return Ok(());
    };
    report.record(EntityKind::MedicalCode, code.status);

    let link = store.merge_edge(disease, code.id, rel::HAS_CODE, None, PropertyMap::new());
    if let Some(link) = per_record(report, EntityKind::HasCode, &record.concept_id, link)? {
        report.record(EntityKind::HasCode, link.status);
    }
    Ok(())
}

/// A constraint violation costs the record; anything else aborts the run
fn per_record<T>(
    report: &mut LoadReport,
    kind: EntityKind,
    record: &str,
    result: GraphResult<T>,
) -> LoadResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e @ GraphError::UniqueConstraintViolation { .. }) => {
            report.reject(kind, record, RejectReason::ConstraintViolation(e.to_string()));
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn find_system(store: &GraphStore, name: &str) -> Option<NodeId> {
    store.find_node(&Label::new(labels::BODY_SYSTEM), "name", &PropertyValue::from(name))
}

/// Resolve a disease by id (uniqueness constraint) or by name (secondary index)
pub(crate) fn resolve_disease(store: &GraphStore, reference: &DiseaseRef) -> Option<NodeId> {
    let label = Label::new(labels::DISEASE);
    match reference {
        DiseaseRef::Id(id) => store.find_node(&label, "id", &PropertyValue::Integer(*id)),
        DiseaseRef::Name(name) => store
            .find_nodes_by_property(&label, "name", &PropertyValue::from(name.as_str()))
            .into_iter()
            .next(),
    }
}
