//! Patient overlay: demonstration patients linked to existing diseases

use super::report::{EntityKind, LoadReport, RejectReason};
use super::{per_record, resolve_disease, LoadResult};
use crate::dataset::{DiseaseRef, PatientRecord};
use crate::graph::{GraphStore, Label, MergeStatus, NodeId, PropertyMap, PropertyValue};
use crate::schema::{self, labels, rel};
use std::collections::HashSet;
use tracing::info;

/// Upsert patients and their HAS_CONDITION edges.
///
/// Conditions naming an unknown disease are rejected one by one; the rest of
/// the patient is still loaded. `condition_count` reflects the linked diseases.
pub fn load_patients(store: &mut GraphStore, records: &[PatientRecord]) -> LoadResult<LoadReport> {
    let mut report = LoadReport::new();
    schema::ensure_schema(store)?;

    for record in records {
        let mut props = PropertyMap::new();
        props.insert("age_group".to_string(), record.age_group.as_str().into());
        props.insert("complexity".to_string(), record.complexity.as_str().into());
        let outcome = store.merge_node(labels::PATIENT, "id", record.id.as_str(), props);
        let Some(outcome) = per_record(&mut report, EntityKind::Patient, &record.id, outcome)? else {
            continue;
        };

        for condition in &record.conditions {
            let label = format!("{} -> {}", record.id, condition.disease);
            let Some(disease) = resolve_disease(store, &DiseaseRef::Name(condition.disease.clone())) else {
                report.reject(
                    EntityKind::HasCondition,
                    label,
                    RejectReason::UnknownDisease(condition.disease.clone()),
                );
                continue;
            };

            let mut edge_props = PropertyMap::new();
            if let Some(severity) = &condition.severity {
                edge_props.insert("severity".to_string(), severity.as_str().into());
            }
            if let Some(at) = condition.diagnosed_at {
                edge_props.insert("diagnosed_at".to_string(), PropertyValue::DateTime(at.timestamp_millis()));
            }
            let link = store.merge_edge(outcome.id, disease, rel::HAS_CONDITION, None, edge_props);
            if let Some(link) = per_record(&mut report, EntityKind::HasCondition, &label, link)? {
                report.record(EntityKind::HasCondition, link.status);
            }
        }

        let mut status = outcome.status;
        let count = condition_count(store, outcome.id) as i64;
        let current = store
            .get_node(outcome.id)
            .and_then(|n| n.get_property("condition_count"))
            .and_then(|v| v.as_integer());
        if current != Some(count) {
            store.set_node_property(outcome.id, "condition_count", count)?;
            if status == MergeStatus::Unchanged {
                status = MergeStatus::Updated;
            }
        }
        report.record(EntityKind::Patient, status);
    }

    info!(
        "Patient load {} finished: {} patients, {} conditions linked, {} rejected",
        report.run_id,
        report.counter(EntityKind::Patient).accepted(),
        report.counter(EntityKind::HasCondition).accepted(),
        report.rejections.len()
    );
    Ok(report)
}

fn condition_count(store: &GraphStore, patient: NodeId) -> usize {
    store
        .get_outgoing_edges(patient)
        .into_iter()
        .filter(|e| e.is_type(rel::HAS_CONDITION))
        .map(|e| e.target)
        .collect::<HashSet<_>>()
        .len()
}

/// Delete every patient and its HAS_CONDITION edges. Disease and body system
/// data is untouched. Returns the number of patients removed.
pub fn remove_patients(store: &mut GraphStore) -> usize {
    let ids: Vec<NodeId> = store
        .get_nodes_by_label(&Label::new(labels::PATIENT))
        .into_iter()
        .map(|n| n.id)
        .collect();
    let removed = ids.into_iter().filter(|id| store.delete_node(*id).is_ok()).count();
    info!("Removed {} patients", removed);
    removed
}
