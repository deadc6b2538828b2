//! Derived disease and system attributes
//!
//! Hub flags and relationship counts are a view over the current edge set:
//! [`recompute_hub_labels`] rewrites them from scratch each time, and burden
//! scores are computed on demand without being stored.

use crate::graph::{Direction, GraphResult, GraphStore, Label, NodeId, PropertyValue};
use crate::loader::find_system;
use crate::model::Complexity;
use crate::schema::{labels, rel};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

pub const DEFAULT_HUB_THRESHOLD: usize = 3;

/// Coarse connectivity band of a disease by incident relationship count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NetworkTier {
    High,
    Moderate,
    Low,
    Isolated,
}

impl NetworkTier {
    pub fn from_count(relationship_count: usize) -> Self {
        match relationship_count {
            n if n >= 5 => NetworkTier::High,
            n if n >= 3 => NetworkTier::Moderate,
            n if n >= 1 => NetworkTier::Low,
            _ => NetworkTier::Isolated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkTier::High => "HIGH",
            NetworkTier::Moderate => "MODERATE",
            NetworkTier::Low => "LOW",
            NetworkTier::Isolated => "ISOLATED",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HubSummary {
    pub threshold: usize,
    pub diseases: usize,
    /// Hub disease names, most connected first
    pub hubs: Vec<String>,
    pub labels_added: usize,
    pub labels_removed: usize,
}

/// Number of weighted disease relationships touching `disease`, either direction
pub fn relationship_count(store: &GraphStore, disease: NodeId) -> usize {
    store
        .edges_of(disease, Direction::Both)
        .into_iter()
        .filter(|e| rel::WEIGHTED.contains(&e.edge_type.as_str()))
        .count()
}

/// Recompute `relationship_count`, `is_hub`, `network_tier` and the
/// HubDisease label on every disease. Only values that changed are written.
pub fn recompute_hub_labels(store: &mut GraphStore, threshold: usize) -> GraphResult<HubSummary> {
    let hub_label = Label::new(labels::HUB_DISEASE);
    let diseases: Vec<NodeId> = store
        .get_nodes_by_label(&Label::new(labels::DISEASE))
        .into_iter()
        .map(|n| n.id)
        .collect();

    let mut summary = HubSummary {
        threshold,
        diseases: diseases.len(),
        ..Default::default()
    };
    let mut hubs: Vec<(usize, String)> = Vec::new();

    for id in diseases {
        let count = relationship_count(store, id);
        let is_hub = count >= threshold;
        let tier = NetworkTier::from_count(count);

        write_if_changed(store, id, "relationship_count", PropertyValue::Integer(count as i64))?;
        write_if_changed(store, id, "is_hub", PropertyValue::Boolean(is_hub))?;
        write_if_changed(store, id, "network_tier", PropertyValue::from(tier.as_str()))?;

        if is_hub {
            if store.add_label_to_node(id, hub_label.clone())? {
                summary.labels_added += 1;
            }
            let name = store
                .get_node(id)
                .and_then(|n| n.str_property("name"))
                .unwrap_or_default()
                .to_string();
            hubs.push((count, name));
        } else if store.remove_label_from_node(id, &hub_label)? {
            summary.labels_removed += 1;
        }
    }

    hubs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    summary.hubs = hubs.into_iter().map(|(_, name)| name).collect();

    info!(
        "Hub labels recomputed (threshold {}): {} hubs among {} diseases",
        threshold,
        summary.hubs.len(),
        summary.diseases
    );
    Ok(summary)
}

fn write_if_changed(store: &mut GraphStore, id: NodeId, key: &str, value: PropertyValue) -> GraphResult<()> {
    let current = store.get_node(id).and_then(|n| n.get_property(key));
    if current != Some(&value) {
        debug!("{}: {} = {}", id, key, value);
        store.set_node_property(id, key, value)?;
    }
    Ok(())
}

/// Complexity mix of the diseases in one body system
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemBurden {
    pub system: String,
    pub disease_count: usize,
    pub high_complexity: usize,
    pub moderate_complexity: usize,
    pub low_complexity: usize,
}

impl SystemBurden {
    /// `disease_count + 2 * high + 1 * moderate`
    pub fn score(&self) -> f64 {
        self.disease_count as f64 * 1.0
            + self.high_complexity as f64 * 2.0
            + self.moderate_complexity as f64 * 1.0
    }
}

/// Burden of the system named `system`; `None` if no such system exists
pub fn system_burden(store: &GraphStore, system: &str) -> Option<SystemBurden> {
    let system_node = find_system(store, system)?;
    let diseases: HashSet<NodeId> = store
        .get_incoming_edges(system_node)
        .into_iter()
        .filter(|e| e.is_type(rel::AFFECTS_SYSTEM))
        .map(|e| e.source)
        .collect();

    let mut burden = SystemBurden {
        system: system.to_string(),
        disease_count: diseases.len(),
        high_complexity: 0,
        moderate_complexity: 0,
        low_complexity: 0,
    };
    for id in diseases {
        let complexity = store
            .get_node(id)
            .and_then(|n| n.get_property("complexity"))
            .and_then(Complexity::from_property);
        match complexity {
            Some(Complexity::High) => burden.high_complexity += 1,
            Some(Complexity::Moderate) => burden.moderate_complexity += 1,
            Some(Complexity::Low) => burden.low_complexity += 1,
            None => {}
        }
    }
    Some(burden)
}

pub fn system_burden_score(store: &GraphStore, system: &str) -> Option<f64> {
    system_burden(store, system).map(|b| b.score())
}
