//! Demonstration queries: hub ranking, strongest patterns, cross-system
//! counts, progression insights, patient summaries and a graph overview

use super::network::{DiseaseNetwork, Link};
use super::stats::{mean, round_to};
use super::AnalyticsConfig;
use crate::model::RelationshipKind;
use crate::schema::labels;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubRanking {
    pub disease: String,
    pub relationship_count: i64,
    pub systems: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipPattern {
    pub source: String,
    pub relationship: String,
    pub target: String,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossSystemInteraction {
    pub source_system: String,
    pub target_system: String,
    pub interaction_count: usize,
    pub avg_strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientConditions {
    pub patient_id: String,
    pub age_group: Option<String>,
    pub complexity: Option<String>,
    pub condition_count: usize,
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphOverview {
    pub node_count: usize,
    pub edge_count: usize,
    pub diseases: usize,
    pub body_systems: usize,
    pub patients: usize,
    pub hub_diseases: usize,
    pub disease_relationships: usize,
    pub system_interactions: usize,
    pub avg_relationship_strength: Option<f64>,
    pub label_counts: BTreeMap<String, usize>,
    pub edge_type_counts: BTreeMap<String, usize>,
}

/// HubDisease nodes by stored relationship count
pub fn hub_ranking(network: &DiseaseNetwork, config: &AnalyticsConfig) -> Vec<HubRanking> {
    let mut hubs: Vec<HubRanking> = network
        .diseases
        .iter()
        .enumerate()
        .filter(|(_, d)| d.is_hub)
        .map(|(i, d)| HubRanking {
            disease: d.name.clone(),
            relationship_count: d.relationship_count.unwrap_or(0),
            systems: network.system_names(i),
        })
        .collect();
    hubs.sort_by(|a, b| {
        b.relationship_count
            .cmp(&a.relationship_count)
            .then_with(|| a.disease.cmp(&b.disease))
    });
    hubs.truncate(config.hub_ranking_limit);
    hubs
}

fn pattern(network: &DiseaseNetwork, link: &Link) -> RelationshipPattern {
    RelationshipPattern {
        source: network.name(link.source).to_string(),
        relationship: link.kind.as_str().to_string(),
        target: network.name(link.target).to_string(),
        strength: round_to(link.strength, 4),
    }
}

fn strongest(
    network: &DiseaseNetwork,
    filter: impl Fn(&Link) -> bool,
    limit: usize,
) -> Vec<RelationshipPattern> {
    let mut links: Vec<&Link> = network.links.iter().filter(|&l| filter(l)).collect();
    links.sort_by(|a, b| {
        b.strength
            .total_cmp(&a.strength)
            .then_with(|| network.name(a.source).cmp(network.name(b.source)))
            .then_with(|| network.name(a.target).cmp(network.name(b.target)))
    });
    links.into_iter().take(limit).map(|l| pattern(network, l)).collect()
}

/// Relationships strictly above the strong-pattern threshold
pub fn strongest_patterns(network: &DiseaseNetwork, config: &AnalyticsConfig) -> Vec<RelationshipPattern> {
    strongest(
        network,
        |l| l.strength > config.strong_pattern_threshold,
        config.strong_pattern_limit,
    )
}

pub fn progression_insights(network: &DiseaseNetwork, config: &AnalyticsConfig) -> Vec<RelationshipPattern> {
    strongest(
        network,
        |l| l.kind == RelationshipKind::LeadsTo,
        config.progression_limit,
    )
}

/// Relationship counts between ordered pairs of distinct systems
pub fn cross_system_interactions(
    network: &DiseaseNetwork,
    config: &AnalyticsConfig,
) -> Vec<CrossSystemInteraction> {
    let mut pairs: BTreeMap<(usize, usize), Vec<f64>> = BTreeMap::new();
    for link in &network.links {
        for &s1 in &network.diseases[link.source].systems {
            for &s2 in network.diseases[link.target].systems.iter().filter(|&&s| s != s1) {
                pairs.entry((s1, s2)).or_default().push(link.strength);
            }
        }
    }

    let mut interactions: Vec<CrossSystemInteraction> = pairs
        .into_iter()
        .filter_map(|((s1, s2), strengths)| {
            Some(CrossSystemInteraction {
                source_system: network.system_name(s1).to_string(),
                target_system: network.system_name(s2).to_string(),
                interaction_count: strengths.len(),
                avg_strength: round_to(mean(&strengths)?, 4),
            })
        })
        .collect();
    interactions.sort_by(|a, b| {
        b.interaction_count
            .cmp(&a.interaction_count)
            .then_with(|| b.avg_strength.total_cmp(&a.avg_strength))
            .then_with(|| a.source_system.cmp(&b.source_system))
    });
    interactions.truncate(config.cross_system_limit);
    interactions
}

pub fn patient_conditions(network: &DiseaseNetwork) -> Vec<PatientConditions> {
    let mut summaries: Vec<PatientConditions> = network
        .patients
        .iter()
        .map(|p| PatientConditions {
            patient_id: p.id.clone(),
            age_group: p.age_group.clone(),
            complexity: p.complexity.clone(),
            condition_count: p.conditions.len(),
            conditions: p.conditions.iter().map(|&d| network.name(d).to_string()).collect(),
        })
        .collect();
    summaries.sort_by(|a, b| {
        b.condition_count
            .cmp(&a.condition_count)
            .then_with(|| a.patient_id.cmp(&b.patient_id))
    });
    summaries
}

/// `None` when the graph holds no nodes at all
pub fn graph_overview(network: &DiseaseNetwork) -> Option<GraphOverview> {
    let stats = &network.statistics;
    if stats.node_count == 0 {
        return None;
    }
    let strengths: Vec<f64> = network.links.iter().map(|l| l.strength).collect();
    let distinct_links: BTreeSet<(usize, usize, RelationshipKind)> = network
        .links
        .iter()
        .map(|l| (l.source, l.target, l.kind))
        .collect();

    Some(GraphOverview {
        node_count: stats.node_count,
        edge_count: stats.edge_count,
        diseases: stats.label(labels::DISEASE),
        body_systems: stats.label(labels::BODY_SYSTEM),
        patients: stats.label(labels::PATIENT),
        hub_diseases: stats.label(labels::HUB_DISEASE),
        disease_relationships: distinct_links.len(),
        system_interactions: network.interactions.len(),
        avg_relationship_strength: mean(&strengths).map(|m| round_to(m, 4)),
        label_counts: stats.label_counts.clone(),
        edge_type_counts: stats.edge_type_counts.clone(),
    })
}
