//! Critical progression pathways: two-step LEADS_TO chains and how urgently
//! they call for intervention

use super::network::DiseaseNetwork;
use super::stats::round_to;
use super::AnalyticsConfig;
use crate::model::RelationshipKind;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterventionUrgency {
    ImmediateIntervention,
    UrgentIntervention,
    PlannedIntervention,
    RoutineMonitoring,
}

impl InterventionUrgency {
    pub fn classify(compound_risk: f64, config: &AnalyticsConfig) -> Self {
        if compound_risk >= config.pathway_immediate {
            InterventionUrgency::ImmediateIntervention
        } else if compound_risk >= config.pathway_urgent {
            InterventionUrgency::UrgentIntervention
        } else if compound_risk >= config.pathway_planned {
            InterventionUrgency::PlannedIntervention
        } else {
            InterventionUrgency::RoutineMonitoring
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpreadPattern {
    /// One system holds all three diseases
    SameSystem,
    /// Some but not all steps stay within a shared system
    PartialSpread,
    MultiSystemSpread,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalPathway {
    pub start_disease: String,
    pub middle_disease: String,
    pub end_disease: String,
    pub first_strength: f64,
    pub second_strength: f64,
    pub compound_progression_risk: f64,
    pub intervention_urgency: InterventionUrgency,
    pub spread_pattern: SpreadPattern,
    pub systems: Vec<String>,
}

fn spread_pattern(network: &DiseaseNetwork, start: usize, middle: usize, end: usize) -> SpreadPattern {
    let common = network.diseases[start]
        .systems
        .iter()
        .any(|s| network.diseases[middle].systems.contains(s) && network.diseases[end].systems.contains(s));
    if common {
        SpreadPattern::SameSystem
    } else if network.shares_system(start, middle)
        || network.shares_system(middle, end)
        || network.shares_system(start, end)
    {
        SpreadPattern::PartialSpread
    } else {
        SpreadPattern::MultiSystemSpread
    }
}

pub fn critical_pathways(network: &DiseaseNetwork, config: &AnalyticsConfig) -> Vec<CriticalPathway> {
    let min = config.pathway_min_strength;
    let progresses = |kind: RelationshipKind, strength: f64| kind == RelationshipKind::LeadsTo && strength >= min;
    let mut pathways: Vec<(f64, CriticalPathway)> = Vec::new();

    for first in network.links.iter().filter(|l| progresses(l.kind, l.strength)) {
        let (start, middle) = (first.source, first.target);
        for second in network.outgoing(middle).filter(|l| progresses(l.kind, l.strength)) {
            let end = second.target;
            if end == start {
                continue;
            }
            let compound = first.strength * second.strength;

            let mut systems: Vec<usize> = [start, middle, end]
                .iter()
                .flat_map(|&d| network.diseases[d].systems.iter().copied())
                .collect();
            systems.sort_unstable();
            systems.dedup();

            pathways.push((
                compound,
                CriticalPathway {
                    start_disease: network.name(start).to_string(),
                    middle_disease: network.name(middle).to_string(),
                    end_disease: network.name(end).to_string(),
                    first_strength: round_to(first.strength, 4),
                    second_strength: round_to(second.strength, 4),
                    compound_progression_risk: round_to(compound, 4),
                    intervention_urgency: InterventionUrgency::classify(compound, config),
                    spread_pattern: spread_pattern(network, start, middle, end),
                    systems: systems.iter().map(|&s| network.system_name(s).to_string()).collect(),
                },
            ));
        }
    }

    pathways.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.start_disease.cmp(&b.1.start_disease))
            .then_with(|| a.1.end_disease.cmp(&b.1.end_disease))
    });
    pathways.into_iter().map(|(_, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample;
    use crate::graph::GraphStore;
    use crate::loader::load_reference_data;

    #[test]
    fn test_sample_cardiac_pathway() {
        let mut store = GraphStore::new();
        load_reference_data(&mut store, &sample::reference_dataset()).unwrap();
        let network = DiseaseNetwork::from_store(&store);

        let pathways = critical_pathways(&network, &AnalyticsConfig::default());
        assert_eq!(pathways.len(), 1);
        let p = &pathways[0];
        assert_eq!(p.start_disease, sample::CORONARY_HEART_DISEASE);
        assert_eq!(p.middle_disease, sample::MYOCARDIAL_INFARCTION);
        assert_eq!(p.end_disease, sample::HEART_FAILURE);
        // 0.65 * 0.70
        assert_eq!(p.compound_progression_risk, 0.455);
        assert_eq!(p.intervention_urgency, InterventionUrgency::UrgentIntervention);
        assert_eq!(p.spread_pattern, SpreadPattern::SameSystem);
    }

    #[test]
    fn test_urgency_ladder() {
        let config = AnalyticsConfig::default();
        assert_eq!(InterventionUrgency::classify(0.81, &config), InterventionUrgency::ImmediateIntervention);
        assert_eq!(InterventionUrgency::classify(0.64, &config), InterventionUrgency::ImmediateIntervention);
        assert_eq!(InterventionUrgency::classify(0.49, &config), InterventionUrgency::UrgentIntervention);
        assert_eq!(InterventionUrgency::classify(0.3, &config), InterventionUrgency::PlannedIntervention);
        assert_eq!(InterventionUrgency::classify(0.1, &config), InterventionUrgency::RoutineMonitoring);
    }
}
