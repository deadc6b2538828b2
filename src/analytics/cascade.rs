//! Cross-system cascades: progression and co-occurrence chains that leave
//! the body system they start in

use super::network::DiseaseNetwork;
use super::stats::{mean, round_to};
use super::AnalyticsConfig;
use crate::model::RelationshipKind;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const CASCADE_KINDS: [RelationshipKind; 2] = [RelationshipKind::LeadsTo, RelationshipKind::CommonlyOccursWith];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemCascade {
    pub origin_system: String,
    pub intermediate_system: String,
    /// Present for three-system cascades
    pub terminal_system: Option<String>,
    /// Distinct diseases the cascade starts from
    pub origin_diseases: usize,
    pub cascade_count: usize,
    pub avg_strength: f64,
    pub cascade_paths: Vec<String>,
}

#[derive(Default)]
struct Aggregate {
    origins: BTreeSet<usize>,
    path_strengths: Vec<f64>,
    paths: Vec<String>,
}

type CascadeKey = (usize, usize, Option<usize>);

pub fn cross_system_cascades(network: &DiseaseNetwork, config: &AnalyticsConfig) -> Vec<SystemCascade> {
    let min = config.cascade_min_strength;
    let qualifies = |kind: RelationshipKind, strength: f64| CASCADE_KINDS.contains(&kind) && strength >= min;
    let mut aggregates: BTreeMap<CascadeKey, Aggregate> = BTreeMap::new();

    for first in network.links.iter().filter(|l| qualifies(l.kind, l.strength)) {
        let (d1, d2) = (first.source, first.target);
        for &s1 in &network.diseases[d1].systems {
            for &s2 in network.diseases[d2].systems.iter().filter(|&&s| s != s1) {
                let agg = aggregates.entry((s1, s2, None)).or_default();
                agg.origins.insert(d1);
                agg.path_strengths.push(first.strength);
                agg.paths.push(format!("{} -> {}", network.name(d1), network.name(d2)));

                if !config.cascade_third_hop {
                    continue;
                }
                for second in network.outgoing(d2).filter(|l| qualifies(l.kind, l.strength)) {
                    let d3 = second.target;
                    if d3 == d1 {
                        continue;
                    }
                    for &s3 in network.diseases[d3]
                        .systems
                        .iter()
                        .filter(|&&s| s != s1 && s != s2)
                    {
                        let agg = aggregates.entry((s1, s2, Some(s3))).or_default();
                        agg.origins.insert(d1);
                        agg.path_strengths.push((first.strength + second.strength) / 2.0);
                        agg.paths.push(format!(
                            "{} -> {} -> {}",
                            network.name(d1),
                            network.name(d2),
                            network.name(d3)
                        ));
                    }
                }
            }
        }
    }

    let mut cascades: Vec<SystemCascade> = aggregates
        .into_iter()
        .filter(|(_, agg)| agg.origins.len() >= config.cascade_min_origins)
        .filter_map(|((s1, s2, s3), agg)| {
            let avg = mean(&agg.path_strengths)?;
            Some(SystemCascade {
                origin_system: network.system_name(s1).to_string(),
                intermediate_system: network.system_name(s2).to_string(),
                terminal_system: s3.map(|s| network.system_name(s).to_string()),
                origin_diseases: agg.origins.len(),
                cascade_count: agg.paths.len(),
                avg_strength: round_to(avg, 4),
                cascade_paths: agg.paths,
            })
        })
        .collect();

    cascades.sort_by(|a, b| {
        b.origin_diseases
            .cmp(&a.origin_diseases)
            .then_with(|| b.avg_strength.total_cmp(&a.avg_strength))
            .then_with(|| a.origin_system.cmp(&b.origin_system))
            .then_with(|| a.intermediate_system.cmp(&b.intermediate_system))
    });
    cascades
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample;
    use crate::graph::GraphStore;
    use crate::loader::load_reference_data;

    #[test]
    fn test_sample_neuropathy_cascade() {
        let mut store = GraphStore::new();
        load_reference_data(&mut store, &sample::reference_dataset()).unwrap();
        let network = DiseaseNetwork::from_store(&store);

        let cascades = cross_system_cascades(&network, &AnalyticsConfig::default());
        let neuropathy = cascades
            .iter()
            .find(|c| c.origin_system == sample::ENDOCRINE && c.intermediate_system == sample::NERVOUS)
            .unwrap();
        // T2DM and T1DM both lead to diabetic neuropathy
        assert_eq!(neuropathy.origin_diseases, 2);
        assert_eq!(neuropathy.terminal_system, None);
        assert_eq!(neuropathy.avg_strength, 0.825);
        assert!(cascades.iter().all(|c| c.origin_diseases >= 2));
    }

    #[test]
    fn test_empty_network() {
        let network = DiseaseNetwork::default();
        assert!(cross_system_cascades(&network, &AnalyticsConfig::default()).is_empty());
    }
}
