//! Cluster discovery over strong co-occurrence chains

use super::network::DiseaseNetwork;
use super::stats::{mean, round_to};
use super::AnalyticsConfig;
use crate::model::RelationshipKind;
use rustc_hash::FxHashMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterType {
    /// Three diseases, endpoints linked directly
    Triangular,
    /// Four diseases, endpoints linked directly
    ExtendedTriangular,
    LinearChain,
    ExtendedChain,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseCluster {
    /// Members in chain order
    pub diseases: Vec<String>,
    pub cluster_size: usize,
    pub cluster_type: ClusterType,
    pub avg_cluster_strength: f64,
    pub stability_score: f64,
    pub systems: Vec<String>,
    pub system_count: usize,
}

struct Candidate {
    chain: Vec<usize>,
    cluster_type: ClusterType,
    avg: f64,
    stability: f64,
}

pub fn discover_clusters(network: &DiseaseNetwork, config: &AnalyticsConfig) -> Vec<DiseaseCluster> {
    let cow = RelationshipKind::CommonlyOccursWith;
    let min = config.cluster_min_strength;

    let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); network.diseases.len()];
    for link in network.links.iter().filter(|l| l.kind == cow && l.strength >= min) {
        if link.source == link.target {
            continue;
        }
        adjacency[link.source].push((link.target, link.strength));
        adjacency[link.target].push((link.source, link.strength));
    }

    // Keyed by sorted member set; mirrored and rotated chains collapse here
    let mut best: FxHashMap<Vec<usize>, Candidate> = FxHashMap::default();
    let mut offer = |chain: Vec<usize>, strengths: Vec<f64>| {
        let closure = network.link_between(chain[0], chain[chain.len() - 1], cow, min);
        let cluster_type = match (chain.len(), closure.is_some()) {
            (3, true) => ClusterType::Triangular,
            (_, true) => ClusterType::ExtendedTriangular,
            (3, false) => ClusterType::LinearChain,
            (_, false) => ClusterType::ExtendedChain,
        };
        let mut strengths = strengths;
        strengths.extend(closure);
        let Some(avg) = mean(&strengths) else {
            return;
        };
        if avg < config.cluster_min_avg_strength {
            return;
        }

        let mut systems: Vec<usize> = chain
            .iter()
            .flat_map(|&d| network.diseases[d].systems.iter().copied())
            .collect();
        systems.sort_unstable();
        systems.dedup();
        let topology = match cluster_type {
            ClusterType::Triangular => config.cluster_triangle_bonus,
            ClusterType::ExtendedTriangular => config.cluster_extended_bonus,
            _ => 1.0,
        };
        let diversity = 1.0 + config.cluster_diversity_bonus * systems.len().saturating_sub(1) as f64;
        let stability = avg * topology * diversity;

        let mut key = chain.clone();
        key.sort_unstable();
        let candidate = Candidate {
            chain,
            cluster_type,
            avg,
            stability,
        };
        match best.get(&key) {
            Some(existing) if existing.stability >= candidate.stability => {}
            _ => {
                best.insert(key, candidate);
            }
        }
    };

    for a in 0..adjacency.len() {
        for &(b, ab) in &adjacency[a] {
            for &(c, bc) in &adjacency[b] {
                if c == a {
                    continue;
                }
                offer(vec![a, b, c], vec![ab, bc]);

                if !config.cluster_four_node_chains {
                    continue;
                }
                for &(d, cd) in &adjacency[c] {
                    if d == a || d == b {
                        continue;
                    }
                    offer(vec![a, b, c, d], vec![ab, bc, cd]);
                }
            }
        }
    }

    let mut clusters: Vec<Candidate> = best.into_values().collect();
    clusters.sort_by(|x, y| {
        y.stability
            .total_cmp(&x.stability)
            .then_with(|| y.avg.total_cmp(&x.avg))
            .then_with(|| x.chain.cmp(&y.chain))
    });

    clusters
        .into_iter()
        .map(|c| {
            let mut systems: Vec<usize> = c
                .chain
                .iter()
                .flat_map(|&d| network.diseases[d].systems.iter().copied())
                .collect();
            systems.sort_unstable();
            systems.dedup();
            DiseaseCluster {
                diseases: c.chain.iter().map(|&d| network.name(d).to_string()).collect(),
                cluster_size: c.chain.len(),
                cluster_type: c.cluster_type,
                avg_cluster_strength: round_to(c.avg, 4),
                stability_score: round_to(c.stability, 4),
                system_count: systems.len(),
                systems: systems.iter().map(|&s| network.system_name(s).to_string()).collect(),
            }
        })
        .collect()
}
