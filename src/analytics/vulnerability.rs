//! System vulnerability matrix: per-system burden and how strongly each
//! system exchanges weighted links with the rest of the network

use super::network::DiseaseNetwork;
use super::stats::{mean, round_to};
use super::AnalyticsConfig;
use crate::derived::SystemBurden;
use crate::model::Complexity;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BurdenLevel {
    Critical,
    High,
    Moderate,
    Low,
}

impl BurdenLevel {
    pub fn classify(score: f64, config: &AnalyticsConfig) -> Self {
        if score >= config.burden_critical {
            BurdenLevel::Critical
        } else if score >= config.burden_high {
            BurdenLevel::High
        } else if score >= config.burden_moderate {
            BurdenLevel::Moderate
        } else {
            BurdenLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectivityLevel {
    Hub,
    Moderate,
    Minimal,
    Isolated,
}

impl ConnectivityLevel {
    pub fn classify(total_edges: usize, config: &AnalyticsConfig) -> Self {
        if total_edges >= config.connectivity_hub {
            ConnectivityLevel::Hub
        } else if total_edges >= config.connectivity_moderate {
            ConnectivityLevel::Moderate
        } else if total_edges >= config.connectivity_minimal {
            ConnectivityLevel::Minimal
        } else {
            ConnectivityLevel::Isolated
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemVulnerability {
    pub system: String,
    pub disease_burden: usize,
    pub high_complexity: usize,
    pub system_burden_score: f64,
    pub outgoing_connections: usize,
    pub avg_outgoing_strength: Option<f64>,
    pub incoming_connections: usize,
    pub avg_incoming_strength: Option<f64>,
    pub network_influence_score: f64,
    pub burden_level: BurdenLevel,
    pub connectivity_level: ConnectivityLevel,
}

pub fn system_vulnerability(network: &DiseaseNetwork, config: &AnalyticsConfig) -> Vec<SystemVulnerability> {
    let members = network.diseases_by_system();
    let mut matrix: Vec<(f64, f64, SystemVulnerability)> = Vec::with_capacity(network.systems.len());

    for (system, diseases) in members.iter().enumerate() {
        let mut burden = SystemBurden {
            system: network.system_name(system).to_string(),
            disease_count: diseases.len(),
            high_complexity: 0,
            moderate_complexity: 0,
            low_complexity: 0,
        };
        for &d in diseases {
            match network.diseases[d].complexity {
                Some(Complexity::High) => burden.high_complexity += 1,
                Some(Complexity::Moderate) => burden.moderate_complexity += 1,
                Some(Complexity::Low) => burden.low_complexity += 1,
                None => {}
            }
        }

        let inside = |d: usize| network.diseases[d].systems.contains(&system);
        let mut outgoing = Vec::new();
        let mut incoming = Vec::new();
        for link in network
            .links
            .iter()
            .filter(|l| l.strength >= config.vulnerability_min_strength)
        {
            match (inside(link.source), inside(link.target)) {
                (true, false) => outgoing.push(link.strength),
                (false, true) => incoming.push(link.strength),
                _ => {}
            }
        }

        let avg_out = mean(&outgoing);
        let avg_in = mean(&incoming);
        let influence = outgoing.len() as f64 * avg_out.unwrap_or(0.0)
            + incoming.len() as f64 * avg_in.unwrap_or(0.0);
        let score = burden.score();

        matrix.push((
            score,
            influence,
            SystemVulnerability {
                system: burden.system.clone(),
                disease_burden: burden.disease_count,
                high_complexity: burden.high_complexity,
                system_burden_score: round_to(score, 4),
                outgoing_connections: outgoing.len(),
                avg_outgoing_strength: avg_out.map(|v| round_to(v, 4)),
                incoming_connections: incoming.len(),
                avg_incoming_strength: avg_in.map(|v| round_to(v, 4)),
                network_influence_score: round_to(influence, 4),
                burden_level: BurdenLevel::classify(score, config),
                connectivity_level: ConnectivityLevel::classify(outgoing.len() + incoming.len(), config),
            },
        ));
    }

    matrix.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| b.1.total_cmp(&a.1))
            .then_with(|| a.2.system.cmp(&b.2.system))
    });
    matrix.into_iter().map(|(_, _, v)| v).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample;
    use crate::graph::GraphStore;
    use crate::loader::load_reference_data;

    fn sample_matrix() -> Vec<SystemVulnerability> {
        let mut store = GraphStore::new();
        load_reference_data(&mut store, &sample::reference_dataset()).unwrap();
        system_vulnerability(&DiseaseNetwork::from_store(&store), &AnalyticsConfig::default())
    }

    fn row<'a>(matrix: &'a [SystemVulnerability], name: &str) -> &'a SystemVulnerability {
        matrix.iter().find(|v| v.system == name).unwrap()
    }

    #[test]
    fn test_every_system_reported() {
        let matrix = sample_matrix();
        assert_eq!(matrix.len(), 15);
        let ear = row(&matrix, sample::EAR);
        assert_eq!(ear.disease_burden, 0);
        assert_eq!(ear.avg_outgoing_strength, None);
        assert_eq!(ear.connectivity_level, ConnectivityLevel::Isolated);
    }

    #[test]
    fn test_endocrine_influence() {
        let matrix = sample_matrix();
        let endocrine = row(&matrix, sample::ENDOCRINE);
        // T2DM x4, T1DM and Obesity each leave the system once
        assert_eq!(endocrine.outgoing_connections, 6);
        assert_eq!(endocrine.incoming_connections, 0);
        assert_eq!(endocrine.network_influence_score, 4.55);
        assert_eq!(endocrine.connectivity_level, ConnectivityLevel::Moderate);
    }

    #[test]
    fn test_circulatory_burden() {
        let matrix = sample_matrix();
        let circulatory = row(&matrix, sample::CIRCULATORY);
        // 5 diseases, 3 high, 2 moderate
        assert_eq!(circulatory.system_burden_score, 13.0);
        assert_eq!(circulatory.burden_level, BurdenLevel::Low);
        // COPD -> Heart failure falls under the 0.5 threshold
        assert_eq!(circulatory.incoming_connections, 3);
        assert_eq!(circulatory.outgoing_connections, 0);
        assert_eq!(circulatory.connectivity_level, ConnectivityLevel::Minimal);
    }

    #[test]
    fn test_burden_ladder() {
        let config = AnalyticsConfig::default();
        assert_eq!(BurdenLevel::classify(40.0, &config), BurdenLevel::Critical);
        assert_eq!(BurdenLevel::classify(30.0, &config), BurdenLevel::High);
        assert_eq!(BurdenLevel::classify(15.0, &config), BurdenLevel::Moderate);
        assert_eq!(BurdenLevel::classify(14.9, &config), BurdenLevel::Low);
    }
}
