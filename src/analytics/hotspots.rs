//! Disease burden hotspots: the most central diseases by weighted degree

use super::network::DiseaseNetwork;
use super::stats::{ci_half_width, mean, round_to, sample_stdev};
use super::AnalyticsConfig;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HubStatus {
    Critical,
    Major,
    Moderate,
    Minor,
}

impl HubStatus {
    fn classify(centrality: f64, config: &AnalyticsConfig) -> Self {
        if centrality >= config.hotspot_critical {
            HubStatus::Critical
        } else if centrality >= config.hotspot_major {
            HubStatus::Major
        } else if centrality >= config.hotspot_moderate {
            HubStatus::Moderate
        } else {
            HubStatus::Minor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseHotspot {
    pub disease: String,
    pub systems: Vec<String>,
    pub connection_count: usize,
    pub avg_strength: f64,
    pub strength_stdev: Option<f64>,
    /// `connection_count * avg_strength`
    pub centrality_score: f64,
    /// Bounds of the strength confidence interval; absent below two samples
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
    pub hub_status: HubStatus,
}

pub fn disease_hotspots(network: &DiseaseNetwork, config: &AnalyticsConfig) -> Vec<DiseaseHotspot> {
    let mut hotspots: Vec<(f64, DiseaseHotspot)> = Vec::new();

    for disease in 0..network.diseases.len() {
        let strengths: Vec<f64> = network.incident(disease).map(|l| l.strength).collect();
        if strengths.len() < config.hotspot_min_connections {
            continue;
        }
        let Some(avg) = mean(&strengths) else {
            continue;
        };
        let n = strengths.len();
        let centrality = n as f64 * avg;
        let half_width = ci_half_width(&strengths, config.ci_z_score);

        hotspots.push((
            centrality,
            DiseaseHotspot {
                disease: network.name(disease).to_string(),
                systems: network.system_names(disease),
                connection_count: n,
                avg_strength: round_to(avg, 4),
                strength_stdev: sample_stdev(&strengths).map(|sd| round_to(sd, 4)),
                centrality_score: round_to(centrality, 4),
                ci_lower: half_width.map(|h| round_to(avg - h, 4)),
                ci_upper: half_width.map(|h| round_to(avg + h, 4)),
                hub_status: HubStatus::classify(centrality, config),
            },
        ));
    }

    hotspots.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.disease.cmp(&b.1.disease)));
    hotspots.into_iter().map(|(_, h)| h).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample;
    use crate::graph::GraphStore;
    use crate::loader::load_reference_data;

    fn sample_hotspots(config: &AnalyticsConfig) -> Vec<DiseaseHotspot> {
        let mut store = GraphStore::new();
        load_reference_data(&mut store, &sample::reference_dataset()).unwrap();
        disease_hotspots(&DiseaseNetwork::from_store(&store), config)
    }

    #[test]
    fn test_t2dm_is_top_hotspot() {
        let hotspots = sample_hotspots(&AnalyticsConfig::default());
        let top = &hotspots[0];
        assert_eq!(top.disease, sample::T2DM);
        assert_eq!(top.connection_count, 6);
        // 0.85 + 0.65 + 0.75 + 0.70 + 0.90 + 0.75 = 4.6
        assert_eq!(top.centrality_score, 4.6);
        assert_eq!(top.hub_status, HubStatus::Major);
        assert!(top.ci_lower.unwrap() < top.avg_strength);
        assert!(top.ci_upper.unwrap() > top.avg_strength);
    }

    #[test]
    fn test_prefilter_excludes_sparse_diseases() {
        let hotspots = sample_hotspots(&AnalyticsConfig::default());
        assert!(hotspots.iter().all(|h| h.connection_count >= 3));
        assert!(!hotspots.iter().any(|h| h.disease == sample::ASTHMA));
    }

    #[test]
    fn test_single_connection_has_no_interval() {
        let config = AnalyticsConfig {
            hotspot_min_connections: 1,
            ..Default::default()
        };
        let hotspots = sample_hotspots(&config);
        let lupus = hotspots
            .iter()
            .find(|h| h.disease == sample::LUPUS)
            .unwrap();
        assert_eq!(lupus.connection_count, 1);
        assert_eq!(lupus.strength_stdev, None);
        assert_eq!(lupus.ci_lower, None);
        assert_eq!(lupus.hub_status, HubStatus::Minor);
    }
}
