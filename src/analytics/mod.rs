//! Analytical query library
//!
//! A fixed catalogue of read-only analyses over the disease graph. The
//! [`AnalyticsEngine`] projects the store once into a [`DiseaseNetwork`] and
//! every analysis runs over that projection, so analyses never take the
//! store lock and are safe to evaluate concurrently.
//!
//! Each analysis has a typed entry point returning its own result structs and
//! a row-oriented form ([`ResultSet`]) selected through [`AnalysisKind`].

pub mod cascade;
pub mod clusters;
pub mod config;
pub mod hotspots;
pub mod multimorbidity;
pub mod network;
pub mod overview;
pub mod pathways;
pub mod resources;
pub mod result;
pub mod risk;
pub mod stats;
pub mod vulnerability;

pub use cascade::SystemCascade;
pub use clusters::{ClusterType, DiseaseCluster};
pub use config::{AnalyticsConfig, ResourceConfig, ThresholdError};
pub use hotspots::{DiseaseHotspot, HubStatus};
pub use multimorbidity::{PatientProfile, PredictedRisk};
pub use network::DiseaseNetwork;
pub use overview::{
    CrossSystemInteraction, GraphOverview, HubRanking, PatientConditions, RelationshipPattern,
};
pub use pathways::{CriticalPathway, InterventionUrgency, SpreadPattern};
pub use resources::{ResourceBurden, ResourceTier};
pub use result::{ResultSet, Row};
pub use risk::{ConfidenceLevel, RiskCategory, RiskPrediction};
pub use vulnerability::{BurdenLevel, ConnectivityLevel, SystemVulnerability};

use crate::graph::GraphStore;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Result item is not a record: {0}")]
    NotARecord(String),

    #[error("Unknown analysis: {0}")]
    UnknownAnalysis(String),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Every analysis the engine can run by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    DiseaseHotspots,
    CrossSystemCascades,
    ComplexMultimorbidity,
    CriticalPathways,
    SystemVulnerability,
    PrecisionRisk,
    ClusterDiscovery,
    ResourceBurden,
    HubRanking,
    StrongestPatterns,
    CrossSystemInteractions,
    ProgressionInsights,
    PatientConditions,
    GraphOverview,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 14] = [
        AnalysisKind::DiseaseHotspots,
        AnalysisKind::CrossSystemCascades,
        AnalysisKind::ComplexMultimorbidity,
        AnalysisKind::CriticalPathways,
        AnalysisKind::SystemVulnerability,
        AnalysisKind::PrecisionRisk,
        AnalysisKind::ClusterDiscovery,
        AnalysisKind::ResourceBurden,
        AnalysisKind::HubRanking,
        AnalysisKind::StrongestPatterns,
        AnalysisKind::CrossSystemInteractions,
        AnalysisKind::ProgressionInsights,
        AnalysisKind::PatientConditions,
        AnalysisKind::GraphOverview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::DiseaseHotspots => "disease_hotspots",
            AnalysisKind::CrossSystemCascades => "cross_system_cascades",
            AnalysisKind::ComplexMultimorbidity => "complex_multimorbidity",
            AnalysisKind::CriticalPathways => "critical_pathways",
            AnalysisKind::SystemVulnerability => "system_vulnerability",
            AnalysisKind::PrecisionRisk => "precision_risk",
            AnalysisKind::ClusterDiscovery => "cluster_discovery",
            AnalysisKind::ResourceBurden => "resource_burden",
            AnalysisKind::HubRanking => "hub_ranking",
            AnalysisKind::StrongestPatterns => "strongest_patterns",
            AnalysisKind::CrossSystemInteractions => "cross_system_interactions",
            AnalysisKind::ProgressionInsights => "progression_insights",
            AnalysisKind::PatientConditions => "patient_conditions",
            AnalysisKind::GraphOverview => "graph_overview",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AnalyticsError::UnknownAnalysis(s.to_string()))
    }
}

/// Runs the catalogue over a projection of the store taken at construction
pub struct AnalyticsEngine {
    network: DiseaseNetwork,
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    pub fn new(store: &GraphStore, config: &AnalyticsConfig) -> Self {
        let network = DiseaseNetwork::from_store(store);
        debug!(
            "Projected {} diseases, {} links, {} patients",
            network.diseases.len(),
            network.links.len(),
            network.patients.len()
        );
        Self::from_network(network, config)
    }

    pub fn from_network(network: DiseaseNetwork, config: &AnalyticsConfig) -> Self {
        Self {
            network,
            config: config.clone(),
        }
    }

    pub fn network(&self) -> &DiseaseNetwork {
        &self.network
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn disease_hotspots(&self) -> Vec<DiseaseHotspot> {
        hotspots::disease_hotspots(&self.network, &self.config)
    }

    pub fn cross_system_cascades(&self) -> Vec<SystemCascade> {
        cascade::cross_system_cascades(&self.network, &self.config)
    }

    pub fn complex_multimorbidity(&self) -> Vec<PatientProfile> {
        multimorbidity::complex_multimorbidity(&self.network, &self.config)
    }

    pub fn patient_profiles(&self) -> Vec<PatientProfile> {
        multimorbidity::patient_profiles(&self.network, &self.config)
    }

    pub fn critical_pathways(&self) -> Vec<CriticalPathway> {
        pathways::critical_pathways(&self.network, &self.config)
    }

    pub fn system_vulnerability(&self) -> Vec<SystemVulnerability> {
        vulnerability::system_vulnerability(&self.network, &self.config)
    }

    pub fn precision_risk(&self) -> Vec<RiskPrediction> {
        risk::precision_risk(&self.network, &self.config)
    }

    pub fn discover_clusters(&self) -> Vec<DiseaseCluster> {
        clusters::discover_clusters(&self.network, &self.config)
    }

    pub fn resource_burden(&self) -> Vec<ResourceBurden> {
        resources::resource_burden(&self.network, &self.config)
    }

    pub fn hub_ranking(&self) -> Vec<HubRanking> {
        overview::hub_ranking(&self.network, &self.config)
    }

    pub fn strongest_patterns(&self) -> Vec<RelationshipPattern> {
        overview::strongest_patterns(&self.network, &self.config)
    }

    pub fn cross_system_interactions(&self) -> Vec<CrossSystemInteraction> {
        overview::cross_system_interactions(&self.network, &self.config)
    }

    pub fn progression_insights(&self) -> Vec<RelationshipPattern> {
        overview::progression_insights(&self.network, &self.config)
    }

    pub fn patient_conditions(&self) -> Vec<PatientConditions> {
        overview::patient_conditions(&self.network)
    }

    pub fn graph_overview(&self) -> Option<GraphOverview> {
        overview::graph_overview(&self.network)
    }

    /// Run one analysis and flatten its results into rows
    pub fn run(&self, kind: AnalysisKind) -> AnalyticsResult<ResultSet> {
        let rows = match kind {
            AnalysisKind::DiseaseHotspots => ResultSet::from_items(&self.disease_hotspots()),
            AnalysisKind::CrossSystemCascades => ResultSet::from_items(&self.cross_system_cascades()),
            AnalysisKind::ComplexMultimorbidity => ResultSet::from_items(&self.complex_multimorbidity()),
            AnalysisKind::CriticalPathways => ResultSet::from_items(&self.critical_pathways()),
            AnalysisKind::SystemVulnerability => ResultSet::from_items(&self.system_vulnerability()),
            AnalysisKind::PrecisionRisk => ResultSet::from_items(&self.precision_risk()),
            AnalysisKind::ClusterDiscovery => ResultSet::from_items(&self.discover_clusters()),
            AnalysisKind::ResourceBurden => ResultSet::from_items(&self.resource_burden()),
            AnalysisKind::HubRanking => ResultSet::from_items(&self.hub_ranking()),
            AnalysisKind::StrongestPatterns => ResultSet::from_items(&self.strongest_patterns()),
            AnalysisKind::CrossSystemInteractions => ResultSet::from_items(&self.cross_system_interactions()),
            AnalysisKind::ProgressionInsights => ResultSet::from_items(&self.progression_insights()),
            AnalysisKind::PatientConditions => ResultSet::from_items(&self.patient_conditions()),
            AnalysisKind::GraphOverview => {
                let overview: Vec<GraphOverview> = self.graph_overview().into_iter().collect();
                ResultSet::from_items(&overview)
            }
        }?;
        debug!("{} produced {} rows", kind, rows.len());
        Ok(rows)
    }

    /// Evaluate the whole catalogue in parallel, in catalogue order
    pub fn run_all(&self) -> AnalyticsResult<Vec<(AnalysisKind, ResultSet)>> {
        let results = AnalysisKind::ALL
            .par_iter()
            .map(|&kind| self.run(kind).map(|rows| (kind, rows)))
            .collect::<AnalyticsResult<Vec<_>>>()?;
        info!(
            "Evaluated {} analyses over {} diseases",
            results.len(),
            self.network.diseases.len()
        );
        Ok(results)
    }
}
