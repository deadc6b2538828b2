//! Thresholds and constants of the analytical catalogue

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A threshold or multiplier that `AnalyticsConfig::validate` refuses
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("{name} must lie in [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },

    #[error("{name} thresholds must be descending")]
    NotDescending { name: &'static str },

    #[error("{name} must be a non-negative number, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("multimorbidity factors must not decrease")]
    DecreasingFactor,
}

/// Every tunable number the analyses use. None of the defaults is a
/// clinically validated constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    // Disease burden hotspots
    pub hotspot_min_connections: usize,
    pub hotspot_critical: f64,
    pub hotspot_major: f64,
    pub hotspot_moderate: f64,
    /// z-score of the strength confidence interval
    pub ci_z_score: f64,

    // Cross-system cascades
    pub cascade_min_strength: f64,
    pub cascade_min_origins: usize,
    pub cascade_third_hop: bool,

    // Complex multimorbidity
    pub complex_min_diseases: usize,
    pub complex_min_systems: usize,
    pub predicted_risk_min_strength: f64,
    pub predicted_risk_limit: usize,

    // Critical pathways
    pub pathway_min_strength: f64,
    pub pathway_immediate: f64,
    pub pathway_urgent: f64,
    pub pathway_planned: f64,

    // System vulnerability
    pub vulnerability_min_strength: f64,
    pub burden_critical: f64,
    pub burden_high: f64,
    pub burden_moderate: f64,
    pub connectivity_hub: usize,
    pub connectivity_moderate: usize,
    pub connectivity_minimal: usize,

    // Precision risk
    pub precision_min_strength: f64,
    pub precision_min_mean: f64,
    pub precision_min_evidence: usize,
    pub risk_high: f64,
    pub risk_moderate: f64,
    pub risk_low: f64,
    pub confidence_high: f64,
    pub confidence_moderate: f64,
    pub consistency_epsilon: f64,

    // Cluster discovery
    pub cluster_min_strength: f64,
    pub cluster_min_avg_strength: f64,
    pub cluster_four_node_chains: bool,
    pub cluster_triangle_bonus: f64,
    pub cluster_extended_bonus: f64,
    pub cluster_diversity_bonus: f64,

    pub resources: ResourceConfig,

    // Demonstration queries
    pub hub_ranking_limit: usize,
    pub strong_pattern_threshold: f64,
    pub strong_pattern_limit: usize,
    pub cross_system_limit: usize,
    pub progression_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            hotspot_min_connections: 3,
            hotspot_critical: 5.0,
            hotspot_major: 3.0,
            hotspot_moderate: 2.0,
            ci_z_score: 1.96,

            cascade_min_strength: 0.5,
            cascade_min_origins: 2,
            cascade_third_hop: true,

            complex_min_diseases: 3,
            complex_min_systems: 3,
            predicted_risk_min_strength: 0.6,
            predicted_risk_limit: 3,

            pathway_min_strength: 0.6,
            pathway_immediate: 0.64,
            pathway_urgent: 0.36,
            pathway_planned: 0.25,

            vulnerability_min_strength: 0.5,
            burden_critical: 40.0,
            burden_high: 25.0,
            burden_moderate: 15.0,
            connectivity_hub: 12,
            connectivity_moderate: 6,
            connectivity_minimal: 2,

            precision_min_strength: 0.4,
            precision_min_mean: 0.3,
            precision_min_evidence: 1,
            risk_high: 0.8,
            risk_moderate: 0.6,
            risk_low: 0.4,
            confidence_high: 0.8,
            confidence_moderate: 0.6,
            consistency_epsilon: 1e-6,

            cluster_min_strength: 0.6,
            cluster_min_avg_strength: 0.65,
            cluster_four_node_chains: true,
            cluster_triangle_bonus: 1.5,
            cluster_extended_bonus: 1.25,
            cluster_diversity_bonus: 0.1,

            resources: ResourceConfig::default(),

            hub_ranking_limit: 5,
            strong_pattern_threshold: 0.7,
            strong_pattern_limit: 5,
            cross_system_limit: 5,
            progression_limit: 3,
        }
    }
}

/// Per-patient resource model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub high_weight: f64,
    pub moderate_weight: f64,
    pub low_weight: f64,
    pub interaction_min_strength: f64,
    pub interaction_coefficient: f64,
    /// Multimorbidity factor at 3, 4 and 5 conditions
    pub factor_three: f64,
    pub factor_four: f64,
    pub factor_five: f64,
    /// Above five conditions the factor is `base^(n - 2)`
    pub factor_exponential_base: f64,
    pub gp_visits_per_point: f64,
    pub specialist_referrals_per_point: f64,
    pub hospitalizations_per_point: f64,
    pub cost_per_point: f64,
    pub cost_per_specialist_referral: f64,
    pub tier_very_high: f64,
    pub tier_high: f64,
    pub tier_moderate: f64,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            high_weight: 4.0,
            moderate_weight: 2.0,
            low_weight: 1.0,
            interaction_min_strength: 0.5,
            interaction_coefficient: 0.5,
            factor_three: 1.2,
            factor_four: 1.5,
            factor_five: 1.8,
            factor_exponential_base: 1.4,
            gp_visits_per_point: 1.5,
            specialist_referrals_per_point: 0.5,
            hospitalizations_per_point: 0.1,
            cost_per_point: 250.0,
            cost_per_specialist_referral: 150.0,
            tier_very_high: 20.0,
            tier_high: 10.0,
            tier_moderate: 5.0,
        }
    }
}

impl ResourceConfig {
    /// Step function of the condition count, non-decreasing
    pub fn multimorbidity_factor(&self, conditions: usize) -> f64 {
        match conditions {
            0..=2 => 1.0,
            3 => self.factor_three,
            4 => self.factor_four,
            5 => self.factor_five,
            n => self.factor_exponential_base.powi(n as i32 - 2),
        }
    }
}

impl AnalyticsConfig {
    /// Reject values that would make a classification unreachable or a
    /// score negative
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let strengths = [
            ("cascade_min_strength", self.cascade_min_strength),
            ("predicted_risk_min_strength", self.predicted_risk_min_strength),
            ("pathway_min_strength", self.pathway_min_strength),
            ("vulnerability_min_strength", self.vulnerability_min_strength),
            ("precision_min_strength", self.precision_min_strength),
            ("cluster_min_strength", self.cluster_min_strength),
            ("cluster_min_avg_strength", self.cluster_min_avg_strength),
            ("strong_pattern_threshold", self.strong_pattern_threshold),
            ("resources.interaction_min_strength", self.resources.interaction_min_strength),
        ];
        for (name, value) in strengths {
            if !(0.0..=1.0).contains(&value) {
                return Err(ThresholdError::OutOfUnitRange { name, value });
            }
        }

        let ladders = [
            ("hotspot", [self.hotspot_critical, self.hotspot_major, self.hotspot_moderate]),
            ("pathway", [self.pathway_immediate, self.pathway_urgent, self.pathway_planned]),
            ("burden", [self.burden_critical, self.burden_high, self.burden_moderate]),
            ("risk", [self.risk_high, self.risk_moderate, self.risk_low]),
            (
                "resource tier",
                [self.resources.tier_very_high, self.resources.tier_high, self.resources.tier_moderate],
            ),
        ];
        for (name, steps) in ladders {
            if steps.windows(2).any(|w| w[0] < w[1]) {
                return Err(ThresholdError::NotDescending { name });
            }
        }
        if self.connectivity_hub < self.connectivity_moderate
            || self.connectivity_moderate < self.connectivity_minimal
        {
            return Err(ThresholdError::NotDescending { name: "connectivity" });
        }
        if self.confidence_high < self.confidence_moderate {
            return Err(ThresholdError::NotDescending { name: "confidence" });
        }

        let r = &self.resources;
        let multipliers = [
            ("high_weight", r.high_weight),
            ("moderate_weight", r.moderate_weight),
            ("low_weight", r.low_weight),
            ("interaction_coefficient", r.interaction_coefficient),
            ("gp_visits_per_point", r.gp_visits_per_point),
            ("specialist_referrals_per_point", r.specialist_referrals_per_point),
            ("hospitalizations_per_point", r.hospitalizations_per_point),
            ("cost_per_point", r.cost_per_point),
            ("cost_per_specialist_referral", r.cost_per_specialist_referral),
            ("ci_z_score", self.ci_z_score),
        ];
        for (name, value) in multipliers {
            if !value.is_finite() || value < 0.0 {
                return Err(ThresholdError::Negative { name, value });
            }
        }
        let factors = [1.0, r.factor_three, r.factor_four, r.factor_five];
        if factors.windows(2).any(|w| w[0] > w[1]) || r.factor_exponential_base < 1.0 {
            return Err(ThresholdError::DecreasingFactor);
        }
        Ok(())
    }
}
