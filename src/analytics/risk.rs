//! Precision risk: per patient, the not-yet-held diseases their current
//! conditions point at, scored by strength and weight of evidence

use super::network::{DiseaseNetwork, PatientInfo};
use super::stats::{mean, round_to, sample_stdev};
use super::AnalyticsConfig;
use crate::model::RelationshipKind;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskCategory {
    HighRisk,
    ModerateRisk,
    LowRisk,
    MinimalRisk,
}

impl RiskCategory {
    pub fn classify(weighted_score: f64, config: &AnalyticsConfig) -> Self {
        if weighted_score >= config.risk_high {
            RiskCategory::HighRisk
        } else if weighted_score >= config.risk_moderate {
            RiskCategory::ModerateRisk
        } else if weighted_score >= config.risk_low {
            RiskCategory::LowRisk
        } else {
            RiskCategory::MinimalRisk
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    HighConfidence,
    ModerateConfidence,
    LowConfidence,
}

impl ConfidenceLevel {
    pub fn classify(consistency: f64, config: &AnalyticsConfig) -> Self {
        if consistency >= config.confidence_high {
            ConfidenceLevel::HighConfidence
        } else if consistency >= config.confidence_moderate {
            ConfidenceLevel::ModerateConfidence
        } else {
            ConfidenceLevel::LowConfidence
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskPrediction {
    pub patient_id: String,
    pub candidate_disease: String,
    pub evidence_count: usize,
    pub mean_strength: f64,
    /// Zero for a single piece of evidence
    pub strength_stdev: f64,
    /// `mean * (1 + ln(evidence_count))`
    pub weighted_score: f64,
    /// `1 - stdev / (mean + epsilon)`
    pub consistency_score: f64,
    pub risk_category: RiskCategory,
    pub confidence_level: ConfidenceLevel,
    pub supporting_conditions: Vec<String>,
}

pub fn precision_risk(network: &DiseaseNetwork, config: &AnalyticsConfig) -> Vec<RiskPrediction> {
    network
        .patients
        .iter()
        .flat_map(|patient| patient_risks(network, patient, config))
        .collect()
}

fn patient_risks(network: &DiseaseNetwork, patient: &PatientInfo, config: &AnalyticsConfig) -> Vec<RiskPrediction> {
    let held = &patient.conditions;
    // candidate -> (strengths, supporting held diseases)
    let mut evidence: BTreeMap<usize, (Vec<f64>, Vec<usize>)> = BTreeMap::new();
    for &from in held {
        for (candidate, link) in network.neighbours(from, &RelationshipKind::ALL, config.precision_min_strength) {
            if held.contains(&candidate) {
                continue;
            }
            let entry = evidence.entry(candidate).or_default();
            entry.0.push(link.strength);
            if !entry.1.contains(&from) {
                entry.1.push(from);
            }
        }
    }

    let mut scored: Vec<(f64, RiskPrediction)> = Vec::new();
    for (candidate, (strengths, supporters)) in evidence {
        let n = strengths.len();
        let Some(avg) = mean(&strengths) else {
            continue;
        };
        if avg < config.precision_min_mean || n < config.precision_min_evidence {
            continue;
        }
        let sd = sample_stdev(&strengths).unwrap_or(0.0);
        let weighted = avg * (1.0 + (n as f64).ln());
        let consistency = 1.0 - sd / (avg + config.consistency_epsilon);

        scored.push((
            weighted,
            RiskPrediction {
                patient_id: patient.id.clone(),
                candidate_disease: network.name(candidate).to_string(),
                evidence_count: n,
                mean_strength: round_to(avg, 4),
                strength_stdev: round_to(sd, 4),
                weighted_score: round_to(weighted, 4),
                consistency_score: round_to(consistency, 4),
                risk_category: RiskCategory::classify(weighted, config),
                confidence_level: ConfidenceLevel::classify(consistency, config),
                supporting_conditions: supporters.iter().map(|&d| network.name(d).to_string()).collect(),
            },
        ));
    }

    scored.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.candidate_disease.cmp(&b.1.candidate_disease))
    });
    scored.into_iter().map(|(_, r)| r).collect()
}
