//! Resource burden model: per-patient care complexity and the resource
//! estimates derived from it

use super::network::{DiseaseNetwork, PatientInfo};
use super::stats::{mean, round_to};
use super::AnalyticsConfig;
use crate::model::Complexity;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceTier {
    VeryHigh,
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceBurden {
    pub patient_id: String,
    pub condition_count: usize,
    pub base_complexity: f64,
    pub interaction_count: usize,
    pub avg_interaction_strength: Option<f64>,
    pub interaction_multiplier: f64,
    pub multimorbidity_factor: f64,
    /// `base_complexity * interaction_multiplier * multimorbidity_factor`
    pub total_complexity: f64,
    pub annual_gp_visits: f64,
    pub specialist_referrals: f64,
    pub expected_hospitalizations: f64,
    pub estimated_annual_cost: f64,
    pub resource_tier: ResourceTier,
}

pub fn resource_burden(network: &DiseaseNetwork, config: &AnalyticsConfig) -> Vec<ResourceBurden> {
    let mut burdens: Vec<(f64, ResourceBurden)> = network
        .patients
        .iter()
        .map(|patient| patient_burden(network, patient, config))
        .collect();
    burdens.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.patient_id.cmp(&b.1.patient_id)));
    burdens.into_iter().map(|(_, b)| b).collect()
}

fn patient_burden(network: &DiseaseNetwork, patient: &PatientInfo, config: &AnalyticsConfig) -> (f64, ResourceBurden) {
    let r = &config.resources;
    let held = &patient.conditions;

    let base: f64 = held
        .iter()
        .map(|&d| match network.diseases[d].complexity {
            Some(Complexity::High) => r.high_weight,
            Some(Complexity::Moderate) => r.moderate_weight,
            Some(Complexity::Low) => r.low_weight,
            None => 0.0,
        })
        .sum();

    let interactions: Vec<f64> = network
        .links
        .iter()
        .filter(|l| {
            l.source != l.target
                && held.contains(&l.source)
                && held.contains(&l.target)
                && l.strength >= r.interaction_min_strength
        })
        .map(|l| l.strength)
        .collect();
    let avg = mean(&interactions);
    let multiplier = 1.0 + r.interaction_coefficient * interactions.len() as f64 * avg.unwrap_or(0.0);
    let factor = r.multimorbidity_factor(held.len());
    let total = base * multiplier * factor;

    let referrals = total * r.specialist_referrals_per_point;
    let cost = total * r.cost_per_point + referrals * r.cost_per_specialist_referral;
    let tier = if total >= r.tier_very_high {
        ResourceTier::VeryHigh
    } else if total >= r.tier_high {
        ResourceTier::High
    } else if total >= r.tier_moderate {
        ResourceTier::Moderate
    } else {
        ResourceTier::Low
    };

    (
        total,
        ResourceBurden {
            patient_id: patient.id.clone(),
            condition_count: held.len(),
            base_complexity: round_to(base, 4),
            interaction_count: interactions.len(),
            avg_interaction_strength: avg.map(|v| round_to(v, 4)),
            interaction_multiplier: round_to(multiplier, 4),
            multimorbidity_factor: round_to(factor, 4),
            total_complexity: round_to(total, 4),
            annual_gp_visits: round_to(total * r.gp_visits_per_point, 2),
            specialist_referrals: round_to(referrals, 2),
            expected_hospitalizations: round_to(total * r.hospitalizations_per_point, 2),
            estimated_annual_cost: round_to(cost, 2),
            resource_tier: tier,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample;
    use crate::graph::GraphStore;
    use crate::loader::{load_patients, load_reference_data};

    fn sample_burdens() -> Vec<ResourceBurden> {
        let mut store = GraphStore::new();
        load_reference_data(&mut store, &sample::reference_dataset()).unwrap();
        load_patients(&mut store, &sample::patients()).unwrap();
        resource_burden(&DiseaseNetwork::from_store(&store), &AnalyticsConfig::default())
    }

    #[test]
    fn test_cardiometabolic_patient() {
        let burdens = sample_burdens();
        let p1 = burdens.iter().find(|b| b.patient_id == "PATIENT_001").unwrap();
        // T2DM and heart failure are HIGH, hypertension MODERATE
        assert_eq!(p1.base_complexity, 10.0);
        assert_eq!(p1.interaction_count, 3);
        assert_eq!(p1.interaction_multiplier, 2.15);
        assert_eq!(p1.multimorbidity_factor, 1.2);
        assert_eq!(p1.total_complexity, 25.8);
        assert_eq!(p1.estimated_annual_cost, 8385.0);
        assert_eq!(p1.resource_tier, ResourceTier::VeryHigh);
    }

    #[test]
    fn test_sorted_by_total() {
        let burdens = sample_burdens();
        assert_eq!(burdens.len(), 3);
        // Four conditions lift PATIENT_003 above the others
        assert_eq!(burdens[0].patient_id, "PATIENT_003");
        assert!(burdens
            .windows(2)
            .all(|w| w[0].total_complexity >= w[1].total_complexity));
    }
}
