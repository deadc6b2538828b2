//! Complex multimorbidity: patients spanning many conditions and systems,
//! with the conditions they are most likely to develop next

use super::network::{DiseaseNetwork, PatientInfo};
use super::stats::round_to;
use super::AnalyticsConfig;
use crate::model::RelationshipKind;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedRisk {
    pub disease: String,
    pub strength: f64,
    /// Held condition the prediction follows from
    pub via: String,
    pub relationship: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientProfile {
    pub patient_id: String,
    pub age_group: Option<String>,
    pub disease_count: usize,
    pub system_count: usize,
    pub conditions: Vec<String>,
    pub systems: Vec<String>,
    pub complex_multimorbid: bool,
    pub predicted_risks: Vec<PredictedRisk>,
}

/// Profiles of every patient, complex ones first
pub fn patient_profiles(network: &DiseaseNetwork, config: &AnalyticsConfig) -> Vec<PatientProfile> {
    let mut profiles: Vec<PatientProfile> = network
        .patients
        .iter()
        .map(|patient| profile(network, patient, config))
        .collect();
    profiles.sort_by(|a, b| {
        b.complex_multimorbid
            .cmp(&a.complex_multimorbid)
            .then_with(|| b.disease_count.cmp(&a.disease_count))
            .then_with(|| b.system_count.cmp(&a.system_count))
            .then_with(|| a.patient_id.cmp(&b.patient_id))
    });
    profiles
}

/// Only the patients flagged complex multimorbid
pub fn complex_multimorbidity(network: &DiseaseNetwork, config: &AnalyticsConfig) -> Vec<PatientProfile> {
    patient_profiles(network, config)
        .into_iter()
        .filter(|p| p.complex_multimorbid)
        .collect()
}

fn profile(network: &DiseaseNetwork, patient: &PatientInfo, config: &AnalyticsConfig) -> PatientProfile {
    let systems: BTreeSet<usize> = patient
        .conditions
        .iter()
        .flat_map(|&d| network.diseases[d].systems.iter().copied())
        .collect();
    let complex = patient.conditions.len() >= config.complex_min_diseases
        && systems.len() >= config.complex_min_systems;

    PatientProfile {
        patient_id: patient.id.clone(),
        age_group: patient.age_group.clone(),
        disease_count: patient.conditions.len(),
        system_count: systems.len(),
        conditions: patient.conditions.iter().map(|&d| network.name(d).to_string()).collect(),
        systems: systems.iter().map(|&s| network.system_name(s).to_string()).collect(),
        complex_multimorbid: complex,
        predicted_risks: if complex {
            predicted_risks(network, &patient.conditions, config)
        } else {
            Vec::new()
        },
    }
}

/// Strongest not-yet-held diseases reachable in one step from the held set
pub fn predicted_risks(network: &DiseaseNetwork, held: &[usize], config: &AnalyticsConfig) -> Vec<PredictedRisk> {
    let kinds = [RelationshipKind::LeadsTo, RelationshipKind::CommonlyOccursWith];
    let mut best: FxHashMap<usize, (f64, usize, RelationshipKind)> = FxHashMap::default();

    for &from in held {
        for (candidate, link) in network.neighbours(from, &kinds, config.predicted_risk_min_strength) {
            if held.contains(&candidate) {
                continue;
            }
            let entry = best.entry(candidate).or_insert((link.strength, from, link.kind));
            if link.strength > entry.0 {
                *entry = (link.strength, from, link.kind);
            }
        }
    }

    let mut ranked: Vec<(usize, f64, usize, RelationshipKind)> = best
        .into_iter()
        .map(|(candidate, (strength, from, kind))| (candidate, strength, from, kind))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.total_cmp(&a.1)
            .then_with(|| network.name(a.0).cmp(network.name(b.0)))
    });
    ranked
        .into_iter()
        .take(config.predicted_risk_limit)
        .map(|(candidate, strength, from, kind)| PredictedRisk {
            disease: network.name(candidate).to_string(),
            strength: round_to(strength, 4),
            via: network.name(from).to_string(),
            relationship: kind.as_str().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample;
    use crate::graph::GraphStore;
    use crate::loader::{load_patients, load_reference_data};

    fn sample_network() -> DiseaseNetwork {
        let mut store = GraphStore::new();
        load_reference_data(&mut store, &sample::reference_dataset()).unwrap();
        load_patients(&mut store, &sample::patients()).unwrap();
        DiseaseNetwork::from_store(&store)
    }

    #[test]
    fn test_sample_flags() {
        let profiles = patient_profiles(&sample_network(), &AnalyticsConfig::default());
        let flag = |id: &str| profiles.iter().find(|p| p.patient_id == id).unwrap().complex_multimorbid;

        // Endocrine + circulatory only
        assert!(!flag("PATIENT_001"));
        // Respiratory + mental health only
        assert!(!flag("PATIENT_002"));
        // Endocrine, circulatory and mental health
        assert!(flag("PATIENT_003"));
    }

    #[test]
    fn test_predictions_exclude_held_conditions() {
        let network = sample_network();
        let complex = complex_multimorbidity(&network, &AnalyticsConfig::default());
        assert_eq!(complex.len(), 1);

        let p3 = &complex[0];
        assert!(p3.predicted_risks.len() <= 3);
        assert!(p3.predicted_risks.iter().all(|r| !p3.conditions.contains(&r.disease)));
        // T2DM -[LEADS_TO 0.90]-> Diabetic Neuropathy ranks first
        assert_eq!(p3.predicted_risks[0].disease, sample::DIABETIC_NEUROPATHY);
        assert_eq!(p3.predicted_risks[0].via, sample::T2DM);
        let strengths: Vec<f64> = p3.predicted_risks.iter().map(|r| r.strength).collect();
        assert!(strengths.windows(2).all(|w| w[0] >= w[1]));
    }
}
