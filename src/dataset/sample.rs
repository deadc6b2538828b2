//! Bundled demonstration dataset
//!
//! The 15 CPRD body systems (with the size of each system's codelist), a
//! 16-disease subset, curated multimorbidity relationships, system-level
//! interactions and three demonstration patients.

use super::{
    BodySystemRecord, ConditionRecord, DiseaseRecord, MedicalCodeRecord, PatientRecord,
    ReferenceDataset, RelationshipRecord, SystemInteractionRecord,
};
use crate::model::{Complexity, DiagnosisType, MappingMethod};

pub const CIRCULATORY: &str = "Diseases of the Circulatory System";
pub const DIGESTIVE: &str = "Diseases of the Digestive System";
pub const EAR: &str = "Diseases of the Ear";
pub const EYE: &str = "Diseases of the Eye";
pub const GENITOURINARY: &str = "Diseases of the Genitourinary System";
pub const MUSCULOSKELETAL: &str = "Diseases of the Musculoskeletal System";
pub const NERVOUS: &str = "Diseases of the Nervous System";
pub const RESPIRATORY: &str = "Diseases of the Respiratory System";
pub const SKIN: &str = "Skin conditions";
pub const ENDOCRINE: &str = "Endocrine Diseases";
pub const HAEMATOLOGICAL: &str = "Haematological/Immunological conditions";
pub const INFECTIOUS: &str = "Infectious diseases";
pub const MENTAL_HEALTH: &str = "Mental Health Disorders";
pub const BENIGN_NEOPLASM: &str = "Benign Neoplasm/CIN";
pub const CANCERS: &str = "Cancers";

const SYSTEMS: [(&str, i64); 15] = [
    (CIRCULATORY, 22),
    (DIGESTIVE, 22),
    (EAR, 4),
    (EYE, 9),
    (GENITOURINARY, 13),
    (MUSCULOSKELETAL, 21),
    (NERVOUS, 19),
    (RESPIRATORY, 13),
    (SKIN, 9),
    (ENDOCRINE, 11),
    (HAEMATOLOGICAL, 12),
    (INFECTIOUS, 7),
    (MENTAL_HEALTH, 18),
    (BENIGN_NEOPLASM, 8),
    (CANCERS, 23),
];

pub const T2DM: &str = "Type 2 Diabetes Mellitus";
pub const T1DM: &str = "Type 1 Diabetes Mellitus";
pub const OBESITY: &str = "Obesity";
pub const HYPERTENSION: &str = "Hypertension";
pub const HEART_FAILURE: &str = "Heart failure";
pub const ATRIAL_FIBRILLATION: &str = "Atrial Fibrillation";
pub const MYOCARDIAL_INFARCTION: &str = "Myocardial Infarction";
pub const CORONARY_HEART_DISEASE: &str = "Coronary Heart Disease (not otherwise specified)";
pub const CKD: &str = "Chronic Kidney Disease";
pub const DIABETIC_NEUROPATHY: &str = "Diabetic Neuropathy";
pub const COPD: &str = "COPD";
pub const DEPRESSION: &str = "Depression";
pub const ANXIETY: &str = "Anxiety disorders";
pub const RHEUMATOID_ARTHRITIS: &str = "Rheumatoid Arthritis";
pub const LUPUS: &str = "Lupus Erythematosus";
pub const ASTHMA: &str = "Asthma";

pub fn body_systems() -> Vec<BodySystemRecord> {
    SYSTEMS
        .iter()
        .enumerate()
        .map(|(i, (name, count))| BodySystemRecord {
            name: name.to_string(),
            system_num: i as i64 + 1,
            condition_count: *count,
        })
        .collect()
}

fn disease(
    id: i64,
    name: &str,
    systems: &[&str],
    diagnosis_type: DiagnosisType,
    complexity: Complexity,
) -> DiseaseRecord {
    DiseaseRecord {
        id,
        name: name.to_string(),
        original_name: None,
        systems: systems.iter().map(|s| s.to_string()).collect(),
        diagnosis_type,
        complexity,
        has_test_results: false,
    }
}

pub fn diseases() -> Vec<DiseaseRecord> {
    use Complexity::*;
    use DiagnosisType::*;

    let mut diseases = vec![
        disease(1, T2DM, &[ENDOCRINE], Multi, High),
        disease(2, T1DM, &[ENDOCRINE], Multi, High),
        disease(3, OBESITY, &[ENDOCRINE], Single, Moderate),
        disease(4, HYPERTENSION, &[CIRCULATORY], Single, Moderate),
        disease(5, HEART_FAILURE, &[CIRCULATORY], Single, High),
        disease(6, ATRIAL_FIBRILLATION, &[CIRCULATORY], Single, Moderate),
        disease(7, MYOCARDIAL_INFARCTION, &[CIRCULATORY], Single, High),
        disease(8, CORONARY_HEART_DISEASE, &[CIRCULATORY], Single, High),
        disease(9, CKD, &[GENITOURINARY], Multi, High),
        disease(10, DIABETIC_NEUROPATHY, &[NERVOUS], Single, Moderate),
        disease(11, COPD, &[RESPIRATORY], Single, High),
        disease(12, DEPRESSION, &[MENTAL_HEALTH], Multi, Moderate),
        disease(13, ANXIETY, &[MENTAL_HEALTH], Multi, Low),
        disease(14, RHEUMATOID_ARTHRITIS, &[MUSCULOSKELETAL], Single, Moderate),
        disease(15, LUPUS, &[MUSCULOSKELETAL, SKIN], Single, High),
        disease(16, ASTHMA, &[RESPIRATORY], Single, Low),
    ];

    for d in diseases.iter_mut() {
        match d.id {
            1 => d.has_test_results = true,
            9 => {
                d.has_test_results = true;
                d.original_name = Some("Chronic kidney disease stage 3-5".to_string());
            }
            11 => d.original_name = Some("Chronic Obstructive Pulmonary Disease".to_string()),
            _ => {}
        }
    }
    diseases
}

pub fn relationships() -> Vec<RelationshipRecord> {
    const COW: &str = "COMMONLY_OCCURS_WITH";
    const LEADS_TO: &str = "LEADS_TO";
    const IRO: &str = "INCREASES_RISK_OF";

    [
        // Cardiovascular-endocrine
        (T2DM, HYPERTENSION, COW, 0.85),
        (T2DM, HEART_FAILURE, COW, 0.65),
        (T2DM, CKD, COW, 0.75),
        (T2DM, OBESITY, COW, 0.70),
        (T2DM, DIABETIC_NEUROPATHY, LEADS_TO, 0.90),
        (T1DM, DIABETIC_NEUROPATHY, LEADS_TO, 0.75),
        // Cardiovascular
        (HYPERTENSION, HEART_FAILURE, COW, 0.80),
        (HYPERTENSION, ATRIAL_FIBRILLATION, COW, 0.60),
        (MYOCARDIAL_INFARCTION, HEART_FAILURE, LEADS_TO, 0.70),
        (CORONARY_HEART_DISEASE, MYOCARDIAL_INFARCTION, LEADS_TO, 0.65),
        // Respiratory-cardiovascular
        (COPD, HEART_FAILURE, COW, 0.45),
        (COPD, DEPRESSION, COW, 0.55),
        // Mental health
        (DEPRESSION, ANXIETY, COW, 0.70),
        (DEPRESSION, OBESITY, COW, 0.40),
        // Metabolic
        (OBESITY, T2DM, IRO, 0.75),
        (OBESITY, HYPERTENSION, IRO, 0.65),
        // Autoimmune
        (RHEUMATOID_ARTHRITIS, DEPRESSION, COW, 0.50),
        (LUPUS, CKD, LEADS_TO, 0.40),
    ]
    .into_iter()
    .map(|(source, target, kind, strength)| RelationshipRecord::new(source, target, kind, strength))
    .collect()
}

pub fn system_interactions() -> Vec<SystemInteractionRecord> {
    [
        (CIRCULATORY, ENDOCRINE, "HIGH_INTERACTION", 8.5),
        (CIRCULATORY, RESPIRATORY, "MODERATE_INTERACTION", 6.8),
        (ENDOCRINE, GENITOURINARY, "HIGH_INTERACTION", 7.2),
        (MENTAL_HEALTH, CIRCULATORY, "MODERATE_INTERACTION", 5.1),
        (MENTAL_HEALTH, ENDOCRINE, "MODERATE_INTERACTION", 6.2),
        (RESPIRATORY, MENTAL_HEALTH, "MODERATE_INTERACTION", 4.1),
    ]
    .into_iter()
    .map(|(source, target, interaction_type, strength)| SystemInteractionRecord {
        source: source.to_string(),
        target: target.to_string(),
        interaction_type: interaction_type.to_string(),
        strength,
        bidirectional: true,
    })
    .collect()
}

pub fn medical_codes() -> Vec<MedicalCodeRecord> {
    [
        ("C10F.", "Type 2 diabetes mellitus", MappingMethod::OriginalReadCode, T2DM),
        ("G20..", "Essential hypertension", MappingMethod::OriginalReadCode, HYPERTENSION),
        ("H3...", "Chronic obstructive pulmonary disease", MappingMethod::CleansedReadCode, COPD),
        ("E2B..", "Depressive disorder NEC", MappingMethod::Description, DEPRESSION),
    ]
    .into_iter()
    .map(|(concept_id, description, mapping_method, disease)| MedicalCodeRecord {
        concept_id: concept_id.to_string(),
        description: description.to_string(),
        mapping_method,
        disease: disease.into(),
    })
    .collect()
}

pub fn reference_dataset() -> ReferenceDataset {
    ReferenceDataset {
        body_systems: body_systems(),
        diseases: diseases(),
        relationships: relationships(),
        system_interactions: system_interactions(),
        medical_codes: medical_codes(),
    }
}

pub fn patients() -> Vec<PatientRecord> {
    let patient = |id: &str, age_group: &str, complexity, conditions: &[&str]| PatientRecord {
        id: id.to_string(),
        age_group: age_group.to_string(),
        complexity,
        conditions: conditions.iter().map(|c| ConditionRecord::from(*c)).collect(),
    };

    vec![
        patient("PATIENT_001", "65-75", Complexity::High, &[T2DM, HYPERTENSION, HEART_FAILURE]),
        patient("PATIENT_002", "55-65", Complexity::Moderate, &[COPD, DEPRESSION, ANXIETY]),
        patient(
            "PATIENT_003",
            "45-55",
            Complexity::High,
            &[OBESITY, T2DM, HYPERTENSION, DEPRESSION],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CPRD_SYSTEM_COUNT;

    #[test]
    fn test_sample_shape() {
        let dataset = reference_dataset();
        assert_eq!(dataset.body_systems.len(), CPRD_SYSTEM_COUNT);
        assert_eq!(dataset.diseases.len(), 16);
        assert_eq!(dataset.relationships.len(), 18);
        assert_eq!(dataset.system_interactions.len(), 6);
        assert_eq!(patients().len(), 3);
    }

    #[test]
    fn test_sample_summary() {
        let summary = reference_dataset().summary();
        assert_eq!(summary.declared_conditions, 211);
        assert_eq!(summary.total_conditions, 16);
        // Circulatory holds five of the sample diseases
        assert_eq!(summary.largest_system, Some((CIRCULATORY.to_string(), 5)));
    }

    #[test]
    fn test_relationship_endpoints_are_declared() {
        let names: Vec<String> = diseases().into_iter().map(|d| d.name).collect();
        for rel in relationships() {
            for end in [&rel.source, &rel.target] {
                assert!(names.contains(&end.to_string()), "{} missing", end);
            }
        }
    }
}
