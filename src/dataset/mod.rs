//! Reference dataset and patient record input
//!
//! Records are plain serde structs read from JSON or YAML. Nothing here is
//! validated beyond parsing: range checks and cross-references are the
//! loader's job, so a bad record is rejected individually instead of failing
//! the whole file.

pub mod sample;

use crate::model::{Complexity, DiagnosisType, MappingMethod};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Number of body systems in the CPRD classification
pub const CPRD_SYSTEM_COUNT: usize = 15;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported dataset format: {0}")]
    UnsupportedFormat(String),
}

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySystemRecord {
    pub name: String,
    pub system_num: i64,
    /// Expected number of conditions in the full codelist
    #[serde(default)]
    pub condition_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(alias = "system", deserialize_with = "one_or_many")]
    pub systems: Vec<String>,
    #[serde(default)]
    pub diagnosis_type: DiagnosisType,
    pub complexity: Complexity,
    #[serde(default)]
    pub has_test_results: bool,
}

/// Reference to a disease by numeric id or by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiseaseRef {
    Id(i64),
    Name(String),
}

impl fmt::Display for DiseaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiseaseRef::Id(id) => write!(f, "#{}", id),
            DiseaseRef::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for DiseaseRef {
    fn from(name: &str) -> Self {
        DiseaseRef::Name(name.to_string())
    }
}

impl From<i64> for DiseaseRef {
    fn from(id: i64) -> Self {
        DiseaseRef::Id(id)
    }
}

/// A curated disease-to-disease relationship. The type stays a string here
/// and is checked when loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub source: DiseaseRef,
    pub target: DiseaseRef,
    #[serde(rename = "type")]
    pub kind: String,
    pub strength: f64,
    /// Distinguishes several edges of one type between the same pair
    #[serde(default)]
    pub edge_key: Option<String>,
    #[serde(default = "default_evidence")]
    pub evidence: String,
    #[serde(default = "default_discovery_method")]
    pub discovery_method: String,
}

impl RelationshipRecord {
    pub fn new(source: impl Into<DiseaseRef>, target: impl Into<DiseaseRef>, kind: &str, strength: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: kind.to_string(),
            strength,
            edge_key: None,
            evidence: default_evidence(),
            discovery_method: default_discovery_method(),
        }
    }
}

fn default_evidence() -> String {
    "CPRD_study".to_string()
}

fn default_discovery_method() -> String {
    "curated".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInteractionRecord {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub interaction_type: String,
    pub strength: f64,
    #[serde(default = "default_true")]
    pub bidirectional: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalCodeRecord {
    pub concept_id: String,
    pub description: String,
    pub mapping_method: MappingMethod,
    pub disease: DiseaseRef,
}

/// Everything the reference loader consumes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceDataset {
    pub body_systems: Vec<BodySystemRecord>,
    pub diseases: Vec<DiseaseRecord>,
    pub relationships: Vec<RelationshipRecord>,
    pub system_interactions: Vec<SystemInteractionRecord>,
    pub medical_codes: Vec<MedicalCodeRecord>,
}

impl ReferenceDataset {
    /// Read a dataset file; `.json`, `.yaml` and `.yml` are recognised
    pub fn from_path(path: impl AsRef<Path>) -> DatasetResult<Self> {
        read_document(path.as_ref())
    }

    pub fn from_json_str(s: &str) -> DatasetResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_yaml_str(s: &str) -> DatasetResult<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary::from_dataset(self)
    }
}

/// A condition held by a patient: either a bare disease name or a detailed entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConditionRepr")]
pub struct ConditionRecord {
    pub disease: String,
    pub severity: Option<String>,
    pub diagnosed_at: Option<DateTime<Utc>>,
}

impl From<&str> for ConditionRecord {
    fn from(disease: &str) -> Self {
        ConditionRecord {
            disease: disease.to_string(),
            severity: None,
            diagnosed_at: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConditionRepr {
    Name(String),
    Detailed {
        disease: String,
        #[serde(default)]
        severity: Option<String>,
        #[serde(default)]
        diagnosed_at: Option<DateTime<Utc>>,
    },
}

impl From<ConditionRepr> for ConditionRecord {
    fn from(repr: ConditionRepr) -> Self {
        match repr {
            ConditionRepr::Name(disease) => ConditionRecord {
                disease,
                severity: None,
                diagnosed_at: None,
            },
            ConditionRepr::Detailed {
                disease,
                severity,
                diagnosed_at,
            } => ConditionRecord {
                disease,
                severity,
                diagnosed_at,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: String,
    pub age_group: String,
    pub complexity: Complexity,
    #[serde(default)]
    pub conditions: Vec<ConditionRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct PatientFile {
    patients: Vec<PatientRecord>,
}

/// Read a `{ patients: [...] }` document
pub fn read_patients(path: impl AsRef<Path>) -> DatasetResult<Vec<PatientRecord>> {
    let file: PatientFile = read_document(path.as_ref())?;
    Ok(file.patients)
}

fn read_document<T: DeserializeOwned>(path: &Path) -> DatasetResult<T> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match extension.as_str() {
        "json" => Ok(serde_json::from_str(&text)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(&text)?),
        other => Err(DatasetError::UnsupportedFormat(other.to_string())),
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// Shape of a dataset: how its conditions spread over body systems
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_conditions: usize,
    pub systems_count: usize,
    pub conditions_per_system: IndexMap<String, usize>,
    pub avg_conditions_per_system: f64,
    /// Share of the CPRD systems covered
    pub system_diversity: f64,
    pub largest_system: Option<(String, usize)>,
    /// Sum of the body systems' declared condition counts
    pub declared_conditions: i64,
}

impl DatasetSummary {
    pub fn from_dataset(dataset: &ReferenceDataset) -> Self {
        let mut per_system: IndexMap<String, usize> = IndexMap::new();
        for disease in &dataset.diseases {
            for system in &disease.systems {
                *per_system.entry(system.clone()).or_default() += 1;
            }
        }

        let systems_count = per_system.len();
        let total_conditions = dataset.diseases.len();
        let avg_conditions_per_system = if systems_count == 0 {
            0.0
        } else {
            total_conditions as f64 / systems_count as f64
        };
        let largest_system = per_system
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, count)| (name.clone(), *count));

        DatasetSummary {
            total_conditions,
            systems_count,
            conditions_per_system: per_system,
            avg_conditions_per_system,
            system_diversity: systems_count as f64 / CPRD_SYSTEM_COUNT as f64,
            largest_system,
            declared_conditions: dataset.body_systems.iter().map(|s| s.condition_count).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disease_accepts_single_system() {
        let json = r#"{
            "id": 4, "name": "Hypertension", "system": "Diseases of the Circulatory System",
            "complexity": "MODERATE"
        }"#;
        let disease: DiseaseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(disease.systems, vec!["Diseases of the Circulatory System".to_string()]);
        assert_eq!(disease.diagnosis_type, DiagnosisType::Single);
    }

    #[test]
    fn test_relationship_defaults_and_refs() {
        let yaml = "source: Obesity\ntarget: 1\ntype: INCREASES_RISK_OF\nstrength: 0.75\n";
        let rel: RelationshipRecord = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rel.source, DiseaseRef::Name("Obesity".to_string()));
        assert_eq!(rel.target, DiseaseRef::Id(1));
        assert_eq!(rel.evidence, "CPRD_study");
        assert_eq!(rel.discovery_method, "curated");
    }

    #[test]
    fn test_condition_forms() {
        let json = r#"{
            "id": "P1", "age_group": "65-75", "complexity": "HIGH",
            "conditions": ["COPD", {"disease": "Depression", "severity": "mild",
                                     "diagnosed_at": "2021-03-04T00:00:00Z"}]
        }"#;
        let patient: PatientRecord = serde_json::from_str(json).unwrap();
        assert_eq!(patient.conditions.len(), 2);
        assert_eq!(patient.conditions[0], ConditionRecord::from("COPD"));
        assert_eq!(patient.conditions[1].severity.as_deref(), Some("mild"));
        assert!(patient.conditions[1].diagnosed_at.is_some());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "id,name").unwrap();
        assert!(matches!(
            ReferenceDataset::from_path(&path),
            Err(DatasetError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_summary_of_empty_dataset() {
        let summary = ReferenceDataset::default().summary();
        assert_eq!(summary.total_conditions, 0);
        assert_eq!(summary.avg_conditions_per_system, 0.0);
        assert!(summary.largest_system.is_none());
    }
}
