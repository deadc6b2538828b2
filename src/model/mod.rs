//! Domain vocabulary shared by the dataset, loaders and analytics

use crate::graph::PropertyValue;
use crate::schema::rel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Clinical complexity of a disease or patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Complexity {
    Low,
    Moderate,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "LOW",
            Complexity::Moderate => "MODERATE",
            Complexity::High => "HIGH",
        }
    }

    /// Read a complexity stored as a node property
    pub fn from_property(value: &PropertyValue) -> Option<Self> {
        value.as_string().and_then(|s| s.parse().ok())
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Complexity::Low),
            "MODERATE" => Ok(Complexity::Moderate),
            "HIGH" => Ok(Complexity::High),
            other => Err(format!("unknown complexity '{}'", other)),
        }
    }
}

/// Whether a condition is diagnosed from a single code or needs several
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosisType {
    Single,
    Multi,
}

impl DiagnosisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosisType::Single => "single",
            DiagnosisType::Multi => "multi",
        }
    }
}

impl Default for DiagnosisType {
    fn default() -> Self {
        DiagnosisType::Single
    }
}

/// How a medical code was mapped onto its condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingMethod {
    Description,
    CleansedReadCode,
    OriginalReadCode,
    TermSearch,
}

impl MappingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingMethod::Description => "description",
            MappingMethod::CleansedReadCode => "cleansed_read_code",
            MappingMethod::OriginalReadCode => "original_read_code",
            MappingMethod::TermSearch => "term_search",
        }
    }
}

/// Weighted disease-to-disease relationship types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationshipKind {
    #[serde(rename = "COMMONLY_OCCURS_WITH")]
    CommonlyOccursWith,
    #[serde(rename = "LEADS_TO")]
    LeadsTo,
    #[serde(rename = "INCREASES_RISK_OF")]
    IncreasesRiskOf,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 3] = [
        RelationshipKind::CommonlyOccursWith,
        RelationshipKind::LeadsTo,
        RelationshipKind::IncreasesRiskOf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::CommonlyOccursWith => rel::COMMONLY_OCCURS_WITH,
            RelationshipKind::LeadsTo => rel::LEADS_TO,
            RelationshipKind::IncreasesRiskOf => rel::INCREASES_RISK_OF,
        }
    }

    /// Co-occurrence has no direction; progression and risk do
    pub fn is_symmetric(&self) -> bool {
        matches!(self, RelationshipKind::CommonlyOccursWith)
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        RelationshipKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == upper)
            .ok_or_else(|| format!("unknown relationship type '{}'", s))
    }
}

/// A relationship strength in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Strength(f64);

impl Strength {
    /// `None` when the value is non-finite or outside `[0, 1]`
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Some(Strength(value))
        } else {
            None
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<Strength> for PropertyValue {
    fn from(s: Strength) -> Self {
        PropertyValue::Float(s.0)
    }
}
