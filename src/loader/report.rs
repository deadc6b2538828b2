//! Load reports: what a load run created, updated, left alone or rejected

use crate::graph::MergeStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Kinds of record a loader writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EntityKind {
    BodySystem,
    Disease,
    AffectsSystem,
    Relationship,
    SystemInteraction,
    MedicalCode,
    HasCode,
    Patient,
    HasCondition,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::BodySystem => "body system",
            EntityKind::Disease => "disease",
            EntityKind::AffectsSystem => "AFFECTS_SYSTEM",
            EntityKind::Relationship => "disease relationship",
            EntityKind::SystemInteraction => "SYSTEM_INTERACTION",
            EntityKind::MedicalCode => "medical code",
            EntityKind::HasCode => "HAS_CODE",
            EntityKind::Patient => "patient",
            EntityKind::HasCondition => "HAS_CONDITION",
        };
        f.write_str(name)
    }
}

/// Why a single record was skipped
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum RejectReason {
    #[error("strength {0} is outside [0, 1]")]
    StrengthOutOfRange(f64),

    #[error("interaction strength {0} must be positive and finite")]
    InvalidInteractionStrength(f64),

    #[error("unknown body system '{0}'")]
    UnknownBodySystem(String),

    #[error("unknown disease '{0}'")]
    UnknownDisease(String),

    #[error("unknown relationship type '{0}'")]
    UnknownRelationshipType(String),

    #[error("disease '{0}' cannot relate to itself")]
    SelfRelationship(String),

    #[error("constraint violated: {0}")]
    ConstraintViolation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub kind: EntityKind,
    /// Human-readable identification of the record
    pub record: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counter {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub rejected: usize,
}

impl Counter {
    pub fn accepted(&self) -> usize {
        self.created + self.updated + self.unchanged
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub counts: BTreeMap<EntityKind, Counter>,
    pub rejections: Vec<Rejection>,
}

impl LoadReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            counts: BTreeMap::new(),
            rejections: Vec::new(),
        }
    }

    pub fn record(&mut self, kind: EntityKind, status: MergeStatus) {
        let counter = self.counts.entry(kind).or_default();
        match status {
            MergeStatus::Created => counter.created += 1,
            MergeStatus::Updated => counter.updated += 1,
            MergeStatus::Unchanged => counter.unchanged += 1,
        }
    }

    pub fn reject(&mut self, kind: EntityKind, record: impl Into<String>, reason: RejectReason) {
        let record = record.into();
        warn!("Rejected {} [{}]: {}", kind, record, reason);
        self.counts.entry(kind).or_default().rejected += 1;
        self.rejections.push(Rejection { kind, record, reason });
    }

    pub fn counter(&self, kind: EntityKind) -> Counter {
        self.counts.get(&kind).copied().unwrap_or_default()
    }

    pub fn total_created(&self) -> usize {
        self.counts.values().map(|c| c.created).sum()
    }

    pub fn total_updated(&self) -> usize {
        self.counts.values().map(|c| c.updated).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.rejections.is_empty()
    }

    /// Rejections of one kind
    pub fn rejections_of(&self, kind: EntityKind) -> impl Iterator<Item = &Rejection> {
        self.rejections.iter().filter(move |r| r.kind == kind)
    }

    /// Fold another report's counters and rejections into this one
    pub fn absorb(&mut self, other: LoadReport) {
        for (kind, counter) in other.counts {
            let mine = self.counts.entry(kind).or_default();
            mine.created += counter.created;
            mine.updated += counter.updated;
            mine.unchanged += counter.unchanged;
            mine.rejected += counter.rejected;
        }
        self.rejections.extend(other.rejections);
    }
}

impl Default for LoadReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut report = LoadReport::new();
        report.record(EntityKind::Disease, MergeStatus::Created);
        report.record(EntityKind::Disease, MergeStatus::Unchanged);
        report.reject(
            EntityKind::Relationship,
            "A -> B",
            RejectReason::StrengthOutOfRange(1.5),
        );

        assert_eq!(report.counter(EntityKind::Disease).accepted(), 2);
        assert_eq!(report.counter(EntityKind::Relationship).rejected, 1);
        assert_eq!(report.total_created(), 1);
        assert!(!report.is_clean());
        assert_eq!(report.rejections_of(EntityKind::Relationship).count(), 1);
    }

    #[test]
    fn test_reason_messages() {
        assert_eq!(
            RejectReason::UnknownBodySystem("Teeth".into()).to_string(),
            "unknown body system 'Teeth'"
        );
    }

    #[test]
    fn test_absorb_merges_runs() {
        let mut first = LoadReport::new();
        first.record(EntityKind::Patient, MergeStatus::Created);
        let mut second = LoadReport::new();
        second.record(EntityKind::Patient, MergeStatus::Updated);
        second.reject(EntityKind::HasCondition, "P -> X", RejectReason::UnknownDisease("X".into()));

        first.absorb(second);
        let patients = first.counter(EntityKind::Patient);
        assert_eq!((patients.created, patients.updated), (1, 1));
        assert_eq!(first.rejections.len(), 1);
    }
}
