//! Multimorbidity Graph
//!
//! An in-memory knowledge graph of chronic diseases, the body systems they
//! affect, their co-occurrence and progression relationships, and synthetic
//! patients, with a catalogue of analytical queries over it.
//!
//! # Layers
//!
//! - [`graph`]: property graph store with label and type indexes, unique
//!   constraints and property indexes
//! - [`schema`]: the fixed labels, relationship types and schema objects
//! - [`dataset`] / [`loader`]: reference data records and idempotent loaders
//! - [`derived`]: hub labels, relationship counts and system burden
//! - [`analytics`]: read-only analyses returning typed results or rows
//! - [`service`]: lock-guarded shared access with serialized write phases
//! - [`persistence`]: compressed snapshots
//!
//! ## Example Usage
//!
//! ```rust
//! use multimorbidity_graph::analytics::{AnalysisKind, AnalyticsConfig, AnalyticsEngine};
//! use multimorbidity_graph::dataset::sample;
//! use multimorbidity_graph::derived::recompute_hub_labels;
//! use multimorbidity_graph::loader::{load_patients, load_reference_data};
//! use multimorbidity_graph::GraphStore;
//!
//! let mut store = GraphStore::new();
//! let report = load_reference_data(&mut store, &sample::reference_dataset()).unwrap();
//! assert!(report.is_clean());
//! load_patients(&mut store, &sample::patients()).unwrap();
//! recompute_hub_labels(&mut store, 3).unwrap();
//!
//! let engine = AnalyticsEngine::new(&store, &AnalyticsConfig::default());
//! let hotspots = engine.run(AnalysisKind::DiseaseHotspots).unwrap();
//! assert!(!hotspots.is_empty());
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod analytics;
pub mod config;
pub mod dataset;
pub mod derived;
pub mod graph;
pub mod index;
pub mod loader;
pub mod model;
pub mod persistence;
pub mod schema;
pub mod service;

// Re-export main types for convenience
pub use graph::{
    Direction, Edge, EdgeId, EdgeType, GraphError, GraphResult, GraphStore, Label, Node, NodeId,
    PropertyMap, PropertyValue,
};

pub use analytics::{AnalysisKind, AnalyticsConfig, AnalyticsEngine, AnalyticsError, ResultSet, Row};

pub use config::{Config, ConfigError};

pub use dataset::{PatientRecord, ReferenceDataset};

pub use loader::{load_patients, load_reference_data, LoadError, LoadReport};

pub use service::{GraphService, ServiceError, ServiceResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.1.0");
    }
}
