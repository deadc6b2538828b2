//! Persistence for the disease graph
//!
//! The graph is small and rebuilt deterministically from reference data, so
//! persistence is a single compressed snapshot rather than a log.

pub mod snapshot;

pub use snapshot::{
    load_snapshot, restore_into, save_snapshot, SnapshotError, SnapshotInfo, SnapshotResult,
};
