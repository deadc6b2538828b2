//! Shared, lock-guarded access to the disease graph
//!
//! The store sits behind a tokio `RwLock`. Analyses take the read lock only
//! long enough to project the graph. Write phases (schema, loads, hub
//! recompute, reset, restore) are serialized by a separate phase mutex so a
//! multi-step bootstrap never interleaves with another writer, while readers
//! may still run between its steps.

use crate::analytics::{AnalysisKind, AnalyticsEngine, AnalyticsError, ResultSet};
use crate::config::Config;
use crate::dataset::{PatientRecord, ReferenceDataset};
use crate::derived::{self, HubSummary, SystemBurden};
use crate::graph::{GraphError, GraphStatistics, GraphStore};
use crate::loader::{self, LoadError, LoadReport};
use crate::persistence::{self, SnapshotError, SnapshotInfo};
use crate::schema::{self, SchemaError, SchemaReport};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ServiceError {
    /// The service has been shut down; callers decide whether to retry
    #[error("Graph service is unavailable")]
    Unavailable,

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("No snapshot path configured")]
    NoSnapshotPath,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Everything a bootstrap run did, phase by phase
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    pub schema: SchemaReport,
    pub reference: LoadReport,
    pub patients: LoadReport,
    pub hubs: HubSummary,
}

pub struct GraphService {
    store: Arc<RwLock<GraphStore>>,
    write_phase: Mutex<()>,
    closed: AtomicBool,
    config: Config,
}

impl GraphService {
    pub fn new(config: Config) -> Self {
        Self::with_store(GraphStore::new(), config)
    }

    pub fn with_store(store: GraphStore, config: Config) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            write_phase: Mutex::new(()),
            closed: AtomicBool::new(false),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> Arc<RwLock<GraphStore>> {
        Arc::clone(&self.store)
    }

    fn ensure_open(&self) -> ServiceResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(ServiceError::Unavailable)
        } else {
            Ok(())
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Refuse every later call with [`ServiceError::Unavailable`]
    pub async fn shutdown(&self) {
        let _phase = self.write_phase.lock().await;
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("Graph service shut down");
        }
    }

    // ============================================================
    // Write phases
    // ============================================================

    pub async fn ensure_schema(&self) -> ServiceResult<SchemaReport> {
        self.ensure_open()?;
        let _phase = self.write_phase.lock().await;
        let mut store = self.store.write().await;
        Ok(schema::ensure_schema(&mut store)?)
    }

    pub async fn load_reference_data(&self, dataset: &ReferenceDataset) -> ServiceResult<LoadReport> {
        self.ensure_open()?;
        let _phase = self.write_phase.lock().await;
        let mut store = self.store.write().await;
        Ok(loader::load_reference_data(&mut store, dataset)?)
    }

    pub async fn load_patients(&self, patients: &[PatientRecord]) -> ServiceResult<LoadReport> {
        self.ensure_open()?;
        let _phase = self.write_phase.lock().await;
        let mut store = self.store.write().await;
        Ok(loader::load_patients(&mut store, patients)?)
    }

    pub async fn remove_patients(&self) -> ServiceResult<usize> {
        self.ensure_open()?;
        let _phase = self.write_phase.lock().await;
        let mut store = self.store.write().await;
        Ok(loader::remove_patients(&mut store))
    }

    pub async fn recompute_hubs(&self) -> ServiceResult<HubSummary> {
        self.ensure_open()?;
        let _phase = self.write_phase.lock().await;
        let mut store = self.store.write().await;
        Ok(derived::recompute_hub_labels(&mut store, self.config.hub_threshold)?)
    }

    /// Schema, reference data, patients, then hub labels, as one phase
    pub async fn bootstrap(
        &self,
        dataset: &ReferenceDataset,
        patients: &[PatientRecord],
    ) -> ServiceResult<BootstrapReport> {
        self.ensure_open()?;
        let _phase = self.write_phase.lock().await;
        self.bootstrap_locked(dataset, patients).await
    }

    async fn bootstrap_locked(
        &self,
        dataset: &ReferenceDataset,
        patients: &[PatientRecord],
    ) -> ServiceResult<BootstrapReport> {
        let schema = schema::ensure_schema(&mut *self.store.write().await)?;
        let reference = loader::load_reference_data(&mut *self.store.write().await, dataset)?;
        let patients = loader::load_patients(&mut *self.store.write().await, patients)?;
        let hubs = derived::recompute_hub_labels(&mut *self.store.write().await, self.config.hub_threshold)?;

        let rejected = reference.rejections.len() + patients.rejections.len();
        if rejected > 0 {
            warn!("Bootstrap finished with {} rejected records", rejected);
        }
        info!(
            "Bootstrap complete: {} hubs among {} diseases",
            hubs.hubs.len(),
            hubs.diseases
        );
        Ok(BootstrapReport {
            schema,
            reference,
            patients,
            hubs,
        })
    }

    /// Delete every node, edge and schema object
    pub async fn reset(&self) -> ServiceResult<()> {
        self.ensure_open()?;
        let _phase = self.write_phase.lock().await;
        self.store.write().await.clear();
        info!("Graph reset");
        Ok(())
    }

    /// Reset followed by bootstrap, with no other writer in between
    pub async fn reload(
        &self,
        dataset: &ReferenceDataset,
        patients: &[PatientRecord],
    ) -> ServiceResult<BootstrapReport> {
        self.ensure_open()?;
        let _phase = self.write_phase.lock().await;
        self.store.write().await.clear();
        self.bootstrap_locked(dataset, patients).await
    }

    // ============================================================
    // Reads
    // ============================================================

    /// Project the current graph for analysis; the lock is released on return
    pub async fn analytics(&self) -> ServiceResult<AnalyticsEngine> {
        self.ensure_open()?;
        let store = self.store.read().await;
        Ok(AnalyticsEngine::new(&store, &self.config.analytics))
    }

    pub async fn run(&self, kind: AnalysisKind) -> ServiceResult<ResultSet> {
        Ok(self.analytics().await?.run(kind)?)
    }

    pub async fn statistics(&self) -> ServiceResult<GraphStatistics> {
        self.ensure_open()?;
        Ok(self.store.read().await.statistics())
    }

    pub async fn system_burden(&self, system: &str) -> ServiceResult<Option<SystemBurden>> {
        self.ensure_open()?;
        Ok(derived::system_burden(&*self.store.read().await, system))
    }

    // ============================================================
    // Snapshots
    // ============================================================

    fn snapshot_path(&self) -> ServiceResult<PathBuf> {
        self.config.snapshot_path.clone().ok_or(ServiceError::NoSnapshotPath)
    }

    pub async fn save_snapshot(&self) -> ServiceResult<SnapshotInfo> {
        self.ensure_open()?;
        let path = self.snapshot_path()?;
        let store = self.store.read().await;
        Ok(persistence::save_snapshot(&store, path)?)
    }

    /// Replace the graph with the configured snapshot and re-declare the schema
    pub async fn restore_snapshot(&self) -> ServiceResult<SnapshotInfo> {
        self.ensure_open()?;
        let path = self.snapshot_path()?;
        let _phase = self.write_phase.lock().await;
        let mut store = self.store.write().await;
        let restored = persistence::restore_into(&mut store, path)?;
        schema::ensure_schema(&mut store)?;
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample;

    #[tokio::test]
    async fn test_bootstrap_then_read() {
        let service = GraphService::new(Config::default());
        let report = service
            .bootstrap(&sample::reference_dataset(), &sample::patients())
            .await
            .unwrap();
        assert!(report.reference.is_clean());
        assert_eq!(report.hubs.hubs[0], sample::T2DM);

        let stats = service.statistics().await.unwrap();
        assert_eq!(stats.label("Disease"), 16);
        assert_eq!(stats.label("Patient"), 3);
    }

    #[tokio::test]
    async fn test_reload_is_stable() {
        let service = GraphService::new(Config::default());
        service
            .bootstrap(&sample::reference_dataset(), &sample::patients())
            .await
            .unwrap();
        let before = service.statistics().await.unwrap();
        service
            .reload(&sample::reference_dataset(), &sample::patients())
            .await
            .unwrap();
        assert_eq!(service.statistics().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_calls_fail_after_shutdown() {
        let service = GraphService::new(Config::default());
        service.shutdown().await;
        assert!(service.is_closed());
        assert!(matches!(service.statistics().await, Err(ServiceError::Unavailable)));
        assert!(matches!(
            service.load_patients(&sample::patients()).await,
            Err(ServiceError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn test_snapshot_requires_path() {
        let service = GraphService::new(Config::default());
        assert!(matches!(service.save_snapshot().await, Err(ServiceError::NoSnapshotPath)));
    }
}
