//! Compressed point-in-time images of the graph
//!
//! A snapshot is a gzip stream holding one bincode-encoded [`Snapshot`].
//! Schema objects are not part of the image; callers re-declare them after
//! restore and the store back-fills indexes from the restored data.

use crate::graph::{Edge, EdgeId, EdgeType, GraphError, GraphStore, Label, Node, NodeId, PropertyMap};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

const FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredNode {
    id: u64,
    labels: Vec<String>,
    properties: PropertyMap,
    created_at: i64,
    updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEdge {
    id: u64,
    source: u64,
    target: u64,
    edge_type: String,
    properties: PropertyMap,
    created_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    /// Unix milliseconds
    taken_at: i64,
    nodes: Vec<StoredNode>,
    edges: Vec<StoredEdge>,
}

/// Counts of what a snapshot wrote or restored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub nodes: usize,
    pub edges: usize,
}

impl From<&Node> for StoredNode {
    fn from(node: &Node) -> Self {
        let mut labels: Vec<String> = node.labels.iter().map(|l| l.as_str().to_string()).collect();
        labels.sort();
        StoredNode {
            id: node.id.as_u64(),
            labels,
            properties: node.properties.clone(),
            created_at: node.created_at,
            updated_at: node.updated_at,
        }
    }
}

impl From<StoredNode> for Node {
    fn from(stored: StoredNode) -> Self {
        Node {
            id: NodeId::new(stored.id),
            labels: stored.labels.into_iter().map(Label::new).collect(),
            properties: stored.properties,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

impl From<&Edge> for StoredEdge {
    fn from(edge: &Edge) -> Self {
        StoredEdge {
            id: edge.id.as_u64(),
            source: edge.source.as_u64(),
            target: edge.target.as_u64(),
            edge_type: edge.edge_type.as_str().to_string(),
            properties: edge.properties.clone(),
            created_at: edge.created_at,
        }
    }
}

impl From<StoredEdge> for Edge {
    fn from(stored: StoredEdge) -> Self {
        Edge {
            id: EdgeId::new(stored.id),
            source: NodeId::new(stored.source),
            target: NodeId::new(stored.target),
            edge_type: EdgeType::new(stored.edge_type),
            properties: stored.properties,
            created_at: stored.created_at,
        }
    }
}

/// Write every node and edge of `store` to `path`, replacing any file there
pub fn save_snapshot(store: &GraphStore, path: impl AsRef<Path>) -> SnapshotResult<SnapshotInfo> {
    let path = path.as_ref();
    let mut nodes: Vec<StoredNode> = store.all_nodes().into_iter().map(StoredNode::from).collect();
    nodes.sort_by_key(|n| n.id);
    let mut edges: Vec<StoredEdge> = store.all_edges().into_iter().map(StoredEdge::from).collect();
    edges.sort_by_key(|e| e.id);

    let snapshot = Snapshot {
        version: FORMAT_VERSION,
        taken_at: chrono::Utc::now().timestamp_millis(),
        nodes,
        edges,
    };
    let info = SnapshotInfo {
        nodes: snapshot.nodes.len(),
        edges: snapshot.edges.len(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(path)?), Compression::default());
    bincode::serialize_into(&mut encoder, &snapshot)?;
    encoder.finish()?.flush()?;

    info!(
        "Saved snapshot of {} nodes and {} edges to {:?}",
        info.nodes, info.edges, path
    );
    Ok(info)
}

/// Rebuild a store from a snapshot written by [`save_snapshot`]
pub fn load_snapshot(path: impl AsRef<Path>) -> SnapshotResult<GraphStore> {
    let mut store = GraphStore::new();
    restore_into(&mut store, path)?;
    Ok(store)
}

/// Replace the contents of `store` with the snapshot at `path`. Declared
/// schema objects are dropped along with the old contents.
pub fn restore_into(store: &mut GraphStore, path: impl AsRef<Path>) -> SnapshotResult<SnapshotInfo> {
    let path = path.as_ref();
    let decoder = GzDecoder::new(BufReader::new(File::open(path)?));
    let snapshot: Snapshot = bincode::deserialize_from(decoder)?;
    if snapshot.version != FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(snapshot.version));
    }
    debug!("Snapshot {:?} taken at {}", path, snapshot.taken_at);

    let info = SnapshotInfo {
        nodes: snapshot.nodes.len(),
        edges: snapshot.edges.len(),
    };
    store.clear();
    for node in snapshot.nodes {
        store.insert_recovered_node(node.into());
    }
    for edge in snapshot.edges {
        store.insert_recovered_edge(edge.into())?;
    }
    store.finish_recovery();

    info!(
        "Restored {} nodes and {} edges from {:?}",
        info.nodes, info.edges, path
    );
    Ok(info)
}
