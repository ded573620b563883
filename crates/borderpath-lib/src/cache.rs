//! Persistent region-keyed graph cache.
//!
//! # Snapshot Format
//!
//! ```text
//! Header (16 bytes):
//!   - Magic: b"BPGS" (4 bytes)
//!   - Version: u8 (1 byte)
//!   - Flags: u8 (1 byte) - bit 0: edges carry speeds
//!   - Node count: u32 (4 bytes)
//!   - Edge count: u32 (4 bytes)
//!   - Reserved: 2 bytes
//!
//! Body:
//!   - postcard-serialized nodes and edges
//!   - zstd compressed
//!
//! Footer (32 bytes):
//!   - SHA-256 checksum of compressed body
//! ```

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::coordinate::BoundingRegion;
use crate::error::{Error, Result};
use crate::graph::{Edge, Graph, GraphBuilder, Node};
use crate::provider::GraphProvider;

const CACHE_DIR_NAME: &str = "borderpath_graphs";
const CACHE_DIR_ENV: &str = "BORDERPATH_CACHE_DIR";

const SNAPSHOT_MAGIC: &[u8; 4] = b"BPGS";
const SNAPSHOT_VERSION: u8 = 1;
const FLAG_HAS_SPEEDS: u8 = 0x01;
const HEADER_SIZE: usize = 16;
const CHECKSUM_SIZE: usize = 32;
const COMPRESSION_LEVEL: i32 = 3;
const SNAPSHOT_EXTENSION: &str = "bpgs";

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotBody {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

/// Serialized form of a [`Graph`].
pub struct GraphSnapshot;

impl GraphSnapshot {
    /// Write `graph` to `path` atomically.
    pub fn save(graph: &Graph, path: &Path) -> Result<()> {
        let mut nodes: Vec<Node> = graph.nodes().copied().collect();
        nodes.sort_unstable_by_key(|node| node.id);
        let body = SnapshotBody {
            nodes,
            edges: graph.edges().to_vec(),
        };

        let serialized = postcard::to_allocvec(&body).map_err(|e| Error::SnapshotSerialize {
            message: format!("postcard serialization failed: {}", e),
        })?;
        let compressed =
            zstd::encode_all(serialized.as_slice(), COMPRESSION_LEVEL).map_err(|e| {
                Error::SnapshotSerialize {
                    message: format!("zstd compression failed: {}", e),
                }
            })?;
        let checksum = Sha256::digest(&compressed);

        let has_speeds = body.edges.iter().any(|edge| edge.speed_kph.is_some());
        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(SNAPSHOT_MAGIC);
        header[4] = SNAPSHOT_VERSION;
        header[5] = if has_speeds { FLAG_HAS_SPEEDS } else { 0 };
        header[6..10].copy_from_slice(&(body.nodes.len() as u32).to_le_bytes());
        header[10..14].copy_from_slice(&(body.edges.len() as u32).to_le_bytes());

        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(&header)?;
        tmp.write_all(&compressed)?;
        tmp.write_all(&checksum)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|err| err.error)?;

        debug!(
            path = %path.display(),
            nodes = body.nodes.len(),
            edges = body.edges.len(),
            compressed_size = compressed.len(),
            "graph snapshot saved"
        );
        Ok(())
    }

    /// Read a graph previously written by [`GraphSnapshot::save`].
    pub fn load(path: &Path) -> Result<Graph> {
        let load_error = |message: String| Error::SnapshotLoad {
            path: path.to_path_buf(),
            message,
        };

        let bytes = fs::read(path).map_err(|e| load_error(format!("failed to read file: {}", e)))?;
        if bytes.len() < HEADER_SIZE + CHECKSUM_SIZE {
            return Err(load_error("file is truncated".to_string()));
        }

        let (header, rest) = bytes.split_at(HEADER_SIZE);
        if &header[0..4] != SNAPSHOT_MAGIC {
            return Err(load_error("invalid magic bytes".to_string()));
        }
        if header[4] != SNAPSHOT_VERSION {
            return Err(load_error(format!(
                "unsupported version {} (expected {})",
                header[4], SNAPSHOT_VERSION
            )));
        }
        let node_count = u32::from_le_bytes([header[6], header[7], header[8], header[9]]);
        let edge_count = u32::from_le_bytes([header[10], header[11], header[12], header[13]]);

        let (compressed, stored_checksum) = rest.split_at(rest.len() - CHECKSUM_SIZE);
        if Sha256::digest(compressed).as_slice() != stored_checksum {
            return Err(load_error(
                "checksum mismatch - file may be corrupted".to_string(),
            ));
        }

        let decompressed = zstd::decode_all(compressed)
            .map_err(|e| load_error(format!("zstd decompression failed: {}", e)))?;
        let body: SnapshotBody = postcard::from_bytes(&decompressed)
            .map_err(|e| load_error(format!("postcard deserialization failed: {}", e)))?;

        if body.nodes.len() != node_count as usize || body.edges.len() != edge_count as usize {
            return Err(load_error(format!(
                "header declares {} nodes/{} edges but body holds {}/{}",
                node_count,
                edge_count,
                body.nodes.len(),
                body.edges.len()
            )));
        }

        let mut builder = GraphBuilder::new();
        for node in body.nodes {
            builder.add_node(node);
        }
        for edge in body.edges {
            builder.add_edge(edge);
        }
        Ok(builder.build())
    }
}

/// Default directory for persisted graph snapshots.
///
/// Honors `BORDERPATH_CACHE_DIR`, falling back to the platform cache directory.
pub fn graph_cache_dir() -> Result<PathBuf> {
    if let Some(override_dir) = env::var_os(CACHE_DIR_ENV) {
        return Ok(PathBuf::from(override_dir));
    }

    let dirs = BaseDirs::new().ok_or(Error::CacheDirsUnavailable)?;
    Ok(dirs.cache_dir().join(CACHE_DIR_NAME))
}

/// Provider decorator persisting fetched graphs as snapshots on disk.
#[derive(Debug)]
pub struct DiskCachingProvider<P> {
    inner: P,
    dir: PathBuf,
}

impl<P: GraphProvider> DiskCachingProvider<P> {
    /// Cache under [`graph_cache_dir`].
    pub fn new(inner: P) -> Result<Self> {
        Ok(Self::with_dir(inner, graph_cache_dir()?))
    }

    pub fn with_dir(inner: P, dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            dir: dir.into(),
        }
    }

    /// Snapshot location for a region.
    pub fn snapshot_path(&self, region: &BoundingRegion) -> PathBuf {
        let file_name = format!(
            "{}-{}.{}",
            self.inner.name(),
            sanitize_component(&region.cache_key()),
            SNAPSHOT_EXTENSION
        );
        self.dir.join(file_name)
    }

    /// Remove the snapshot for `region`, returning whether one existed.
    pub fn invalidate(&self, region: &BoundingRegion) -> Result<bool> {
        let path = self.snapshot_path(region);
        if path.exists() {
            fs::remove_file(&path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: GraphProvider> GraphProvider for DiskCachingProvider<P> {
    fn fetch(&self, region: &BoundingRegion) -> Result<Graph> {
        let path = self.snapshot_path(region);
        if path.exists() {
            match GraphSnapshot::load(&path) {
                Ok(graph) => {
                    debug!(path = %path.display(), "using cached graph snapshot");
                    return Ok(graph);
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load graph snapshot, will refetch"
                    );
                    let _ = fs::remove_file(&path);
                }
            }
        }

        let graph = self.inner.fetch(region)?;
        if !graph.is_empty() {
            match GraphSnapshot::save(&graph, &path) {
                Ok(()) => info!(path = %path.display(), "cached graph snapshot"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to cache graph"),
            }
        }
        Ok(graph)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}
