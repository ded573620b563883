//! Road network sources.
//!
//! A [`GraphProvider`] turns a [`BoundingRegion`] into a fresh [`Graph`]. The
//! routing pipeline never shares a graph between requests; providers that
//! cache data hand out clones.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::coordinate::{haversine_distance, BoundingRegion, Coordinate};
use crate::error::{Error, Result};
use crate::graph::{Edge, Graph, GraphBuilder, Node, NodeId};

/// Source of road network graphs for a geographic region.
pub trait GraphProvider: Send + Sync {
    /// Fetch the graph covering `region`.
    fn fetch(&self, region: &BoundingRegion) -> Result<Graph>;

    /// Short label used in logs.
    fn name(&self) -> &'static str;
}

impl<P: GraphProvider + ?Sized> GraphProvider for &P {
    fn fetch(&self, region: &BoundingRegion) -> Result<Graph> {
        (**self).fetch(region)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// On-disk JSON representation of a road network.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkFile {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub from: NodeId,
    pub to: NodeId,
    /// Defaults to the great-circle distance between the endpoints.
    #[serde(default)]
    pub length_m: Option<f64>,
    #[serde(default)]
    pub speed_kph: Option<f64>,
    #[serde(default)]
    pub highway: Option<String>,
    /// One-way segments only get the `from -> to` edge.
    #[serde(default)]
    pub oneway: bool,
}

impl NetworkFile {
    /// Build a validated graph from the file contents.
    pub fn into_graph(self) -> Result<Graph> {
        let mut builder = GraphBuilder::new();
        for node in &self.nodes {
            let coordinate = Coordinate::new(node.lat, node.lon)?;
            builder.add_node(Node {
                id: node.id,
                coordinate,
            });
        }

        let positions: HashMap<NodeId, Coordinate> = self
            .nodes
            .iter()
            .filter_map(|n| Coordinate::new(n.lat, n.lon).ok().map(|c| (n.id, c)))
            .collect();

        for edge in self.edges {
            let (Some(a), Some(b)) = (positions.get(&edge.from), positions.get(&edge.to)) else {
                return Err(Error::ProviderData {
                    message: format!(
                        "edge {} -> {} references an unknown node",
                        edge.from, edge.to
                    ),
                });
            };
            let length_m = edge
                .length_m
                .unwrap_or_else(|| haversine_distance(a, b));
            if !length_m.is_finite() || length_m < 0.0 {
                return Err(Error::ProviderData {
                    message: format!(
                        "edge {} -> {} has invalid length {}",
                        edge.from, edge.to, length_m
                    ),
                });
            }

            let directed = Edge {
                from: edge.from,
                to: edge.to,
                length_m,
                speed_kph: edge.speed_kph,
                travel_time_s: None,
                highway: edge.highway,
            };
            if edge.oneway {
                builder.add_edge(directed);
            } else {
                builder.add_two_way(directed);
            }
        }

        Ok(builder.build())
    }

    /// Snapshot an existing graph. Every directed edge is written as one-way.
    pub fn from_graph(graph: &Graph) -> Self {
        let mut nodes: Vec<NetworkNode> = graph
            .nodes()
            .map(|node| NetworkNode {
                id: node.id,
                lat: node.coordinate.latitude,
                lon: node.coordinate.longitude,
            })
            .collect();
        nodes.sort_by_key(|node| node.id);

        let edges = graph
            .edges()
            .iter()
            .map(|edge| NetworkEdge {
                from: edge.from,
                to: edge.to,
                length_m: Some(edge.length_m),
                speed_kph: edge.speed_kph,
                highway: edge.highway.clone(),
                oneway: true,
            })
            .collect();

        Self { nodes, edges }
    }
}

/// Provider backed by a road network loaded once from JSON.
///
/// Each fetch returns a new graph clipped to the requested region.
#[derive(Debug, Clone)]
pub struct StaticGraphProvider {
    graph: Graph,
    source: Option<PathBuf>,
}

impl StaticGraphProvider {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            source: None,
        }
    }

    /// Load a [`NetworkFile`] from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut provider = Self::from_reader(BufReader::new(file))?;
        provider.source = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            nodes = provider.graph.node_count(),
            edges = provider.graph.edge_count(),
            "loaded static road network"
        );
        Ok(provider)
    }

    /// Load a [`NetworkFile`] from a reader (e.g., file or in-memory buffer).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let network: NetworkFile = serde_json::from_reader(reader)?;
        Ok(Self::new(network.into_graph()?))
    }

    /// Path the network was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }
}

impl GraphProvider for StaticGraphProvider {
    fn fetch(&self, region: &BoundingRegion) -> Result<Graph> {
        let graph = self.graph.clip(region);
        debug!(
            %region,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "clipped static network"
        );
        Ok(graph)
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// In-memory region-keyed cache in front of another provider.
///
/// Only non-empty graphs are cached. Callers invalidate entries explicitly.
#[derive(Debug)]
pub struct CachingProvider<P> {
    inner: P,
    entries: Mutex<HashMap<String, Graph>>,
}

impl<P: GraphProvider> CachingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Drop the cached graph for `region`, returning whether one was present.
    pub fn invalidate(&self, region: &BoundingRegion) -> bool {
        self.lock().remove(&region.cache_key()).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Graph>> {
        // A poisoned map only ever holds complete graphs, so keep using it.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<P: GraphProvider> GraphProvider for CachingProvider<P> {
    fn fetch(&self, region: &BoundingRegion) -> Result<Graph> {
        let key = region.cache_key();
        if let Some(graph) = self.lock().get(&key) {
            debug!(key = %key, "graph cache hit");
            return Ok(graph.clone());
        }

        let graph = self.inner.fetch(region)?;
        if !graph.is_empty() {
            self.lock().insert(key, graph.clone());
        }
        Ok(graph)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
