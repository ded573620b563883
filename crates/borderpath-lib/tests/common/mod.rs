//! Common test utilities and fixture helpers.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use borderpath_lib::{
    BoundingRegion, Coordinate, Edge, Graph, GraphBuilder, GraphProvider, Node, NodeId, Result,
    StaticGraphProvider,
};

/// Path to fixtures directory used by tests (sample network, zone catalog).
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// Provider over `docs/fixtures/sample_network.json`.
#[allow(dead_code)]
pub fn sample_provider() -> StaticGraphProvider {
    StaticGraphProvider::from_path(&fixtures_dir().join("sample_network.json"))
        .expect("load fixture sample_network.json")
}

#[allow(dead_code)]
pub fn coord(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate::new(latitude, longitude).expect("valid test coordinate")
}

/// Build a graph from `(id, lat, lon)` nodes and `(from, to, length, speed)` two-way edges.
#[allow(dead_code)]
pub fn two_way_graph(
    nodes: &[(NodeId, f64, f64)],
    edges: &[(NodeId, NodeId, f64, Option<f64>)],
) -> Graph {
    let mut builder = GraphBuilder::new();
    for &(id, lat, lon) in nodes {
        builder.add_node(Node {
            id,
            coordinate: coord(lat, lon),
        });
    }
    for &(from, to, length, speed) in edges {
        let edge = Edge {
            speed_kph: speed,
            ..Edge::new(from, to, length)
        };
        builder.add_two_way(edge);
    }
    builder.build()
}

/// Provider that records how often it is asked for a graph.
#[allow(dead_code)]
pub struct SpyProvider {
    graph: Graph,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl SpyProvider {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GraphProvider for SpyProvider {
    fn fetch(&self, _region: &BoundingRegion) -> Result<Graph> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.graph.clone())
    }

    fn name(&self) -> &'static str {
        "spy"
    }
}
