//! KD-tree backed nearest-node resolution.
//!
//! Nodes are indexed as points on the unit sphere (k=3). Euclidean chord
//! length between two such points grows monotonically with great-circle
//! distance, so the tree orders candidates exactly like haversine distance
//! does. Candidates that are near-equidistant are re-ranked with
//! [`haversine_distance`] and ties go to the lowest [`NodeId`].

use std::collections::HashSet;

use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use tracing::debug;

use crate::coordinate::{haversine_distance, Coordinate};
use crate::error::{Error, Result};
use crate::graph::{Graph, Node, NodeId};

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

/// Extra squared chord distance admitted when gathering tie candidates.
const TIE_SLACK: f64 = 1e-12;

/// Static index over the nodes of one graph.
pub struct SpatialIndex {
    tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32>,
    nodes: Vec<Node>,
}

impl SpatialIndex {
    /// Index every node of the graph.
    ///
    /// Nodes stacked on exactly the same point are indexed once, under the
    /// lowest id. kiddo cannot hold more than a bucket of identical points.
    pub fn build(graph: &Graph) -> Self {
        let mut nodes: Vec<Node> = graph.nodes().copied().collect();
        nodes.sort_unstable_by_key(|node| node.id);

        let mut tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32> = KdTree::new();
        let mut seen: HashSet<[u64; 3]> = HashSet::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            let point = node.coordinate.to_unit_vector();
            if seen.insert(point.map(f64::to_bits)) {
                tree.add(&point, index);
            }
        }

        debug!(
            node_count = nodes.len(),
            indexed_points = seen.len(),
            "built spatial index"
        );
        Self { tree, nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Closest node to `coordinate` by great-circle distance.
    pub fn nearest(&self, coordinate: &Coordinate) -> Result<NodeId> {
        self.nearest_with_distance(coordinate).map(|(id, _)| id)
    }

    /// Closest node and its distance in meters.
    pub fn nearest_with_distance(&self, coordinate: &Coordinate) -> Result<(NodeId, f64)> {
        if self.nodes.is_empty() {
            return Err(Error::EmptyGraph);
        }

        let point = coordinate.to_unit_vector();
        let best = self.tree.nearest_one::<SquaredEuclidean>(&point);
        let candidates = self
            .tree
            .within::<SquaredEuclidean>(&point, best.distance + TIE_SLACK);

        let winner = candidates
            .iter()
            .map(|neighbour| {
                let node = &self.nodes[neighbour.item];
                (node.id, haversine_distance(coordinate, &node.coordinate))
            })
            .chain(std::iter::once({
                let node = &self.nodes[best.item];
                (node.id, haversine_distance(coordinate, &node.coordinate))
            }))
            .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        winner.ok_or(Error::EmptyGraph)
    }
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("node_count", &self.nodes.len())
            .finish()
    }
}

/// Resolve the node of `graph` closest to `coordinate`.
///
/// Builds a throwaway index; reuse [`SpatialIndex`] when resolving several
/// points against the same graph.
pub fn nearest_node<'g>(graph: &'g Graph, coordinate: &Coordinate) -> Result<&'g Node> {
    if graph.node_count() == 0 {
        return Err(Error::EmptyGraph);
    }
    let id = SpatialIndex::build(graph).nearest(coordinate)?;
    graph.node(id).ok_or(Error::UnknownNode { id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn graph(points: &[(NodeId, f64, f64)]) -> Graph {
        let mut builder = GraphBuilder::new();
        for &(id, lat, lon) in points {
            builder.add_node(Node {
                id,
                coordinate: Coordinate::new(lat, lon).unwrap(),
            });
        }
        builder.build()
    }

    #[test]
    fn empty_graph_is_rejected() {
        let index = SpatialIndex::build(&Graph::default());
        assert!(index.is_empty());
        let query = Coordinate::new(0.0, 0.0).unwrap();
        assert!(matches!(index.nearest(&query), Err(Error::EmptyGraph)));
        assert!(matches!(
            nearest_node(&Graph::default(), &query),
            Err(Error::EmptyGraph)
        ));
    }

    #[test]
    fn picks_the_closest_node() {
        let graph = graph(&[(1, 26.90, 70.00), (2, 26.95, 70.05), (3, 26.92, 70.02)]);
        let query = Coordinate::new(26.949, 70.049).unwrap();
        assert_eq!(nearest_node(&graph, &query).unwrap().id, 2);
    }

    #[test]
    fn equidistant_nodes_resolve_to_lowest_id() {
        let graph = graph(&[(9, 0.0, 0.001), (4, 0.0, -0.001), (7, 0.5, 0.5)]);
        let query = Coordinate::new(0.0, 0.0).unwrap();
        assert_eq!(nearest_node(&graph, &query).unwrap().id, 4);
    }

    #[test]
    fn resolution_is_idempotent() {
        let graph = graph(&[(1, 10.0, 10.0), (2, 10.001, 10.0), (3, 9.999, 10.0)]);
        let index = SpatialIndex::build(&graph);
        let query = Coordinate::new(10.0002, 10.0).unwrap();
        let first = index.nearest(&query).unwrap();
        let second = index.nearest(&query).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, 1);
    }

    #[test]
    fn stacked_nodes_resolve_to_lowest_id() {
        let points: Vec<(NodeId, f64, f64)> = (0..100)
            .map(|offset| (500 - offset, 26.95, 70.05))
            .chain([(1, 26.90, 70.00)])
            .collect();
        let graph = graph(&points);
        let index = SpatialIndex::build(&graph);
        assert_eq!(index.len(), 101);

        let query = Coordinate::new(26.951, 70.051).unwrap();
        assert_eq!(index.nearest(&query).unwrap(), 401);
        let far = Coordinate::new(26.89, 69.99).unwrap();
        assert_eq!(index.nearest(&far).unwrap(), 1);
    }

    #[test]
    fn great_circle_metric_beats_planar_near_poles() {
        // At 80N a degree of longitude is far shorter than a degree of
        // latitude; planar lat/lon distance would pick node 1.
        let graph = graph(&[(1, 80.6, 0.0), (2, 80.0, 0.9)]);
        let query = Coordinate::new(80.0, 0.0).unwrap();
        let (id, meters) = SpatialIndex::build(&graph)
            .nearest_with_distance(&query)
            .unwrap();
        assert_eq!(id, 2);
        assert!(meters < 20_000.0);
    }
}
