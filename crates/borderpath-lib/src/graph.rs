use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coordinate::{haversine_distance, BoundingRegion, Coordinate};

/// Opaque node identifier. Overpass graphs reuse OpenStreetMap node ids.
pub type NodeId = i64;

/// Speed used when neither the edge, its road class nor the graph offer one.
const FALLBACK_SPEED_KPH: f64 = 30.0;

/// Typical free-flow speeds (km/h) per OSM `highway` class.
static HIGHWAY_SPEEDS_KPH: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("motorway", 100.0),
        ("motorway_link", 60.0),
        ("trunk", 80.0),
        ("trunk_link", 50.0),
        ("primary", 60.0),
        ("primary_link", 40.0),
        ("secondary", 50.0),
        ("secondary_link", 40.0),
        ("tertiary", 40.0),
        ("tertiary_link", 30.0),
        ("unclassified", 30.0),
        ("residential", 30.0),
        ("living_street", 10.0),
        ("service", 20.0),
        ("road", 30.0),
        ("track", 20.0),
        ("path", 5.0),
        ("footway", 5.0),
        ("bridleway", 5.0),
        ("cycleway", 15.0),
        ("steps", 2.0),
        ("pedestrian", 5.0),
    ])
});

/// Graph vertex with its geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub coordinate: Coordinate,
}

/// Directed road segment. Two-way roads are stored as one edge per direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    /// Segment length in meters.
    pub length_m: f64,
    /// Posted or imputed speed.
    pub speed_kph: Option<f64>,
    /// Seconds needed to traverse the segment at `speed_kph`.
    pub travel_time_s: Option<f64>,
    /// OSM road class (`primary`, `track`, ...), when known.
    pub highway: Option<String>,
}

impl Edge {
    /// Create an edge with only a length.
    pub fn new(from: NodeId, to: NodeId, length_m: f64) -> Self {
        Self {
            from,
            to,
            length_m,
            speed_kph: None,
            travel_time_s: None,
            highway: None,
        }
    }

    pub fn with_speed(mut self, speed_kph: f64) -> Self {
        self.speed_kph = Some(speed_kph);
        self
    }

    pub fn with_highway(mut self, highway: impl Into<String>) -> Self {
        self.highway = Some(highway.into());
        self
    }

    /// Seconds needed to traverse the edge, derived from length and speed.
    ///
    /// Returns `None` when no usable speed is attached.
    pub fn derived_travel_time(&self) -> Option<f64> {
        self.travel_time_s.or_else(|| {
            self.speed_kph
                .filter(|speed| speed.is_finite() && *speed > 0.0)
                .map(|speed| self.length_m / (speed / 3.6))
        })
    }
}

/// Road network scoped to a single routing request.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: HashMap<NodeId, Node>,
    edges: Vec<Edge>,
    adjacency: HashMap<NodeId, Vec<usize>>,
}

impl Graph {
    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Iterate over all nodes (unordered).
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Outgoing edges of a node, including parallel edges, in insertion order.
    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.adjacency
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(move |&index| &self.edges[index])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True when the graph has no nodes or no edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() || self.edges.is_empty()
    }

    /// Sub-graph with the nodes inside `region` and the edges joining them.
    pub fn clip(&self, region: &BoundingRegion) -> Graph {
        let mut builder = GraphBuilder::new();
        let mut ids: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|node| region.contains(&node.coordinate))
            .map(|node| node.id)
            .collect();
        ids.sort_unstable();
        for id in &ids {
            builder.add_node(self.nodes[id]);
        }
        for edge in &self.edges {
            if builder.contains(edge.from) && builder.contains(edge.to) {
                builder.add_edge(edge.clone());
            }
        }
        builder.build()
    }

    /// Fill in missing edge speeds.
    ///
    /// Uses, in order: the mean known speed of the edge's road class, the
    /// default speed for that class, the mean of all known speeds, and finally
    /// a fixed fallback.
    pub fn add_edge_speeds(&mut self) {
        let mut per_class: HashMap<String, (f64, usize)> = HashMap::new();
        let mut total = (0.0, 0usize);
        for edge in &self.edges {
            let Some(speed) = edge.speed_kph.filter(|s| s.is_finite() && *s > 0.0) else {
                continue;
            };
            total.0 += speed;
            total.1 += 1;
            if let Some(class) = &edge.highway {
                let entry = per_class.entry(class.clone()).or_default();
                entry.0 += speed;
                entry.1 += 1;
            }
        }

        let global_mean = (total.1 > 0).then(|| total.0 / total.1 as f64);
        let mut imputed = 0usize;
        for edge in &mut self.edges {
            if edge.speed_kph.is_some_and(|s| s.is_finite() && s > 0.0) {
                continue;
            }
            let class_speed = edge.highway.as_deref().and_then(|class| {
                per_class
                    .get(class)
                    .map(|(sum, count)| sum / *count as f64)
                    .or_else(|| HIGHWAY_SPEEDS_KPH.get(class).copied())
            });
            edge.speed_kph = Some(
                class_speed
                    .or(global_mean)
                    .unwrap_or(FALLBACK_SPEED_KPH),
            );
            imputed += 1;
        }

        debug!(imputed, edges = self.edges.len(), "imputed edge speeds");
    }

    /// Compute `travel_time_s` for every edge that has a speed.
    pub fn add_travel_times(&mut self) {
        for edge in &mut self.edges {
            edge.travel_time_s = None;
            edge.travel_time_s = edge.derived_travel_time();
        }
    }
}

/// Incremental constructor for [`Graph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a node with this id has been added.
    pub fn contains(&self, id: NodeId) -> bool {
        self.graph.nodes.contains_key(&id)
    }

    /// Insert (or replace) a node.
    pub fn add_node(&mut self, node: Node) -> &mut Self {
        self.graph.adjacency.entry(node.id).or_default();
        self.graph.nodes.insert(node.id, node);
        self
    }

    /// Append a directed edge. Edges referencing unknown nodes are dropped.
    pub fn add_edge(&mut self, edge: Edge) -> &mut Self {
        if !self.contains(edge.from) || !self.contains(edge.to) {
            debug!(from = edge.from, to = edge.to, "dropping edge with unknown endpoint");
            return self;
        }
        let index = self.graph.edges.len();
        self.graph
            .adjacency
            .entry(edge.from)
            .or_default()
            .push(index);
        self.graph.edges.push(edge);
        self
    }

    /// Append a two-way segment as a pair of directed edges.
    pub fn add_two_way(&mut self, edge: Edge) -> &mut Self {
        let mut reverse = edge.clone();
        std::mem::swap(&mut reverse.from, &mut reverse.to);
        self.add_edge(edge);
        self.add_edge(reverse)
    }

    /// Append an edge whose length is the haversine distance between its ends.
    pub fn add_measured_edge(&mut self, from: NodeId, to: NodeId) -> &mut Self {
        let length = match (self.graph.nodes.get(&from), self.graph.nodes.get(&to)) {
            (Some(a), Some(b)) => haversine_distance(&a.coordinate, &b.coordinate),
            _ => return self,
        };
        self.add_edge(Edge::new(from, to, length))
    }

    pub fn build(self) -> Graph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: NodeId, lat: f64, lon: f64) -> Node {
        Node {
            id,
            coordinate: Coordinate::new(lat, lon).unwrap(),
        }
    }

    fn sample() -> Graph {
        let mut builder = GraphBuilder::new();
        builder
            .add_node(node(1, 10.0, 10.0))
            .add_node(node(2, 10.01, 10.0))
            .add_node(node(3, 11.0, 10.0));
        builder.add_two_way(Edge::new(1, 2, 1_000.0).with_highway("primary"));
        builder.add_edge(Edge::new(2, 3, 5_000.0).with_highway("track"));
        builder.build()
    }

    #[test]
    fn two_way_segments_become_two_edges() {
        let graph = sample();
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.outgoing(1).map(|e| e.to).collect::<Vec<_>>(), vec![2]);
        assert_eq!(graph.outgoing(2).map(|e| e.to).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(graph.outgoing(3).count(), 0);
    }

    #[test]
    fn edges_with_unknown_endpoints_are_dropped() {
        let mut builder = GraphBuilder::new();
        builder.add_node(node(1, 0.0, 0.0));
        builder.add_edge(Edge::new(1, 99, 10.0));
        let graph = builder.build();
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn clip_keeps_only_inner_nodes_and_edges() {
        let graph = sample();
        let region = BoundingRegion {
            north: 10.5,
            south: 9.5,
            east: 10.5,
            west: 9.5,
        };
        let clipped = graph.clip(&region);
        assert_eq!(clipped.node_count(), 2);
        assert_eq!(clipped.edge_count(), 2);
        assert!(clipped.node(3).is_none());
    }

    #[test]
    fn speeds_fall_back_through_class_defaults() {
        let mut graph = sample();
        graph.add_edge_speeds();
        let speeds: Vec<_> = graph.edges().iter().map(|e| e.speed_kph).collect();
        assert_eq!(speeds, vec![Some(60.0), Some(60.0), Some(20.0)]);
    }

    #[test]
    fn known_class_speeds_are_averaged() {
        let mut builder = GraphBuilder::new();
        builder.add_node(node(1, 0.0, 0.0)).add_node(node(2, 0.0, 0.01));
        builder.add_edge(Edge::new(1, 2, 100.0).with_highway("primary").with_speed(40.0));
        builder.add_edge(Edge::new(2, 1, 100.0).with_highway("primary").with_speed(80.0));
        builder.add_edge(Edge::new(1, 2, 100.0).with_highway("primary"));
        builder.add_edge(Edge::new(2, 1, 100.0));
        let mut graph = builder.build();
        graph.add_edge_speeds();

        assert_eq!(graph.edges()[2].speed_kph, Some(60.0));
        // no class: global mean of known speeds
        assert_eq!(graph.edges()[3].speed_kph, Some(60.0));
    }

    #[test]
    fn travel_time_is_length_over_speed() {
        let mut graph = sample();
        graph.add_edge_speeds();
        graph.add_travel_times();
        let first = &graph.edges()[0];
        // 1km at 60km/h is one minute
        assert!((first.travel_time_s.unwrap() - 60.0).abs() < 1e-9);
    }
}
