use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coordinate::haversine_distance;
use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId};
use crate::weight::EdgeWeight;

/// Relative tolerance under which two path costs count as equal.
const COST_TIE_TOLERANCE: f64 = 1e-9;

/// Supported shortest-path algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RouteAlgorithm {
    /// Dijkstra's algorithm.
    #[default]
    Dijkstra,
    /// A* guided by a great-circle lower bound.
    #[serde(rename = "a-star")]
    AStar,
}

impl fmt::Display for RouteAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RouteAlgorithm::Dijkstra => "dijkstra",
            RouteAlgorithm::AStar => "a-star",
        };
        f.write_str(value)
    }
}

/// Ordered, non-empty sequence of node ids from origin to destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Route(Vec<NodeId>);

impl Route {
    /// Wrap a node sequence; `None` when it is empty.
    pub fn new(nodes: Vec<NodeId>) -> Option<Self> {
        if nodes.is_empty() {
            None
        } else {
            Some(Self(nodes))
        }
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.0
    }

    pub fn origin(&self) -> NodeId {
        self.0[0]
    }

    pub fn destination(&self) -> NodeId {
        self.0[self.0.len() - 1]
    }

    /// Number of edges traversed.
    pub fn hop_count(&self) -> usize {
        self.0.len() - 1
    }

    pub fn into_nodes(self) -> Vec<NodeId> {
        self.0
    }
}

/// Find the cheapest route from `origin` to `destination`.
///
/// Fails with [`Error::UnknownNode`] when an endpoint is missing from the graph
/// and with [`Error::NoPath`] when the destination is unreachable.
pub fn solve<W>(
    graph: &Graph,
    origin: NodeId,
    destination: NodeId,
    algorithm: RouteAlgorithm,
    weight: &W,
) -> Result<Route>
where
    W: EdgeWeight + ?Sized,
{
    checked_route(graph, origin, destination, || match algorithm {
        RouteAlgorithm::Dijkstra => shortest_path_dijkstra(graph, origin, destination, weight),
        RouteAlgorithm::AStar => shortest_path_a_star(graph, origin, destination, weight),
    })
}

/// Validate both endpoints, run `search` and wrap its result as a [`Route`].
pub(crate) fn checked_route<S>(
    graph: &Graph,
    origin: NodeId,
    destination: NodeId,
    search: S,
) -> Result<Route>
where
    S: FnOnce() -> Option<Vec<NodeId>>,
{
    for id in [origin, destination] {
        if graph.node(id).is_none() {
            return Err(Error::UnknownNode { id });
        }
    }

    search().and_then(Route::new).ok_or(Error::NoPath {
        origin,
        destination,
    })
}

/// Run Dijkstra's algorithm using `weight` to score edges.
pub fn shortest_path_dijkstra<W>(
    graph: &Graph,
    origin: NodeId,
    destination: NodeId,
    weight: &W,
) -> Option<Vec<NodeId>>
where
    W: EdgeWeight + ?Sized,
{
    search(graph, origin, destination, weight, |_| 0.0)
}

/// Run A* search with a great-circle heuristic scaled to stay consistent
/// with `weight`.
pub fn shortest_path_a_star<W>(
    graph: &Graph,
    origin: NodeId,
    destination: NodeId,
    weight: &W,
) -> Option<Vec<NodeId>>
where
    W: EdgeWeight + ?Sized,
{
    let goal = graph.node(destination)?.coordinate;
    let scale = heuristic_scale(graph, weight);
    search(graph, origin, destination, weight, |id| {
        graph
            .node(id)
            .map(|node| scale * haversine_distance(&node.coordinate, &goal))
            .unwrap_or(0.0)
    })
}

/// Total cost of a route, taking the cheapest parallel edge on every hop.
///
/// Returns `None` when two consecutive nodes are not joined by an edge.
pub fn route_cost<W>(graph: &Graph, nodes: &[NodeId], weight: &W) -> Option<f64>
where
    W: EdgeWeight + ?Sized,
{
    nodes.windows(2).try_fold(0.0, |total, pair| {
        graph
            .outgoing(pair[0])
            .filter(|edge| edge.to == pair[1])
            .map(|edge| weight.weight(edge))
            .min_by(f64::total_cmp)
            .map(|cost| total + cost)
    })
}

/// Largest factor `s` such that `s * great_circle(u, v) <= weight(u -> v)` for
/// every edge. Multiplying the straight-line distance to the goal by `s` gives
/// a lower bound on the remaining cost that never overestimates, whatever the
/// weight function measures.
fn heuristic_scale<W>(graph: &Graph, weight: &W) -> f64
where
    W: EdgeWeight + ?Sized,
{
    let mut scale = f64::INFINITY;
    for edge in graph.edges() {
        let (Some(from), Some(to)) = (graph.node(edge.from), graph.node(edge.to)) else {
            continue;
        };
        let distance = haversine_distance(&from.coordinate, &to.coordinate);
        if distance <= f64::EPSILON {
            continue;
        }
        scale = scale.min(weight.weight(edge) / distance);
    }

    if scale.is_finite() && scale > 0.0 {
        // Shave off rounding error so the bound stays consistent.
        scale * (1.0 - 1e-9)
    } else {
        0.0
    }
}

fn search<W, H>(
    graph: &Graph,
    origin: NodeId,
    destination: NodeId,
    weight: &W,
    heuristic: H,
) -> Option<Vec<NodeId>>
where
    W: EdgeWeight + ?Sized,
    H: Fn(NodeId) -> f64,
{
    graph.node(origin)?;
    if origin == destination {
        return Some(vec![origin]);
    }

    let mut costs: HashMap<NodeId, f64> = HashMap::new();
    let mut parents: HashMap<NodeId, NodeId> = HashMap::new();
    let mut settled: HashSet<NodeId> = HashSet::new();
    let mut queue = BinaryHeap::new();

    costs.insert(origin, 0.0);
    queue.push(QueueEntry::new(origin, 0.0, heuristic(origin)));

    while let Some(entry) = queue.pop() {
        if !settled.insert(entry.node) {
            continue;
        }
        let current_cost = costs[&entry.node];

        if entry.node == destination {
            return Some(reconstruct_path(&parents, origin, destination));
        }

        for edge in graph.outgoing(entry.node) {
            let next = edge.to;
            if settled.contains(&next) {
                continue;
            }

            let next_cost = current_cost + weight.weight(edge);
            match costs.get(&next).copied() {
                Some(known) if is_tie(next_cost, known) => {
                    // Equal-cost alternative: keep the lexicographically
                    // smaller node sequence. Both predecessors are settled.
                    let Some(&incumbent) = parents.get(&next) else {
                        continue;
                    };
                    if incumbent != entry.node
                        && reconstruct_path(&parents, origin, entry.node)
                            < reconstruct_path(&parents, origin, incumbent)
                    {
                        parents.insert(next, entry.node);
                    }
                }
                Some(known) if next_cost >= known => {}
                _ => {
                    costs.insert(next, next_cost);
                    parents.insert(next, entry.node);
                    queue.push(QueueEntry::new(next, next_cost, heuristic(next)));
                }
            }
        }
    }

    None
}

fn is_tie(a: f64, b: f64) -> bool {
    (a - b).abs() <= COST_TIE_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

fn reconstruct_path(
    parents: &HashMap<NodeId, NodeId>,
    origin: NodeId,
    destination: NodeId,
) -> Vec<NodeId> {
    let mut path = vec![destination];
    let mut current = destination;
    while current != origin {
        match parents.get(&current) {
            Some(&parent) => {
                path.push(parent);
                current = parent;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: NodeId,
    cost: FloatOrd,
    estimate: FloatOrd,
}

impl QueueEntry {
    fn new(node: NodeId, cost: f64, heuristic: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
            estimate: FloatOrd(cost + heuristic),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by estimate.
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.cost.cmp(&self.cost))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
