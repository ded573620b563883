//! Route planning strategies.
//!
//! Each [`RoutePlanner`] wraps one search algorithm so [`super::plan_route`]
//! never has to match on [`RouteAlgorithm`] itself.

use crate::error::Result;
use crate::graph::{Graph, NodeId};
use crate::path::{
    checked_route, shortest_path_a_star, shortest_path_dijkstra, Route, RouteAlgorithm,
};
use crate::weight::EdgeWeight;

/// Trait for route planning strategies.
pub trait RoutePlanner: Send + Sync {
    /// The algorithm identifier for this planner.
    fn algorithm(&self) -> RouteAlgorithm;

    /// Run the search. Returns `None` when `goal` is unreachable.
    fn find_path(
        &self,
        graph: &Graph,
        start: NodeId,
        goal: NodeId,
        weight: &dyn EdgeWeight,
    ) -> Option<Vec<NodeId>>;

    /// Run the search and report missing endpoints or unreachable goals as errors.
    fn plan(
        &self,
        graph: &Graph,
        start: NodeId,
        goal: NodeId,
        weight: &dyn EdgeWeight,
    ) -> Result<Route> {
        checked_route(graph, start, goal, || self.find_path(graph, start, goal, weight))
    }
}

/// Dijkstra's algorithm planner.
#[derive(Debug, Clone, Copy, Default)]
pub struct DijkstraPlanner;

impl RoutePlanner for DijkstraPlanner {
    fn algorithm(&self) -> RouteAlgorithm {
        RouteAlgorithm::Dijkstra
    }

    fn find_path(
        &self,
        graph: &Graph,
        start: NodeId,
        goal: NodeId,
        weight: &dyn EdgeWeight,
    ) -> Option<Vec<NodeId>> {
        shortest_path_dijkstra(graph, start, goal, weight)
    }
}

/// A* planner with a great-circle heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct AStarPlanner;

impl RoutePlanner for AStarPlanner {
    fn algorithm(&self) -> RouteAlgorithm {
        RouteAlgorithm::AStar
    }

    fn find_path(
        &self,
        graph: &Graph,
        start: NodeId,
        goal: NodeId,
        weight: &dyn EdgeWeight,
    ) -> Option<Vec<NodeId>> {
        shortest_path_a_star(graph, start, goal, weight)
    }
}

/// Select the planner for an algorithm.
pub fn select_planner(algorithm: RouteAlgorithm) -> Box<dyn RoutePlanner> {
    match algorithm {
        RouteAlgorithm::Dijkstra => Box::new(DijkstraPlanner),
        RouteAlgorithm::AStar => Box::new(AStarPlanner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Coordinate;
    use crate::error::Error;
    use crate::graph::{Edge, GraphBuilder, Node};
    use crate::weight::MissionProfile;

    #[test]
    fn select_planner_chooses_correct_type() {
        for algorithm in [RouteAlgorithm::Dijkstra, RouteAlgorithm::AStar] {
            assert_eq!(select_planner(algorithm).algorithm(), algorithm);
        }
    }

    #[test]
    fn plan_reports_unknown_endpoints() {
        let mut builder = GraphBuilder::new();
        builder.add_node(Node {
            id: 1,
            coordinate: Coordinate::new(0.0, 0.0).unwrap(),
        });
        builder.add_node(Node {
            id: 2,
            coordinate: Coordinate::new(0.0, 0.01).unwrap(),
        });
        builder.add_edge(Edge::new(1, 2, 1_000.0));
        let graph = builder.build();

        let planner = DijkstraPlanner;
        let err = planner
            .plan(&graph, 1, 9, &MissionProfile::Stealth)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownNode { id: 9 }));

        let err = AStarPlanner
            .plan(&graph, 2, 1, &MissionProfile::Stealth)
            .unwrap_err();
        assert!(err.is_no_path());
    }
}
