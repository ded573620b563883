//! Mission route planning pipeline.
//!
//! This module provides:
//! - [`RouteRequest`] - Start, end, mission and algorithm for one request
//! - [`RoutePlan`] - Planned route with its totals
//! - [`plan_route`] - Fetch, resolve, weight and solve
//! - [`run_mission`] - [`plan_route`] followed by rendering the artifact
//!
//! # Example
//!
//! ```ignore
//! use borderpath_lib::{plan_route, MissionProfile, RouteConfig, RouteRequest};
//!
//! let config = RouteConfig::from_env();
//! let provider = OverpassProvider::new(&config)?;
//! let request = RouteRequest::from_text(start, "26.95, 70.05", MissionProfile::Speed)?;
//! let plan = plan_route(&provider, &request, &config)?;
//! println!("{} hops, {:.0} m", plan.hop_count(), plan.length_m);
//! ```

mod planner;

pub use planner::{select_planner, AStarPlanner, DijkstraPlanner, RoutePlanner};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RouteConfig;
use crate::coordinate::{BoundingRegion, Coordinate};
use crate::error::{Error, Result};
use crate::graph::{Edge, Graph, NodeId};
use crate::path::{Route, RouteAlgorithm};
use crate::provider::GraphProvider;
use crate::render::{RouteArtifact, RouteRenderer};
use crate::spatial::SpatialIndex;
use crate::weight::{EdgeWeight, MissionProfile};

/// One routing request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub start: Coordinate,
    pub end: Coordinate,
    pub mission: MissionProfile,
    pub algorithm: RouteAlgorithm,
}

impl RouteRequest {
    /// Request using the default algorithm.
    pub fn new(start: Coordinate, end: Coordinate, mission: MissionProfile) -> Self {
        Self {
            start,
            end,
            mission,
            algorithm: RouteAlgorithm::default(),
        }
    }

    /// Request whose destination is typed as `"lat, lon"`.
    pub fn from_text(start: Coordinate, end: &str, mission: MissionProfile) -> Result<Self> {
        Ok(Self::new(start, end.parse()?, mission))
    }

    pub fn with_algorithm(mut self, algorithm: RouteAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// One node along a planned route with the leg that reached it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStep {
    pub index: usize,
    pub node: NodeId,
    pub coordinate: Coordinate,
    /// Meters covered by the edge into this node (0 for the origin).
    pub leg_length_m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leg_time_s: Option<f64>,
}

/// Planned route returned by the library.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    pub mission: MissionProfile,
    pub algorithm: RouteAlgorithm,
    pub start: Coordinate,
    pub end: Coordinate,
    pub region: BoundingRegion,
    /// Node the start coordinate resolved to.
    pub origin: NodeId,
    /// Node the end coordinate resolved to.
    pub destination: NodeId,
    pub route: Route,
    pub steps: Vec<RouteStep>,
    /// Sum of mission weights along the route.
    pub cost: f64,
    pub length_m: f64,
    /// Present when every traversed edge has a known travel time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_time_s: Option<f64>,
}

impl RoutePlan {
    /// Number of hops in the route.
    pub fn hop_count(&self) -> usize {
        self.route.hop_count()
    }
}

/// Result of a rendered mission.
#[derive(Debug, Clone)]
pub struct MissionOutcome {
    pub plan: RoutePlan,
    pub artifact: RouteArtifact,
}

/// Compute a route for `request` over the graph `provider` returns.
///
/// 1. Derive the bounding region around both coordinates
/// 2. Fetch the graph and reject empty ones with [`Error::NoData`]
/// 3. Snap both coordinates to their nearest nodes
/// 4. Impute speeds and travel times for the speed mission
/// 5. Run the selected planner with the mission's edge weights
pub fn plan_route<P>(
    provider: &P,
    request: &RouteRequest,
    config: &RouteConfig,
) -> Result<RoutePlan>
where
    P: GraphProvider + ?Sized,
{
    plan_with_graph(provider, request, config).map(|(plan, _)| plan)
}

/// [`plan_route`] followed by rendering exactly one artifact.
///
/// Nothing is rendered when planning fails.
pub fn run_mission<P, R>(
    provider: &P,
    renderer: &R,
    request: &RouteRequest,
    config: &RouteConfig,
) -> Result<MissionOutcome>
where
    P: GraphProvider + ?Sized,
    R: RouteRenderer + ?Sized,
{
    let (plan, graph) = plan_with_graph(provider, request, config)?;
    let artifact = renderer
        .render(&plan.route, &graph, &request.start, &request.end)
        .inspect_err(|err| {
            warn!(
                mission = %request.mission,
                path = %renderer.output_path().display(),
                error = %err,
                "failed to render route"
            )
        })?;
    Ok(MissionOutcome { plan, artifact })
}

fn plan_with_graph<P>(
    provider: &P,
    request: &RouteRequest,
    config: &RouteConfig,
) -> Result<(RoutePlan, Graph)>
where
    P: GraphProvider + ?Sized,
{
    let log_failure = |err: &Error| {
        warn!(
            mission = %request.mission,
            start = %request.start,
            end = %request.end,
            error = %err,
            "route planning failed"
        )
    };

    let region = BoundingRegion::around(&request.start, &request.end, config.buffer_deg);
    info!(
        mission = %request.mission,
        algorithm = %request.algorithm,
        provider = provider.name(),
        %region,
        "planning route"
    );

    let mut graph = provider.fetch(&region).inspect_err(log_failure)?;
    if graph.is_empty() {
        let err = Error::NoData { region };
        log_failure(&err);
        return Err(err);
    }
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph ready"
    );

    let index = SpatialIndex::build(&graph);
    let origin = index.nearest(&request.start).inspect_err(log_failure)?;
    let destination = index.nearest(&request.end).inspect_err(log_failure)?;
    debug!(origin, destination, "resolved endpoints");

    if request.mission.uses_travel_time() {
        graph.add_edge_speeds();
        graph.add_travel_times();
    }

    let planner = select_planner(request.algorithm);
    let route = planner
        .plan(&graph, origin, destination, &request.mission)
        .inspect_err(log_failure)?;

    let plan = summarize(&graph, request, region, route);
    info!(
        mission = %plan.mission,
        hops = plan.hop_count(),
        cost = plan.cost,
        length_m = plan.length_m,
        "route planned"
    );
    Ok((plan, graph))
}

fn summarize(
    graph: &Graph,
    request: &RouteRequest,
    region: BoundingRegion,
    route: Route,
) -> RoutePlan {
    let nodes = route.nodes();
    let mut steps = Vec::with_capacity(nodes.len());
    let mut cost = 0.0;
    let mut length_m = 0.0;
    let mut travel_time_s = Some(0.0);

    for (index, &node) in nodes.iter().enumerate() {
        let leg = index
            .checked_sub(1)
            .and_then(|prev| cheapest_edge(graph, nodes[prev], node, &request.mission));
        let (leg_length_m, leg_time_s) = match leg {
            Some(edge) => {
                cost += request.mission.weight(edge);
                length_m += edge.length_m;
                let time = edge.derived_travel_time();
                travel_time_s = travel_time_s.zip(time).map(|(total, t)| total + t);
                (edge.length_m, time)
            }
            None => (0.0, None),
        };
        steps.push(RouteStep {
            index,
            node,
            coordinate: graph
                .node(node)
                .map(|n| n.coordinate)
                .unwrap_or(request.start),
            leg_length_m,
            leg_time_s,
        });
    }

    RoutePlan {
        mission: request.mission,
        algorithm: request.algorithm,
        start: request.start,
        end: request.end,
        region,
        origin: route.origin(),
        destination: route.destination(),
        route,
        steps,
        cost,
        length_m,
        travel_time_s,
    }
}

/// Edge the search would have relaxed between two consecutive route nodes.
fn cheapest_edge<'g, W>(
    graph: &'g Graph,
    from: NodeId,
    to: NodeId,
    weight: &W,
) -> Option<&'g Edge>
where
    W: EdgeWeight + ?Sized,
{
    graph
        .outgoing(from)
        .filter(|edge| edge.to == to)
        .min_by(|a, b| weight.weight(a).total_cmp(&weight.weight(b)))
}
