//! Borderpath library entry points.
//!
//! This crate plans routes between two coordinates over a road network
//! fetched for the surrounding region. Callers pick a mission profile that
//! decides what an edge costs, and the crate resolves both coordinates to
//! graph nodes, runs the shortest-path search and renders the result as a
//! map. Higher-level consumers (the CLI) should only depend on the functions
//! exported here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod cache;
pub mod config;
pub mod coordinate;
pub mod error;
pub mod graph;
pub mod output;
pub mod overpass;
pub mod path;
pub mod provider;
pub mod render;
pub mod routing;
pub mod spatial;
pub mod weight;
pub mod zones;

pub use cache::{graph_cache_dir, DiskCachingProvider, GraphSnapshot};
pub use config::{MapStyle, RouteConfig};
pub use coordinate::{haversine_distance, BoundingRegion, Coordinate};
pub use error::{Error, Result};
pub use graph::{Edge, Graph, GraphBuilder, Node, NodeId};
pub use output::{RouteRenderMode, RouteSummary};
pub use overpass::OverpassProvider;
pub use path::{route_cost, solve, Route, RouteAlgorithm};
pub use provider::{CachingProvider, GraphProvider, NetworkFile, StaticGraphProvider};
pub use render::{GeoJsonRenderer, HtmlMapRenderer, RouteArtifact, RouteRenderer};
pub use routing::{plan_route, run_mission, MissionOutcome, RoutePlan, RouteRequest};
pub use spatial::{nearest_node, SpatialIndex};
pub use weight::{EdgeWeight, MissionProfile};
pub use zones::{Zone, ZoneCatalog};
