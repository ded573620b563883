//! OpenStreetMap road networks fetched from an Overpass API interpreter.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::RouteConfig;
use crate::coordinate::{haversine_distance, BoundingRegion, Coordinate};
use crate::error::{Error, Result};
use crate::graph::{Edge, Graph, GraphBuilder, Node, NodeId};
use crate::provider::GraphProvider;

const MPH_TO_KPH: f64 = 1.609_344;

/// Road classes that never carry traffic.
const EXCLUDED_HIGHWAYS: &str =
    "abandoned|construction|no|planned|platform|proposed|raceway|razed|elevator|bus_stop";

/// Provider that downloads every traversable way inside a region.
#[derive(Debug, Clone)]
pub struct OverpassProvider {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl OverpassProvider {
    /// Build a provider using the endpoint and timeout from `config`.
    pub fn new(config: &RouteConfig) -> Result<Self> {
        Self::with_endpoint(&config.overpass_url, config.provider_timeout)
    }

    pub fn with_endpoint(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent())
            .build()
            .map_err(Error::Http)?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl GraphProvider for OverpassProvider {
    fn fetch(&self, region: &BoundingRegion) -> Result<Graph> {
        let query = build_query(region, self.timeout);
        debug!(query = %query, "overpass query");
        info!(
            endpoint = %self.endpoint,
            %region,
            "requesting road network"
        );

        let timeout_error = || Error::ProviderTimeout {
            region: *region,
            timeout_secs: self.timeout.as_secs(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/plain")
            .body(query)
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    timeout_error()
                } else {
                    Error::Http(err)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "overpass request failed");
            return Err(Error::ProviderStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|err| {
            if err.is_timeout() {
                timeout_error()
            } else {
                Error::Http(err)
            }
        })?;

        let graph = graph_from_overpass_json(&body)?;
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built road network from overpass"
        );
        Ok(graph)
    }

    fn name(&self) -> &'static str {
        "overpass"
    }
}

/// Overpass QL selecting all traversable ways in `region` plus their nodes.
pub fn build_query(region: &BoundingRegion, timeout: Duration) -> String {
    format!(
        "[out:json][timeout:{timeout}];\n\
         (\n  way[\"highway\"][\"area\"!~\"yes\"][\"highway\"!~\"^({excluded})$\"]({region});\n);\n\
         (._;>;);\nout body;",
        timeout = timeout.as_secs().max(1),
        excluded = EXCLUDED_HIGHWAYS,
        region = region,
    )
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OsmElement>,
}

#[derive(Debug, Deserialize)]
struct OsmElement {
    #[serde(rename = "type")]
    kind: String,
    id: NodeId,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    nodes: Vec<NodeId>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Both,
    Forward,
    Reverse,
}

/// Convert an Overpass JSON payload into a directed road graph.
///
/// Consecutive way nodes become edges measured by great-circle distance.
/// `oneway` and roundabout tags restrict direction; `maxspeed` becomes the
/// edge speed.
pub fn graph_from_overpass_json(body: &str) -> Result<Graph> {
    let response: OverpassResponse =
        serde_json::from_str(body).map_err(|err| Error::ProviderData {
            message: format!("overpass response is not valid JSON: {err}"),
        })?;

    let mut positions: HashMap<NodeId, Coordinate> = HashMap::new();
    for element in response.elements.iter().filter(|e| e.kind == "node") {
        if let (Some(lat), Some(lon)) = (element.lat, element.lon) {
            match Coordinate::new(lat, lon) {
                Ok(coordinate) => {
                    positions.insert(element.id, coordinate);
                }
                Err(_) => warn!(id = element.id, lat, lon, "skipping node with invalid position"),
            }
        }
    }

    let ways: Vec<&OsmElement> = response
        .elements
        .iter()
        .filter(|e| e.kind == "way" && e.tags.contains_key("highway"))
        .collect();

    let mut used: Vec<NodeId> = ways
        .iter()
        .flat_map(|way| way.nodes.iter().copied())
        .filter(|id| positions.contains_key(id))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    used.sort_unstable();

    let mut builder = GraphBuilder::new();
    for id in used {
        builder.add_node(Node {
            id,
            coordinate: positions[&id],
        });
    }

    for way in ways {
        let highway = way.tags.get("highway").cloned();
        let speed_kph = way.tags.get("maxspeed").and_then(|raw| parse_maxspeed(raw));
        let direction = way_direction(&way.tags);

        for pair in way.nodes.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let (Some(a), Some(b)) = (positions.get(&from), positions.get(&to)) else {
                continue;
            };
            let edge = Edge {
                from,
                to,
                length_m: haversine_distance(a, b),
                speed_kph,
                travel_time_s: None,
                highway: highway.clone(),
            };
            match direction {
                Direction::Both => {
                    builder.add_two_way(edge);
                }
                Direction::Forward => {
                    builder.add_edge(edge);
                }
                Direction::Reverse => {
                    builder.add_edge(Edge { from: to, to: from, ..edge });
                }
            }
        }
    }

    Ok(builder.build())
}

fn way_direction(tags: &HashMap<String, String>) -> Direction {
    match tags.get("oneway").map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "yes" | "true" | "1") => Direction::Forward,
        Some(v) if matches!(v.as_str(), "-1" | "reverse") => Direction::Reverse,
        Some(v) if matches!(v.as_str(), "no" | "false" | "0") => Direction::Both,
        _ => {
            let roundabout = tags
                .get("junction")
                .is_some_and(|j| j == "roundabout" || j == "circular");
            if roundabout {
                Direction::Forward
            } else {
                Direction::Both
            }
        }
    }
}

/// Parse an OSM `maxspeed` value into km/h.
///
/// Handles plain numbers, `mph` suffixes and `;`-separated lists (first
/// value wins). Symbolic values such as `none` or `RU:urban` yield `None`.
pub fn parse_maxspeed(raw: &str) -> Option<f64> {
    let first = raw.split(';').next()?.trim().to_ascii_lowercase();
    let (number, factor) = match first.strip_suffix("mph") {
        Some(rest) => (rest.trim(), MPH_TO_KPH),
        None => (first.trim_end_matches("km/h").trim_end_matches("kph").trim(), 1.0),
    };
    number
        .parse::<f64>()
        .ok()
        .filter(|speed| speed.is_finite() && *speed > 0.0)
        .map(|speed| speed * factor)
}

fn user_agent() -> String {
    format!("borderpath-lib/{version}", version = env!("CARGO_PKG_VERSION"))
}
