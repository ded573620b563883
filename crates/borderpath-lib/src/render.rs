//! Route artifacts and the renderers that persist them.
//!
//! A [`RouteArtifact`] is a pure function of the route, the graph it was
//! solved on and the two requested coordinates. Renderers write it to disk
//! atomically: the file is staged next to the target and persisted over it,
//! so a failed render never leaves a partial artifact behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tracing::info;

use crate::config::{MapStyle, RouteConfig};
use crate::coordinate::Coordinate;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::path::Route;

/// Consumer of solved routes.
pub trait RouteRenderer {
    /// Build the artifact for `route` and persist it.
    fn render(
        &self,
        route: &Route,
        graph: &Graph,
        start: &Coordinate,
        end: &Coordinate,
    ) -> Result<RouteArtifact>;

    /// Where the artifact is written.
    fn output_path(&self) -> &Path;
}

impl<R: RouteRenderer + ?Sized> RouteRenderer for &R {
    fn render(
        &self,
        route: &Route,
        graph: &Graph,
        start: &Coordinate,
        end: &Coordinate,
    ) -> Result<RouteArtifact> {
        (**self).render(route, graph, start, end)
    }

    fn output_path(&self) -> &Path {
        (**self).output_path()
    }
}

/// Labeled map pin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub label: String,
    pub coordinate: Coordinate,
    pub color: String,
}

/// Everything needed to draw a route on a map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteArtifact {
    /// Node coordinates in route order.
    pub polyline: Vec<Coordinate>,
    /// `Start` then `End`.
    pub markers: Vec<Marker>,
    pub center: Coordinate,
    pub zoom: u8,
}

impl RouteArtifact {
    /// Assemble the artifact. Fails with [`Error::Render`] if a route node is
    /// not part of `graph`.
    pub fn from_route(
        route: &Route,
        graph: &Graph,
        start: &Coordinate,
        end: &Coordinate,
        style: &MapStyle,
    ) -> Result<Self> {
        let polyline = route
            .nodes()
            .iter()
            .map(|&id| {
                graph
                    .node(id)
                    .map(|node| node.coordinate)
                    .ok_or_else(|| Error::Render {
                        path: PathBuf::new(),
                        message: format!("route node {id} is missing from the graph"),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            polyline,
            markers: vec![
                Marker {
                    label: "Start".to_string(),
                    coordinate: *start,
                    color: style.start_color.clone(),
                },
                Marker {
                    label: "End".to_string(),
                    coordinate: *end,
                    color: style.end_color.clone(),
                },
            ],
            center: *start,
            zoom: style.zoom,
        })
    }

    /// GeoJSON `FeatureCollection` with the route line and both markers.
    ///
    /// GeoJSON positions are `[longitude, latitude]`.
    pub fn to_geojson(&self) -> Value {
        let line: Vec<[f64; 2]> = self
            .polyline
            .iter()
            .map(|c| [c.longitude, c.latitude])
            .collect();

        let mut features = vec![json!({
            "type": "Feature",
            "geometry": { "type": "LineString", "coordinates": line },
            "properties": { "name": "route" },
        })];
        features.extend(self.markers.iter().map(|marker| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [marker.coordinate.longitude, marker.coordinate.latitude],
                },
                "properties": { "name": marker.label, "marker-color": marker.color },
            })
        }));

        json!({ "type": "FeatureCollection", "features": features })
    }
}

/// Self-contained Leaflet map written as HTML.
#[derive(Debug, Clone)]
pub struct HtmlMapRenderer {
    path: PathBuf,
    style: MapStyle,
}

impl HtmlMapRenderer {
    pub fn new(path: impl Into<PathBuf>, style: MapStyle) -> Self {
        Self {
            path: path.into(),
            style,
        }
    }

    pub fn from_config(config: &RouteConfig) -> Self {
        Self::new(config.output_path.clone(), config.map_style.clone())
    }

    fn to_html(&self, artifact: &RouteArtifact) -> String {
        let line: Vec<[f64; 2]> = artifact
            .polyline
            .iter()
            .map(|c| [c.latitude, c.longitude])
            .collect();
        let markers: Vec<Value> = artifact
            .markers
            .iter()
            .map(|m| {
                json!({
                    "label": m.label,
                    "color": m.color,
                    "position": [m.coordinate.latitude, m.coordinate.longitude],
                })
            })
            .collect();
        let route_style = json!({
            "color": self.style.route_color,
            "weight": self.style.route_weight,
            "opacity": self.style.route_opacity,
        });

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Route map</title>
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map").setView([{lat}, {lon}], {zoom});
L.tileLayer("https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
  attribution: "&copy; OpenStreetMap contributors"
}}).addTo(map);
var route = {line};
L.polyline(route, {route_style}).addTo(map);
{markers}.forEach(function (m) {{
  L.circleMarker(m.position, {{ color: m.color, fillColor: m.color, fillOpacity: 0.9, radius: 8 }})
    .bindPopup(m.label)
    .addTo(map);
}});
</script>
</body>
</html>
"#,
            lat = artifact.center.latitude,
            lon = artifact.center.longitude,
            zoom = artifact.zoom,
            line = json!(line),
            route_style = route_style,
            markers = Value::from(markers),
        )
    }
}

impl RouteRenderer for HtmlMapRenderer {
    fn render(
        &self,
        route: &Route,
        graph: &Graph,
        start: &Coordinate,
        end: &Coordinate,
    ) -> Result<RouteArtifact> {
        let artifact = RouteArtifact::from_route(route, graph, start, end, &self.style)
            .map_err(|err| with_path(err, &self.path))?;
        write_atomically(&self.path, self.to_html(&artifact).as_bytes())?;
        info!(
            path = %self.path.display(),
            points = artifact.polyline.len(),
            "route map saved"
        );
        Ok(artifact)
    }

    fn output_path(&self) -> &Path {
        &self.path
    }
}

/// Writes the artifact as a GeoJSON document.
#[derive(Debug, Clone)]
pub struct GeoJsonRenderer {
    path: PathBuf,
    style: MapStyle,
}

impl GeoJsonRenderer {
    pub fn new(path: impl Into<PathBuf>, style: MapStyle) -> Self {
        Self {
            path: path.into(),
            style,
        }
    }
}

impl RouteRenderer for GeoJsonRenderer {
    fn render(
        &self,
        route: &Route,
        graph: &Graph,
        start: &Coordinate,
        end: &Coordinate,
    ) -> Result<RouteArtifact> {
        let artifact = RouteArtifact::from_route(route, graph, start, end, &self.style)
            .map_err(|err| with_path(err, &self.path))?;
        let body = serde_json::to_vec_pretty(&artifact.to_geojson())?;
        write_atomically(&self.path, &body)?;
        info!(path = %self.path.display(), "route geojson saved");
        Ok(artifact)
    }

    fn output_path(&self) -> &Path {
        &self.path
    }
}

fn with_path(err: Error, path: &Path) -> Error {
    match err {
        Error::Render { message, .. } => Error::Render {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    }
}

/// Stage `contents` in the target directory and move it into place.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let render_error = |err: std::io::Error| Error::Render {
        path: path.to_path_buf(),
        message: err.to_string(),
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(render_error)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(render_error)?;
    tmp.write_all(contents).map_err(render_error)?;
    tmp.flush().map_err(render_error)?;
    tmp.persist(path).map_err(|err| render_error(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::graph::{Edge, GraphBuilder, Node};

    fn graph() -> Graph {
        let mut builder = GraphBuilder::new();
        for (id, lat, lon) in [(1, 26.90, 70.00), (2, 26.92, 70.02), (3, 26.95, 70.05)] {
            builder.add_node(Node {
                id,
                coordinate: Coordinate::new(lat, lon).unwrap(),
            });
        }
        builder.add_two_way(Edge::new(1, 2, 3_000.0));
        builder.add_two_way(Edge::new(2, 3, 4_000.0));
        builder.build()
    }

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn artifact_follows_route_order() {
        let route = Route::new(vec![3, 2, 1]).unwrap();
        let artifact = RouteArtifact::from_route(
            &route,
            &graph(),
            &coord(26.951, 70.049),
            &coord(26.899, 70.001),
            &MapStyle::default(),
        )
        .unwrap();

        let lats: Vec<f64> = artifact.polyline.iter().map(|c| c.latitude).collect();
        assert_eq!(lats, vec![26.95, 26.92, 26.90]);
        assert_eq!(artifact.markers[0].label, "Start");
        assert_eq!(artifact.markers[0].color, "green");
        assert_eq!(artifact.markers[1].label, "End");
        assert_eq!(artifact.markers[1].color, "red");
        assert_eq!(artifact.center, coord(26.951, 70.049));
        assert_eq!(artifact.zoom, 13);
    }

    #[test]
    fn geojson_uses_lon_lat_order() {
        let route = Route::new(vec![1, 2]).unwrap();
        let artifact = RouteArtifact::from_route(
            &route,
            &graph(),
            &coord(26.90, 70.00),
            &coord(26.92, 70.02),
            &MapStyle::default(),
        )
        .unwrap();
        let geojson = artifact.to_geojson();
        assert_eq!(geojson["type"], "FeatureCollection");
        assert_eq!(geojson["features"].as_array().unwrap().len(), 3);
        assert_eq!(geojson["features"][0]["geometry"]["coordinates"][0][0], 70.0);
        assert_eq!(geojson["features"][2]["properties"]["name"], "End");
    }

    #[test]
    fn html_renderer_creates_directories_and_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("terrain_maps").join("route_map.html");
        let renderer = HtmlMapRenderer::new(&path, MapStyle::default());
        let route = Route::new(vec![1, 2, 3]).unwrap();

        renderer
            .render(&route, &graph(), &coord(26.90, 70.00), &coord(26.95, 70.05))
            .unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("L.polyline"));
        assert!(html.contains("[26.92,70.02]"));
        assert!(html.contains("\"Start\""));
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn missing_node_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("route_map.html");
        let renderer = HtmlMapRenderer::new(&path, MapStyle::default());
        let route = Route::new(vec![1, 42]).unwrap();

        let err = renderer
            .render(&route, &graph(), &coord(26.90, 70.00), &coord(26.95, 70.05))
            .unwrap_err();
        assert!(matches!(err, Error::Render { ref path, .. } if path.ends_with("route_map.html")));
        assert!(!path.exists());
    }

    #[test]
    fn geojson_renderer_writes_feature_collection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("route.geojson");
        let renderer = GeoJsonRenderer::new(&path, MapStyle::default());
        let route = Route::new(vec![1, 2]).unwrap();
        renderer
            .render(&route, &graph(), &coord(26.90, 70.00), &coord(26.92, 70.02))
            .unwrap();

        let value: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["features"][1]["properties"]["name"], "Start");
    }
}
