use std::fmt::Write;

use serde::Serialize;

use crate::coordinate::Coordinate;
use crate::path::RouteAlgorithm;
use crate::routing::{RoutePlan, RouteStep};
use crate::weight::MissionProfile;

/// Presentation style for turning a [`RouteSummary`] into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRenderMode {
    /// Header, totals and a numbered step table.
    PlainText,
    /// One `lat, lon` line per route node.
    Basic,
}

/// Structured representation of a planned route that higher-level consumers can serialise.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteSummary {
    pub mission: MissionProfile,
    pub algorithm: RouteAlgorithm,
    pub hops: usize,
    pub start: Coordinate,
    pub end: Coordinate,
    pub cost: f64,
    pub length_m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_time_s: Option<f64>,
    pub steps: Vec<RouteStep>,
    /// Artifact written for this route, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

impl RouteSummary {
    pub fn from_plan(plan: &RoutePlan) -> Self {
        Self {
            mission: plan.mission,
            algorithm: plan.algorithm,
            hops: plan.hop_count(),
            start: plan.start,
            end: plan.end,
            cost: plan.cost,
            length_m: plan.length_m,
            travel_time_s: plan.travel_time_s,
            steps: plan.steps.clone(),
            artifact: None,
        }
    }

    pub fn with_artifact(mut self, path: impl Into<String>) -> Self {
        self.artifact = Some(path.into());
        self
    }

    /// Render the summary using the requested textual mode.
    pub fn render(&self, mode: RouteRenderMode) -> String {
        match mode {
            RouteRenderMode::PlainText => self.render_plain(),
            RouteRenderMode::Basic => self.render_basic(),
        }
    }

    fn render_plain(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "Route: {} -> {} ({} hops, mission: {}, algorithm: {})",
            self.start, self.end, self.hops, self.mission, self.algorithm
        );
        let _ = write!(buffer, "Distance: {}", format_distance(self.length_m));
        if let Some(seconds) = self.travel_time_s {
            let _ = write!(buffer, ", travel time: {}", format_duration(seconds));
        }
        let _ = writeln!(buffer);

        for step in &self.steps {
            let _ = write!(
                buffer,
                "{:>3}: {} (node {})",
                step.index, step.coordinate, step.node
            );
            if step.index > 0 {
                let _ = write!(buffer, " +{}", format_distance(step.leg_length_m));
            }
            let _ = writeln!(buffer);
        }

        if let Some(path) = &self.artifact {
            let _ = writeln!(buffer, "Map saved to {path}");
        }
        buffer
    }

    fn render_basic(&self) -> String {
        let mut buffer = String::new();
        for step in &self.steps {
            let _ = writeln!(buffer, "{}", step.coordinate);
        }
        buffer
    }
}

/// `850 m` below a kilometer, `12.3 km` above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1_000.0 {
        format!("{meters:.0} m")
    } else {
        format!("{:.1} km", meters / 1_000.0)
    }
}

/// `42s`, `7m 05s` or `1h 02m`.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    let (hours, minutes, secs) = (total / 3_600, (total % 3_600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs:02}s")
    } else {
        format!("{secs}s")
    }
}
