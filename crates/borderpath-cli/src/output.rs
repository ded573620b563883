//! Output formatting for CLI results.
//!
//! Every formatter returns the full text to print so handlers stay free of
//! formatting details and tests can inspect the output directly.

use std::fmt::Write;

use anyhow::Result;
use clap::ValueEnum;

use borderpath_lib::{BoundingRegion, RouteRenderMode, RouteSummary, Zone};

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human readable summary with a step table.
    #[default]
    Text,
    /// Bare coordinates or names, one per line.
    Basic,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    pub fn render_route(self, summary: &RouteSummary) -> Result<String> {
        Ok(match self {
            OutputFormat::Text => summary.render(RouteRenderMode::PlainText),
            OutputFormat::Basic => summary.render(RouteRenderMode::Basic),
            OutputFormat::Json => json_line(summary)?,
        })
    }

    pub fn render_zones(self, zones: &[&Zone]) -> Result<String> {
        let mut buffer = String::new();
        match self {
            OutputFormat::Text => {
                let width = zones.iter().map(|zone| zone.name.len()).max().unwrap_or(0);
                let _ = writeln!(buffer, "Zones ({}):", zones.len());
                for zone in zones {
                    let _ = writeln!(buffer, "  {:<width$}  {}", zone.name, zone.coordinate);
                }
            }
            OutputFormat::Basic => {
                for zone in zones {
                    let _ = writeln!(buffer, "{}", zone.name);
                }
            }
            OutputFormat::Json => buffer = json_line(&zones)?,
        }
        Ok(buffer)
    }

    pub fn render_region(self, region: &BoundingRegion) -> Result<String> {
        Ok(match self {
            OutputFormat::Text => format!(
                "Region: {region}\n  north: {:.6}\n  south: {:.6}\n  east:  {:.6}\n  west:  {:.6}\n",
                region.north, region.south, region.east, region.west
            ),
            OutputFormat::Basic => format!("{region}\n"),
            OutputFormat::Json => json_line(region)?,
        })
    }
}

fn json_line<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');
    Ok(body)
}
