//! Route command handler for planning mission routes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgGroup, Args, ValueEnum};

use borderpath_lib::{
    run_mission, Coordinate, Error as RouteError, GeoJsonRenderer, Graph, HtmlMapRenderer,
    MissionProfile, Route, RouteAlgorithm, RouteArtifact, RouteConfig, RouteRenderer,
    RouteRequest, RouteSummary, ZoneCatalog,
};

use super::GlobalOptions;
use crate::output::OutputFormat;

/// Mission profile as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MissionArg {
    /// Shortest distance.
    #[default]
    Stealth,
    /// Shortest travel time.
    Speed,
    /// Safest route.
    Safety,
}

impl From<MissionArg> for MissionProfile {
    fn from(value: MissionArg) -> Self {
        match value {
            MissionArg::Stealth => MissionProfile::Stealth,
            MissionArg::Speed => MissionProfile::Speed,
            MissionArg::Safety => MissionProfile::Safety,
        }
    }
}

/// Search algorithm as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AlgorithmArg {
    #[default]
    Dijkstra,
    #[value(name = "a-star")]
    AStar,
}

impl From<AlgorithmArg> for RouteAlgorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Dijkstra => RouteAlgorithm::Dijkstra,
            AlgorithmArg::AStar => RouteAlgorithm::AStar,
        }
    }
}

/// Arguments for the route command.
#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("start").required(true).args(["zone", "from"])))]
pub struct RouteArgs {
    /// Start from a named zone in the `--zones` catalog.
    #[arg(long, requires = "zones")]
    pub zone: Option<String>,

    /// Start coordinate as "lat, lon".
    #[arg(long, allow_hyphen_values = true)]
    pub from: Option<String>,

    /// Destination coordinate as "lat, lon".
    #[arg(long, allow_hyphen_values = true)]
    pub to: String,

    #[arg(long, value_enum, default_value_t = MissionArg::Stealth)]
    pub mission: MissionArg,

    #[arg(long, value_enum, default_value_t = AlgorithmArg::Dijkstra)]
    pub algorithm: AlgorithmArg,

    /// Margin in degrees around the start/end pair.
    #[arg(long, value_name = "DEG", allow_negative_numbers = true)]
    pub buffer: Option<f64>,

    /// Where to write the HTML map.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Also write the route as GeoJSON.
    #[arg(long, value_name = "PATH")]
    pub geojson: Option<PathBuf>,

    /// Zone catalog CSV used to resolve `--zone`.
    #[arg(long, value_name = "CSV")]
    pub zones: Option<PathBuf>,
}

impl RouteArgs {
    /// Resolve the start point and destination into a library request.
    pub fn to_request(&self) -> Result<RouteRequest> {
        let start = self.start()?;
        let request = RouteRequest::from_text(start, &self.to, self.mission.into())
            .context("invalid --to coordinate")?;
        Ok(request.with_algorithm(self.algorithm.into()))
    }

    /// Apply `--buffer` and `--output` on top of `config`.
    pub fn apply(&self, mut config: RouteConfig) -> Result<RouteConfig> {
        if let Some(buffer) = self.buffer {
            if !buffer.is_finite() || buffer < 0.0 {
                return Err(anyhow!("--buffer must be a non-negative number of degrees"));
            }
            config = config.with_buffer(buffer);
        }
        if let Some(output) = &self.output {
            config = config.with_output_path(output);
        }
        Ok(config)
    }

    fn start(&self) -> Result<Coordinate> {
        match (&self.zone, &self.from) {
            (Some(zone), _) => {
                let path = self
                    .zones
                    .as_deref()
                    .ok_or_else(|| anyhow!("--zone needs a --zones catalog"))?;
                let catalog = ZoneCatalog::from_path(path).with_context(|| {
                    format!("failed to load zone catalog from {}", path.display())
                })?;
                Ok(catalog.resolve(zone)?)
            }
            (None, Some(from)) => from
                .parse::<Coordinate>()
                .context("invalid --from coordinate"),
            (None, None) => Err(anyhow!("either --zone or --from is required")),
        }
    }
}

/// HTML map plus an optional GeoJSON copy of the same artifact.
///
/// The HTML map is written first and removed again when the GeoJSON copy
/// cannot be written.
struct MapOutputs {
    map: HtmlMapRenderer,
    geojson: Option<GeoJsonRenderer>,
}

impl MapOutputs {
    fn new(config: &RouteConfig, geojson: Option<&Path>) -> Self {
        Self {
            map: HtmlMapRenderer::from_config(config),
            geojson: geojson.map(|path| GeoJsonRenderer::new(path, config.map_style.clone())),
        }
    }
}

impl RouteRenderer for MapOutputs {
    fn render(
        &self,
        route: &Route,
        graph: &Graph,
        start: &Coordinate,
        end: &Coordinate,
    ) -> borderpath_lib::Result<RouteArtifact> {
        let artifact = self.map.render(route, graph, start, end)?;
        if let Some(geojson) = &self.geojson {
            if let Err(err) = geojson.render(route, graph, start, end) {
                // A failed request leaves no artifact behind.
                let _ = fs::remove_file(self.map.output_path());
                return Err(err);
            }
        }
        Ok(artifact)
    }

    fn output_path(&self) -> &Path {
        self.map.output_path()
    }
}

/// Handle the route subcommand.
///
/// Plans the route, writes the map and prints the summary. Nothing is
/// written when planning fails.
pub fn handle_route(global: &GlobalOptions, args: &RouteArgs) -> Result<()> {
    let request = args.to_request()?;
    let config = args.apply(global.config())?;
    let provider = global.provider(&config)?;
    let outputs = MapOutputs::new(&config, args.geojson.as_deref());

    let outcome = run_mission(provider.as_ref(), &outputs, &request, &config)
        .map_err(|err| explain_failure(err, &request))?;

    let summary = RouteSummary::from_plan(&outcome.plan)
        .with_artifact(config.output_path.display().to_string());
    print!("{}", global.format.render_route(&summary)?);
    if let (OutputFormat::Text, Some(path)) = (global.format, &args.geojson) {
        println!("GeoJSON saved to {}", path.display());
    }
    Ok(())
}

/// Turn expected planning failures into guidance for the user.
fn explain_failure(err: RouteError, request: &RouteRequest) -> anyhow::Error {
    match err {
        RouteError::NoPath { .. } => anyhow!(
            "No route found between {} and {}.\n\
             The destination may sit on a road segment that is not connected to the start. \
             Try a larger --buffer or a different destination.",
            request.start,
            request.end
        ),
        RouteError::NoData { region } => anyhow!(
            "No road network data available around {region}.\n\
             Check the coordinates or widen the search with --buffer."
        ),
        other => anyhow::Error::new(other).context("route planning failed"),
    }
}
