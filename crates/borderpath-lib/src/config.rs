use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::coordinate::DEFAULT_BUFFER_DEG;

const BUFFER_ENV: &str = "BORDERPATH_BUFFER_DEG";
const PROVIDER_TIMEOUT_ENV: &str = "BORDERPATH_PROVIDER_TIMEOUT_SECS";
const OVERPASS_URL_ENV: &str = "BORDERPATH_OVERPASS_URL";
const OUTPUT_PATH_ENV: &str = "BORDERPATH_OUTPUT_PATH";

/// Public Overpass API interpreter endpoint.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Well-known location of the rendered route map.
pub const DEFAULT_OUTPUT_PATH: &str = "data/terrain_maps/route_map.html";

const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(180);

/// Visual parameters for rendered route maps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapStyle {
    pub zoom: u8,
    pub route_color: String,
    pub route_weight: f64,
    pub route_opacity: f64,
    pub start_color: String,
    pub end_color: String,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            zoom: 13,
            route_color: "blue".to_string(),
            route_weight: 5.0,
            route_opacity: 0.7,
            start_color: "green".to_string(),
            end_color: "red".to_string(),
        }
    }
}

/// Parameters for one routing pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteConfig {
    /// Margin in degrees added around the start/end pair.
    pub buffer_deg: f64,
    /// Upper bound on a single graph provider fetch.
    pub provider_timeout: Duration,
    /// Overpass interpreter endpoint.
    pub overpass_url: String,
    /// Where the rendered map is written.
    pub output_path: PathBuf,
    pub map_style: MapStyle,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            buffer_deg: DEFAULT_BUFFER_DEG,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            map_style: MapStyle::default(),
        }
    }
}

impl RouteConfig {
    /// Defaults overridden by `BORDERPATH_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`.
    ///
    /// Tests use this instead of mutating the process environment so they can
    /// run in parallel.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(buffer) = parse_var::<f64, _>(&lookup, BUFFER_ENV) {
            if buffer.is_finite() && buffer >= 0.0 {
                config.buffer_deg = buffer;
            } else {
                warn!(key = BUFFER_ENV, value = buffer, "ignoring negative buffer");
            }
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, PROVIDER_TIMEOUT_ENV) {
            config.provider_timeout = Duration::from_secs(secs);
        }
        if let Some(url) = lookup(OVERPASS_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.overpass_url = url.trim().to_string();
        }
        if let Some(path) = lookup(OUTPUT_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            config.output_path = PathBuf::from(path.trim());
        }

        config
    }

    pub fn with_buffer(mut self, buffer_deg: f64) -> Self {
        self.buffer_deg = buffer_deg;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable configuration value");
            None
        }
    }
}
