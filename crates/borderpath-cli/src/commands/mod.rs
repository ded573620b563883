// Module exports for CLI subcommands
//
// Each module handles one subcommand. main.rs parses the arguments and
// dispatches to these handlers.

pub mod region;
pub mod route;
pub mod zones;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use borderpath_lib::{
    DiskCachingProvider, GraphProvider, OverpassProvider, RouteConfig, StaticGraphProvider,
};

use crate::output::OutputFormat;

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// Plan over a static road network JSON file instead of Overpass.
    #[arg(long, global = true, value_name = "JSON")]
    pub network: Option<PathBuf>,

    /// Overpass API interpreter endpoint.
    #[arg(long, global = true, value_name = "URL")]
    pub overpass_url: Option<String>,

    /// Graph provider timeout in seconds.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Reuse road networks cached on disk between runs.
    #[arg(long, global = true)]
    pub cache: bool,
}

impl GlobalOptions {
    /// Environment configuration with the flag overrides applied.
    pub fn config(&self) -> RouteConfig {
        let mut config = RouteConfig::from_env();
        if let Some(url) = &self.overpass_url {
            config.overpass_url = url.clone();
        }
        if let Some(secs) = self.timeout {
            config.provider_timeout = Duration::from_secs(secs);
        }
        config
    }

    /// Graph provider selected by `--network` and `--cache`.
    pub fn provider(&self, config: &RouteConfig) -> Result<Box<dyn GraphProvider>> {
        match &self.network {
            Some(path) => {
                let provider = StaticGraphProvider::from_path(path).with_context(|| {
                    format!("failed to load road network from {}", path.display())
                })?;
                self.maybe_cached(provider)
            }
            None => {
                let provider = OverpassProvider::new(config)
                    .context("failed to initialise the Overpass client")?;
                self.maybe_cached(provider)
            }
        }
    }

    fn maybe_cached<P>(&self, provider: P) -> Result<Box<dyn GraphProvider>>
    where
        P: GraphProvider + 'static,
    {
        if !self.cache {
            return Ok(Box::new(provider));
        }
        let cached = DiskCachingProvider::new(provider)
            .context("failed to resolve a cache directory for road networks")?;
        Ok(Box::new(cached))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> GlobalOptions {
        GlobalOptions {
            network: None,
            overpass_url: None,
            timeout: None,
            format: OutputFormat::Text,
            cache: false,
        }
    }

    #[test]
    fn flags_override_config() {
        let options = GlobalOptions {
            overpass_url: Some("http://localhost:12345/api".to_string()),
            timeout: Some(5),
            ..options()
        };
        let config = options.config();
        assert_eq!(config.overpass_url, "http://localhost:12345/api");
        assert_eq!(config.provider_timeout, Duration::from_secs(5));
    }

    #[test]
    fn missing_network_file_is_reported() {
        let options = GlobalOptions {
            network: Some(PathBuf::from("/nonexistent/network.json")),
            ..options()
        };
        let err = options
            .provider(&RouteConfig::default())
            .err()
            .expect("missing file must fail");
        assert!(err.to_string().contains("failed to load road network"));
    }
}
