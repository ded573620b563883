//! Region command handler for inspecting the area a route request covers.

use anyhow::{Context, Result};
use clap::Args;

use borderpath_lib::{BoundingRegion, Coordinate};

use super::GlobalOptions;

/// Arguments for the region command.
#[derive(Args, Debug, Clone)]
pub struct RegionArgs {
    /// Start coordinate as "lat, lon".
    #[arg(long, allow_hyphen_values = true)]
    pub from: String,

    /// End coordinate as "lat, lon".
    #[arg(long, allow_hyphen_values = true)]
    pub to: String,

    /// Margin in degrees; defaults to the configured buffer.
    #[arg(long, value_name = "DEG")]
    pub buffer: Option<f64>,
}

impl RegionArgs {
    pub fn region(&self, default_buffer: f64) -> Result<BoundingRegion> {
        let from: Coordinate = self.from.parse().context("invalid --from coordinate")?;
        let to: Coordinate = self.to.parse().context("invalid --to coordinate")?;
        Ok(BoundingRegion::around(
            &from,
            &to,
            self.buffer.unwrap_or(default_buffer),
        ))
    }
}

/// Handle the region subcommand.
pub fn handle_region(global: &GlobalOptions, args: &RegionArgs) -> Result<()> {
    let region = args.region(global.config().buffer_deg)?;
    print!("{}", global.format.render_region(&region)?);
    Ok(())
}
