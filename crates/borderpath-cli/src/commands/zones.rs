//! Zones command handler for listing named start points.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use borderpath_lib::ZoneCatalog;

use super::GlobalOptions;

/// Arguments for the zones command.
#[derive(Args, Debug, Clone)]
pub struct ZonesArgs {
    /// Zone catalog CSV.
    #[arg(long, value_name = "CSV")]
    pub zones: PathBuf,
}

/// Handle the zones subcommand.
pub fn handle_zones(global: &GlobalOptions, args: &ZonesArgs) -> Result<()> {
    let catalog = ZoneCatalog::from_path(&args.zones)
        .with_context(|| format!("failed to load zone catalog from {}", args.zones.display()))?;
    print!("{}", global.format.render_zones(&catalog.zones_sorted())?);
    Ok(())
}
