use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use borderpath_cli::commands::region::{handle_region, RegionArgs};
use borderpath_cli::commands::route::{handle_route, RouteArgs};
use borderpath_cli::commands::zones::{handle_zones, ZonesArgs};
use borderpath_cli::commands::GlobalOptions;

#[derive(Parser, Debug)]
#[command(author, version, about = "Mission route planning over road networks")]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan a route for a mission and render it as a map.
    Route(RouteArgs),
    /// List the zones in a zone catalog.
    Zones(ZonesArgs),
    /// Print the bounding region derived for a start/end pair.
    Region(RegionArgs),
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match &cli.command {
        Command::Route(args) => handle_route(&cli.global, args),
        Command::Zones(args) => handle_zones(&cli.global, args),
        Command::Region(args) => handle_region(&cli.global, args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
