//! Voyage calculator: serves the dashboard, or answers a single selection from the command line.

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use uom::si::{length::kilometer, time::day};
use voyage_calculator::*;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Cli::parse();
    let view = args.map_view();

    match args.cmd {
        Command::Serve { address } => {
            let dashboard = Dashboard::load(&args.data_dir, view)
                .with_context(|| format!("Failed to load data from {}", args.data_dir.display()))?;
            server::run(address, dashboard).await.context("Dashboard server stopped")?;
        }
        Command::Lookup(selection) => {
            // The statistics only need the voyage table, no route or contour files
            let voyages = load_voyages(&args.data_dir)
                .with_context(|| format!("Failed to read voyages from {}", args.data_dir.display()))?;
            let selection = selection.into_selection(false);
            let voyage = voyages.lookup(&selection);
            let summary = VoyageSummary::from_lookup(voyage);

            println!("Speed (kts):      {}", summary.speed);
            println!("Miles (NM):       {}", summary.miles);
            println!("Consumption (MT): {}", summary.consumption);
            println!("Bunker price:     {}", summary.price);
            if let Some(voyage) = voyage {
                println!("Route:            {} ({} km, {:.1} days at sea)", voyage.route_id, voyage.distance().get::<kilometer>().round(), voyage.time_at_sea().get::<day>());
            }
        }
        Command::Render { selection, overlay, output } => {
            let dashboard = Dashboard::load(&args.data_dir, view)
                .with_context(|| format!("Failed to load data from {}", args.data_dir.display()))?;
            let selection = selection.into_selection(overlay);
            write_html(&dashboard.figure(&selection), &output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Saved map to {}", output.display());
        }
    }

    Ok(())
}
