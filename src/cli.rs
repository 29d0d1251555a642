use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use voyage_calculator::{DEFAULT_MAP_STYLE, MAP_STYLES, MapView, Selection};

#[derive(Debug, Parser)]
#[command(about = "Voyage calculator dashboard.")]
pub struct Cli {
    /// Directory holding routes.csv, contour.geojson and optionally voyages.csv
    #[arg(env = "VOYAGE_DATA_DIR", long, default_value = "data")]
    pub data_dir: PathBuf,
    /// Mapbox access token, only needed for Mapbox hosted styles
    #[arg(env = "MAPBOX_TOKEN", long)]
    pub mapbox_token: Option<String>,
    /// Base map style
    #[arg(env = "VOYAGE_MAP_STYLE", long, default_value = DEFAULT_MAP_STYLE, value_parser = PossibleValuesParser::new(MAP_STYLES))]
    pub map_style: String,
    #[command(subcommand)]
    pub cmd: Command,
}

impl Cli {
    pub fn map_view(&self) -> MapView {
        MapView::default().with_style(&self.map_style, self.mapbox_token.clone())
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the dashboard over HTTP
    Serve {
        #[arg(env = "VOYAGE_SERVER_ADDRESS", long, default_value = "127.0.0.1:8050")]
        address: SocketAddr,
    },
    /// Print the voyage statistics for a selection
    Lookup(SelectionArgs),
    /// Write the map for a selection to a standalone HTML file
    Render {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Draw the atmospheric pressure layer
        #[arg(long)]
        overlay: bool,
        #[arg(short, long, default_value = "route.html")]
        output: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct SelectionArgs {
    /// GC or RL
    #[arg(long, default_value = "RL")]
    pub navigation: String,
    /// "Panama Canal" or "Cape Horn"
    #[arg(long, default_value = "Panama Canal")]
    pub passage: String,
    /// Discharge port
    #[arg(long)]
    pub destination: Option<String>,
    /// Bunker port
    #[arg(long)]
    pub bunker: Option<String>,
}

impl SelectionArgs {
    pub fn into_selection(self, overlay: bool) -> Selection {
        Selection {
            navigation: self.navigation,
            passage: self.passage,
            destination: self.destination,
            bunker: self.bunker,
            overlay,
        }
    }
}
