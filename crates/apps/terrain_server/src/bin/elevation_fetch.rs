use std::path::PathBuf;

use clap::Parser;
use layers::{DEFAULT_EXAGGERATION_FACTOR, ElevationConfig, LuminanceElevationProvider};
use streaming::{HttpTileSource, TileAddress, TileSourceConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fetch one luminance elevation tile")]
struct Args {
    #[arg(long)]
    level: u8,

    #[arg(long)]
    row: u32,

    #[arg(long)]
    col: u32,

    /// Imagery URL template with {level}, {row} and {col} placeholders
    /// (default: VIIRS Black Marble on NASA GIBS)
    #[arg(long)]
    url_template: Option<String>,

    /// Metres of relief at full brightness
    #[arg(long, default_value_t = DEFAULT_EXAGGERATION_FACTOR)]
    exaggeration_factor: f64,

    /// Write the elevation grid as JSON instead of printing a summary
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut source_config = TileSourceConfig::default();
    if let Some(template) = args.url_template {
        source_config = source_config.with_url_template(template);
    }
    let config = ElevationConfig {
        exaggeration_factor: args.exaggeration_factor,
        ..ElevationConfig::default()
    };

    let provider = LuminanceElevationProvider::new(HttpTileSource::new(source_config), &config)?;
    provider.load().await?;

    let address = TileAddress::new(args.level, args.row, args.col);
    let grid = provider.fetch(address).await?;
    info!(%address, width = grid.width, height = grid.height, "fetched elevation tile");

    match args.out {
        Some(path) => {
            let payload = serde_json::to_string(&grid)?;
            tokio::fs::write(&path, payload).await?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            let (min, max) = grid.min_max().unwrap_or((0.0, 0.0));
            let mean = grid.mean().unwrap_or(0.0);
            println!(
                "{address}\t{}x{}\tmin={min:.1}\tmax={max:.1}\tmean={mean:.1}",
                grid.width, grid.height
            );
        }
    }

    Ok(())
}
