//! CLI tool to pre-compute a regular grid mapper cache file.
//!
//! Reads a curvilinear grid description (JSON with flat `latitude` and
//! `longitude` arrays; `null` marks a land cell without coordinates), builds
//! the mapper for the requested resolution and writes
//! `<output>/<grid id>_<resolution>.rgm`.
//!
//! Usage:
//!   build-regular-grid-mapper --grid ./gbr4_grid.json --resolution 0.03 --output ./data/mappers

use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use regrid::{mapper_file_name, RegularGridMapper};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "build-regular-grid-mapper")]
#[command(about = "Pre-compute the regular grid mapper of a curvilinear grid")]
struct Args {
    /// Grid description (JSON with `latitude` and `longitude` arrays)
    #[arg(short, long)]
    grid: PathBuf,

    /// Regular grid resolution in degrees
    #[arg(short, long)]
    resolution: f64,

    /// Grid id used in the cache file name [default: grid file stem]
    #[arg(long)]
    grid_id: Option<String>,

    /// Output directory for cache files
    #[arg(short, long, env = "REGRID_CACHE_DIR", default_value = "./data/mappers")]
    output: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Flat coordinate arrays of a curvilinear grid.
#[derive(Debug, Deserialize)]
struct GridDescription {
    latitude: Vec<Option<f64>>,
    longitude: Vec<Option<f64>>,
}

impl GridDescription {
    fn into_coordinates(self) -> (Vec<f64>, Vec<f64>) {
        let fill = |values: Vec<Option<f64>>| -> Vec<f64> {
            values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()
        };
        (fill(self.latitude), fill(self.longitude))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    if !(args.resolution.is_finite() && args.resolution > 0.0) {
        bail!("resolution must be > 0, got {}", args.resolution);
    }

    let grid_id = match &args.grid_id {
        Some(id) => id.clone(),
        None => args
            .grid
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
            .context("cannot derive a grid id from the grid file name; pass --grid-id")?,
    };

    let file = File::open(&args.grid)
        .with_context(|| format!("failed to open grid file {}", args.grid.display()))?;
    let description: GridDescription = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse grid file {}", args.grid.display()))?;
    let (latitude, longitude) = description.into_coordinates();

    info!(
        grid_id = %grid_id,
        cells = latitude.len(),
        resolution = args.resolution,
        "Loaded curvilinear grid"
    );

    let start = Instant::now();
    let mapper = RegularGridMapper::build(&latitude, &longitude, args.resolution)
        .context("failed to build regular grid mapper")?;

    fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create output directory {}", args.output.display()))?;
    let path = args.output.join(mapper_file_name(&grid_id, args.resolution));
    mapper
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    let file_size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    info!(
        path = %path.display(),
        lat_count = mapper.lat_count(),
        lon_count = mapper.lon_count(),
        mapped_points = mapper.mapped_points(),
        size_mb = file_size as f64 / 1024.0 / 1024.0,
        elapsed_s = start.elapsed().as_secs_f64(),
        "Wrote regular grid mapper"
    );

    Ok(())
}
