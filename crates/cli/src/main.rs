//! landtherm CLI - land surface temperature from Landsat 8/9 scenes

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use landtherm_algorithms::landsat::{
    self, AngleUnit, IntermediateStorage, LandsatScene, LstConfig, LstParams, NDVI_MAX_RANGE,
};
use landtherm_core::io::{read_geotiff, write_geotiff, GeoTiffOptions};
use landtherm_core::RasterGrid;

/// Default output file name, written next to the input bands
const DEFAULT_OUTPUT_NAME: &str = "OUTPUT_LST.tif";

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "landtherm")]
#[command(
    author,
    version,
    about = "Land surface temperature from Landsat 8/9 Level-1 scenes",
    long_about = None
)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute land surface temperature (°C) for a scene directory
    Lst {
        /// Directory holding the *MTL.txt file and bands 4, 5 and 10
        input_dir: PathBuf,
        /// Output file [default: <INPUT_DIR>/OUTPUT_LST.tif]
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Upper NDVI bound of the emissivity ramp (0.5 - 0.8)
        #[arg(long, default_value = "0.6", value_parser = parse_ndvi_max)]
        ndvi_max: f64,
        /// How SUN_ELEVATION is passed to the sine
        #[arg(long, value_enum, default_value = "radians")]
        sun_elevation_units: Units,
        /// Where intermediate grids are kept during the run
        #[arg(long, value_enum, default_value = "memory")]
        intermediates: Storage,
        /// Nodata value for the input bands (e.g. 0 for Landsat fill)
        #[arg(long)]
        band_nodata: Option<f64>,
        /// Write 64-bit float samples instead of 32-bit
        #[arg(long)]
        float64: bool,
    },
    /// Show the calibration constants parsed from a scene's MTL file
    Metadata {
        /// Scene directory
        input_dir: PathBuf,
    },
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Units {
    Radians,
    Degrees,
}

impl From<Units> for AngleUnit {
    fn from(u: Units) -> Self {
        match u {
            Units::Radians => AngleUnit::Radians,
            Units::Degrees => AngleUnit::Degrees,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Storage {
    Memory,
    Disk,
}

impl From<Storage> for IntermediateStorage {
    fn from(s: Storage) -> Self {
        match s {
            Storage::Memory => IntermediateStorage::Memory,
            Storage::Disk => IntermediateStorage::Disk,
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn parse_ndvi_max(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("not a number: {e}"))?;
    if NDVI_MAX_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "must be within [{}, {}]",
            NDVI_MAX_RANGE.start(),
            NDVI_MAX_RANGE.end()
        ))
    }
}

fn write_result(raster: &RasterGrid, path: &Path, options: GeoTiffOptions) -> Result<()> {
    let pb = spinner("Writing output...");
    let result = write_geotiff(raster, path, Some(options)).context("Failed to write output");
    pb.finish_and_clear();
    result
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn print_info(input: &Path, raster: &RasterGrid) {
    let (rows, cols) = raster.shape();
    let extent = raster.extent();
    let stats = raster.statistics();

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
    println!("Cell size: {}", raster.cell_size());
    println!("Extent: {}", extent);
    if let Some(crs) = raster.crs() {
        println!("CRS: {}", crs);
    }
    if let Some(nodata) = raster.nodata() {
        println!("NoData: {}", nodata);
    }
    println!("\nStatistics:");
    if let Some(min) = stats.min {
        println!("  Min: {:.4}", min);
    }
    if let Some(max) = stats.max {
        println!("  Max: {:.4}", max);
    }
    if let Some(mean) = stats.mean {
        println!("  Mean: {:.4}", mean);
    }
    if !raster.is_empty() {
        println!(
            "  Valid cells: {} ({:.1}%)",
            stats.valid_count,
            100.0 * stats.valid_count as f64 / raster.len() as f64
        );
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Lst {
            input_dir,
            output,
            ndvi_max,
            sun_elevation_units,
            intermediates,
            band_nodata,
            float64,
        } => {
            let output = output.unwrap_or_else(|| input_dir.join(DEFAULT_OUTPUT_NAME));
            let config = LstConfig {
                input_dir,
                params: LstParams {
                    ndvi_max,
                    sun_elevation_units: sun_elevation_units.into(),
                    intermediates: intermediates.into(),
                    band_nodata,
                },
            };
            info!(
                input = %config.input_dir.display(),
                ndvi_max,
                "computing land surface temperature"
            );

            let start = Instant::now();
            let pb = spinner("Computing land surface temperature...");
            let result = landsat::run(&config);
            pb.finish_and_clear();
            let lst = result.context("Failed to compute land surface temperature")?;
            let elapsed = start.elapsed();

            let options = if float64 {
                GeoTiffOptions::float64()
            } else {
                GeoTiffOptions::default()
            };
            write_result(&lst, &output, options)?;
            done("Land surface temperature", &output, elapsed);
        }

        Commands::Metadata { input_dir } => {
            let scene = LandsatScene::open(&input_dir).context("Failed to open scene")?;
            let meta = scene.metadata();
            let c = &meta.calibration;

            println!("MTL: {}", scene.mtl_path().display());
            if let Some(id) = &meta.product_id {
                println!("Product: {}", id);
            }
            if let Some(craft) = &meta.spacecraft_id {
                println!("Spacecraft: {}", craft);
            }
            if let Some(date) = &meta.date_acquired {
                println!("Acquired: {}", date);
            }
            if let Some(zone) = meta.utm_zone {
                println!("UTM zone: {}", zone);
            }
            println!("\nBands:");
            println!("  B4:  {}", c.band_file4.display());
            println!("  B5:  {}", c.band_file5.display());
            println!("  B10: {}", c.band_file10.display());
            println!("\nCalibration:");
            println!("  SUN_ELEVATION:            {}", c.sun_elevation);
            println!("  REFLECTANCE_MULT_BAND_4:  {:e}", c.refl_mult_band4);
            println!("  REFLECTANCE_ADD_BAND_4:   {}", c.refl_add_band4);
            println!("  REFLECTANCE_MULT_BAND_5:  {:e}", c.refl_mult_band5);
            println!("  REFLECTANCE_ADD_BAND_5:   {}", c.refl_add_band5);
            println!("  RADIANCE_MULT_BAND_10:    {:e}", c.rad_mult_band10);
            println!("  RADIANCE_ADD_BAND_10:     {}", c.rad_add_band10);
            println!("  K1_CONSTANT_BAND_10:      {}", c.k1_band10);
            println!("  K2_CONSTANT_BAND_10:      {}", c.k2_band10);
        }

        Commands::Info { input } => {
            let pb = spinner("Reading raster...");
            let raster = read_geotiff(&input);
            pb.finish_and_clear();
            let raster = raster.context("Failed to read raster")?;
            print_info(&input, &raster);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ndvi_max_parser() {
        assert_eq!(parse_ndvi_max("0.6"), Ok(0.6));
        assert!(parse_ndvi_max("0.9").is_err());
        assert!(parse_ndvi_max("abc").is_err());
    }

    #[test]
    fn test_lst_defaults() {
        let cli = Cli::try_parse_from(["landtherm", "lst", "/data/scene"]).unwrap();
        match cli.command {
            Commands::Lst {
                ndvi_max,
                sun_elevation_units,
                intermediates,
                output,
                ..
            } => {
                assert_eq!(ndvi_max, 0.6);
                assert_eq!(AngleUnit::from(sun_elevation_units), AngleUnit::Radians);
                assert_eq!(IntermediateStorage::from(intermediates), IntermediateStorage::Memory);
                assert!(output.is_none());
            }
            _ => panic!("expected lst command"),
        }
    }
}
