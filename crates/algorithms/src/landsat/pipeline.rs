//! The five-stage land surface temperature chain
//!
//! ```text
//! LoadBands -> ComputeReflectance4 -> ComputeReflectance5 -> ComputeEmissivity
//!           -> ComputeBrightnessTemp -> ComputeLst -> Cleanup
//! ```
//!
//! Stages run one after another on the calling thread. The first failure
//! stops the run; intermediates written so far are removed on every exit
//! path.

use super::config::{AngleUnit, IntermediateStorage, LstConfig, LstParams};
use super::error::PipelineError;
use super::metadata::Band;
use super::scene::LandsatScene;
use crate::imagery::{evaluate, Formula, Operand};
use landtherm_core::io::{read_geotiff, write_geotiff, GeoTiffOptions};
use landtherm_core::{Algorithm, RasterGrid, CRS};
use std::fmt;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Steps of an LST run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    LoadBands,
    ComputeReflectance4,
    ComputeReflectance5,
    ComputeEmissivity,
    ComputeBrightnessTemp,
    ComputeLst,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::LoadBands => "load bands",
            Stage::ComputeReflectance4 => "band 4 reflectance",
            Stage::ComputeReflectance5 => "band 5 reflectance",
            Stage::ComputeEmissivity => "emissivity",
            Stage::ComputeBrightnessTemp => "brightness temperature",
            Stage::ComputeLst => "land surface temperature",
            Stage::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Transient grids handed from one stage to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intermediate {
    Reflectance4,
    Reflectance5,
    Emissivity,
    BrightnessTemp,
}

impl Intermediate {
    pub const ALL: [Intermediate; 4] = [
        Intermediate::Reflectance4,
        Intermediate::Reflectance5,
        Intermediate::Emissivity,
        Intermediate::BrightnessTemp,
    ];

    /// File name used in [`IntermediateStorage::Disk`] mode
    pub fn file_name(self) -> &'static str {
        match self {
            Intermediate::Reflectance4 => "OUTPUT_RIFL_4.tif",
            Intermediate::Reflectance5 => "OUTPUT_RIFL_5.tif",
            Intermediate::Emissivity => "OUTPUT_E.tif",
            Intermediate::BrightnessTemp => "OUTPUT_TOA_BRIGHTNESS.tif",
        }
    }
}

/// Holds intermediates for the lifetime of one run.
///
/// In disk mode every path is recorded before it is written, and whatever
/// was recorded is removed on `cleanup` or on drop.
struct IntermediateStore<'a> {
    mode: IntermediateStorage,
    dir: &'a Path,
    written: Vec<PathBuf>,
}

impl<'a> IntermediateStore<'a> {
    fn new(mode: IntermediateStorage, dir: &'a Path) -> Self {
        Self {
            mode,
            dir,
            written: Vec::new(),
        }
    }

    /// Hand `grid` over as `which`, persisting it first in disk mode
    fn stash(
        &mut self,
        which: Intermediate,
        grid: RasterGrid,
    ) -> landtherm_core::Result<RasterGrid> {
        match self.mode {
            IntermediateStorage::Memory => Ok(grid),
            IntermediateStorage::Disk => {
                let path = self.dir.join(which.file_name());
                self.written.push(path.clone());
                write_geotiff(&grid, &path, Some(GeoTiffOptions::float64()))?;
                debug!(path = %path.display(), "wrote intermediate");
                drop(grid);
                read_geotiff(&path)
            }
        }
    }

    fn cleanup(&mut self) {
        for path in self.written.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed intermediate"),
                Err(e) if e.kind() == IoErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "cannot remove intermediate"),
            }
        }
    }
}

impl Drop for IntermediateStore<'_> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Runs the LST chain over a [`LandsatScene`]
#[derive(Debug, Clone, Default)]
pub struct LstPipeline {
    params: LstParams,
    cancel: Option<Arc<AtomicBool>>,
}

impl LstPipeline {
    pub fn new(params: LstParams) -> Self {
        Self {
            params,
            cancel: None,
        }
    }

    /// Stop the run at the next stage boundary once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn params(&self) -> &LstParams {
        &self.params
    }

    /// Compute land surface temperature (°C) for `scene`.
    ///
    /// The output covers the same grid as the input bands and uses NaN as
    /// nodata.
    pub fn run(&self, scene: &LandsatScene) -> Result<RasterGrid, PipelineError> {
        self.params.validate()?;

        let calib = &scene.metadata().calibration;
        let units = self.params.sun_elevation_units;
        if units == AngleUnit::Radians && calib.sun_elevation.abs() > std::f64::consts::TAU {
            warn!(
                sun_elevation = calib.sun_elevation,
                "SUN_ELEVATION is used as radians but looks like degrees"
            );
        }
        let sun_elevation = units.to_radians(calib.sun_elevation);
        debug!(sun_elevation, ndvi_max = self.params.ndvi_max, ?units, "run parameters");

        let mut store = IntermediateStore::new(self.params.intermediates, scene.directory());

        info!(stage = %Stage::LoadBands, "starting");
        let b4 = self.load_band(scene, Band::Red)?;
        let b5 = self.load_band(scene, Band::Nir)?;
        let b10 = self.load_band(scene, Band::Thermal)?;

        let rifl4 = self.stage(Stage::ComputeReflectance4, || {
            let grid = evaluate(
                &Formula::Reflectance {
                    mult: calib.refl_mult_band4,
                    add: calib.refl_add_band4,
                    sun_elevation,
                },
                &[Operand::new("b4", &b4)],
            )?;
            store.stash(Intermediate::Reflectance4, grid)
        })?;
        drop(b4);

        let rifl5 = self.stage(Stage::ComputeReflectance5, || {
            let grid = evaluate(
                &Formula::Reflectance {
                    mult: calib.refl_mult_band5,
                    add: calib.refl_add_band5,
                    sun_elevation,
                },
                &[Operand::new("b5", &b5)],
            )?;
            store.stash(Intermediate::Reflectance5, grid)
        })?;
        drop(b5);

        let emissivity = self.stage(Stage::ComputeEmissivity, || {
            let grid = evaluate(
                &Formula::emissivity(self.params.ndvi_max),
                &[Operand::new("rifl5", &rifl5), Operand::new("rifl4", &rifl4)],
            )?;
            store.stash(Intermediate::Emissivity, grid)
        })?;
        drop(rifl4);
        drop(rifl5);

        let brightness = self.stage(Stage::ComputeBrightnessTemp, || {
            let grid = evaluate(
                &Formula::BrightnessTemperature {
                    rad_mult: calib.rad_mult_band10,
                    rad_add: calib.rad_add_band10,
                    k1: calib.k1_band10,
                    k2: calib.k2_band10,
                },
                &[Operand::new("b10", &b10)],
            )?;
            store.stash(Intermediate::BrightnessTemp, grid)
        })?;
        drop(b10);

        let mut lst = self.stage(Stage::ComputeLst, || {
            evaluate(
                &Formula::LandSurfaceTemperature,
                &[
                    Operand::new("brightness_temp", &brightness),
                    Operand::new("emissivity", &emissivity),
                ],
            )
        })?;
        drop(brightness);
        drop(emissivity);

        info!(stage = %Stage::Cleanup, "starting");
        store.cleanup();

        if lst.crs().is_none() {
            lst.set_crs(scene.metadata().utm_zone.and_then(CRS::utm_wgs84_north));
        }

        let stats = lst.statistics();
        info!(
            rows = lst.rows(),
            cols = lst.cols(),
            min = ?stats.min,
            max = ?stats.max,
            mean = ?stats.mean,
            valid = stats.valid_count,
            nodata = stats.nodata_count,
            "land surface temperature computed"
        );

        Ok(lst)
    }

    fn load_band(&self, scene: &LandsatScene, band: Band) -> Result<RasterGrid, PipelineError> {
        let path = scene.band_path(band);
        let mut grid = read_geotiff(&path).map_err(PipelineError::at(Stage::LoadBands))?;
        if let Some(nodata) = self.params.band_nodata {
            grid.set_nodata(Some(nodata));
        }
        debug!(
            band = band.number(),
            path = %path.display(),
            rows = grid.rows(),
            cols = grid.cols(),
            nodata = ?grid.nodata(),
            "loaded band"
        );
        Ok(grid)
    }

    fn stage<F>(&self, stage: Stage, compute: F) -> Result<RasterGrid, PipelineError>
    where
        F: FnOnce() -> landtherm_core::Result<RasterGrid>,
    {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            info!(before = %stage, "run cancelled");
            return Err(PipelineError::Cancelled { before: stage });
        }
        info!(%stage, "starting");
        compute().map_err(PipelineError::at(stage))
    }
}

/// Land surface temperature as an [`Algorithm`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LandSurfaceTemperature;

impl Algorithm for LandSurfaceTemperature {
    type Input = LandsatScene;
    type Output = RasterGrid;
    type Params = LstParams;
    type Error = PipelineError;

    fn name(&self) -> &'static str {
        "Land Surface Temperature"
    }

    fn description(&self) -> &'static str {
        "Emissivity-corrected surface temperature (°C) from Landsat 8/9 L1 bands 4, 5 and 10"
    }

    fn execute(&self, input: LandsatScene, params: LstParams) -> Result<RasterGrid, PipelineError> {
        LstPipeline::new(params).run(&input)
    }
}

/// Validate `config`, open the scene in `config.input_dir` and compute LST.
///
/// A missing MTL file fails before any raster is loaded.
pub fn run(config: &LstConfig) -> Result<RasterGrid, PipelineError> {
    config.params.validate()?;
    let scene = LandsatScene::open(&config.input_dir)?;
    LstPipeline::new(config.params.clone()).run(&scene)
}
