//! Run configuration

use super::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Accepted range for the upper NDVI bound of the emissivity ramp
pub const NDVI_MAX_RANGE: RangeInclusive<f64> = 0.5..=0.8;
pub const DEFAULT_NDVI_MAX: f64 = 0.6;

/// How `SUN_ELEVATION` is fed to the reflectance sine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    /// Use the MTL value as radians, unchanged
    #[default]
    Radians,
    /// Treat the MTL value as degrees and convert before the sine
    Degrees,
}

impl AngleUnit {
    pub fn to_radians(self, value: f64) -> f64 {
        match self {
            AngleUnit::Radians => value,
            AngleUnit::Degrees => value.to_radians(),
        }
    }
}

/// Where intermediate grids live during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntermediateStorage {
    /// Keep intermediates in memory and drop each once consumed
    #[default]
    Memory,
    /// Write each intermediate as a GeoTIFF in the scene directory and
    /// read it back for the next stage
    Disk,
}

/// Parameters of the LST chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LstParams {
    /// Upper NDVI bound of the emissivity ramp, in [`NDVI_MAX_RANGE`]
    pub ndvi_max: f64,
    pub sun_elevation_units: AngleUnit,
    pub intermediates: IntermediateStorage,
    /// Overrides the nodata value of all three input bands
    pub band_nodata: Option<f64>,
}

impl Default for LstParams {
    fn default() -> Self {
        Self {
            ndvi_max: DEFAULT_NDVI_MAX,
            sun_elevation_units: AngleUnit::default(),
            intermediates: IntermediateStorage::default(),
            band_nodata: None,
        }
    }
}

impl LstParams {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !NDVI_MAX_RANGE.contains(&self.ndvi_max) {
            return Err(PipelineError::InvalidParameter {
                name: "ndvi_max",
                value: self.ndvi_max.to_string(),
                reason: format!(
                    "must be within [{}, {}]",
                    NDVI_MAX_RANGE.start(),
                    NDVI_MAX_RANGE.end()
                ),
            });
        }
        if let Some(nd) = self.band_nodata.filter(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidParameter {
                name: "band_nodata",
                value: nd.to_string(),
                reason: "must be a finite number".into(),
            });
        }
        Ok(())
    }
}

/// Everything needed for one `run`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstConfig {
    /// Directory holding the MTL file and the band GeoTIFFs
    pub input_dir: PathBuf,
    #[serde(default)]
    pub params: LstParams,
}

impl LstConfig {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            params: LstParams::default(),
        }
    }

    pub fn with_ndvi_max(mut self, ndvi_max: f64) -> Self {
        self.params.ndvi_max = ndvi_max;
        self
    }

    pub fn with_intermediates(mut self, intermediates: IntermediateStorage) -> Self {
        self.params.intermediates = intermediates;
        self
    }
}
