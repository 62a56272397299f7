//! Landsat 8/9 Level-1 land surface temperature
//!
//! - MTL metadata parsing: calibration constants and band file names
//! - Scene discovery in an input directory
//! - The LST pipeline: reflectance, emissivity, brightness temperature, LST

mod config;
mod error;
mod metadata;
mod pipeline;
mod scene;

pub use config::{
    AngleUnit, IntermediateStorage, LstConfig, LstParams, DEFAULT_NDVI_MAX, NDVI_MAX_RANGE,
};
pub use error::{ErrorKind, PipelineError};
pub use metadata::{
    keys, parse_mtl, Band, CalibrationConstants, MetadataParseError, MtlDocument, SceneMetadata,
};
pub use pipeline::{run, Intermediate, LandSurfaceTemperature, LstPipeline, Stage};
pub use scene::{find_mtl, LandsatScene, MTL_SUFFIX};
