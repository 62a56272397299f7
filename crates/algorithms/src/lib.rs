//! # landtherm algorithms
//!
//! Land surface temperature from Landsat 8/9 Level-1 imagery.
//!
//! ## Modules
//!
//! - **imagery**: fixed-formula raster algebra (reflectance, emissivity,
//!   brightness temperature, LST)
//! - **landsat**: MTL metadata, scene discovery and the LST pipeline
//!
//! ```ignore
//! use landtherm_algorithms::landsat::{run, LstConfig};
//!
//! let lst = run(&LstConfig::new("/data/LC08_L1TP_233083_20230115").with_ndvi_max(0.6))?;
//! ```

pub mod imagery;
pub mod landsat;
mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::imagery::{evaluate, Formula, Operand};
    pub use crate::landsat::{
        run, LandSurfaceTemperature, LandsatScene, LstConfig, LstParams, LstPipeline,
        PipelineError,
    };
    pub use landtherm_core::prelude::*;
}
