//! # landtherm core
//!
//! Core types and I/O shared by the landtherm crates.
//!
//! This crate provides:
//! - `RasterGrid`: single-band `f64` raster with georeferencing and nodata
//! - `GeoTransform` / `Extent`: affine georeferencing and bounding boxes
//! - `CRS`: EPSG-based coordinate reference system tag
//! - Native GeoTIFF reading and writing
//! - The `Algorithm` trait implemented by processing chains

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{Extent, GeoTransform, RasterGrid, RasterStatistics};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{Extent, GeoTransform, RasterGrid};
    pub use crate::Algorithm;
}

/// Core trait for processing chains.
///
/// An algorithm turns an input into an output under a set of parameters,
/// without keeping state between calls.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(
        &self,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
