//! Imagery algorithms
//!
//! - Fixed-formula raster algebra for the land surface temperature chain:
//!   TOA reflectance, NDVI-based emissivity, brightness temperature, LST

mod algebra;

pub use algebra::{
    evaluate, Formula, Operand, BAND10_WAVELENGTH, C2, EMISSIVITY_BASE, EMISSIVITY_SLOPE,
    KELVIN_OFFSET, NDVI_MIN,
};
