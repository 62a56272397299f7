//! Raster data structures

mod geotransform;
mod grid;

pub use geotransform::{Extent, GeoTransform};
pub use grid::{RasterGrid, RasterStatistics, EXTENT_TOLERANCE};
