//! Error types for landtherm rasters

use crate::raster::Extent;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for raster operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load raster {}: {reason}", .path.display())]
    RasterLoad { path: PathBuf, reason: String },

    #[error("Failed to write raster {}: {reason}", .path.display())]
    RasterWrite { path: PathBuf, reason: String },

    #[error(
        "Grid shape mismatch: expected {}x{} over {expected_extent}, got {}x{} over {actual_extent}",
        .expected.1, .expected.0, .actual.1, .actual.0
    )]
    GridShapeMismatch {
        /// (rows, cols) of the reference grid
        expected: (usize, usize),
        expected_extent: Extent,
        /// (rows, cols) of the offending grid
        actual: (usize, usize),
        actual_extent: Extent,
    },

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Attach a path to a raster read failure
    pub fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::RasterLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Attach a path to a raster write failure
    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::RasterWrite {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for raster operations
pub type Result<T> = std::result::Result<T, Error>;
