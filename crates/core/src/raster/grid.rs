//! Main raster type

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{Extent, GeoTransform};
use ndarray::{Array2, ArrayView2};

/// Maximum distance (map units) between the edges of two extents that are
/// still considered the same grid.
pub const EXTENT_TOLERANCE: f64 = 1e-6;

/// A georeferenced single-band raster of `f64` cells.
///
/// Band DNs, reflectances and temperatures all live in the same cell type so
/// that every algebra stage can consume the output of the previous one.
///
/// # Example
///
/// ```ignore
/// use landtherm_core::RasterGrid;
///
/// let mut grid = RasterGrid::new(100, 100);
/// grid.set(10, 20, 42.0)?;
/// let value = grid.get(10, 20)?;
/// ```
#[derive(Debug, Clone)]
pub struct RasterGrid {
    /// Cell values in row-major order (row, col)
    data: Array2<f64>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<f64>,
}

impl RasterGrid {
    /// Create a new grid filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Create a new grid filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a grid from a row-major buffer
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 || data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a grid from an ndarray
    pub fn from_array(data: Array2<f64>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// New grid with the same georeferencing and the given cells.
    ///
    /// The nodata value is not carried over.
    pub fn with_same_meta(&self, data: Array2<f64>) -> Result<Self> {
        if data.dim() != self.shape() {
            let (rows, cols) = data.dim();
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        Ok(Self {
            data,
            transform: self.transform,
            crs: self.crs,
            nodata: None,
        })
    }

    // Dimensions

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let (rows, cols) = self.shape();
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds {
                row,
                col,
                rows,
                cols,
            }),
        }
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    /// Consume the grid and return the underlying array
    pub fn into_array(self) -> Array2<f64> {
        self.data
    }

    // Metadata

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<f64>) {
        self.nodata = nodata;
    }

    /// Cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Map-space bounding box
    pub fn extent(&self) -> Extent {
        self.transform.extent(self.cols(), self.rows())
    }

    // Alignment

    /// Same shape and, within [`EXTENT_TOLERANCE`], the same extent.
    pub fn is_aligned_with(&self, other: &RasterGrid) -> bool {
        self.shape() == other.shape() && self.extent().approx_eq(&other.extent(), EXTENT_TOLERANCE)
    }

    /// Fail with [`Error::GridShapeMismatch`] unless `other` covers the same grid.
    pub fn ensure_aligned(&self, other: &RasterGrid) -> Result<()> {
        if self.is_aligned_with(other) {
            return Ok(());
        }
        Err(Error::GridShapeMismatch {
            expected: self.shape(),
            expected_extent: self.extent(),
            actual: other.shape(),
            actual_extent: other.extent(),
        })
    }

    // Value checks

    /// NaN is always nodata; otherwise the value must equal the grid's nodata value.
    pub fn is_nodata(&self, value: f64) -> bool {
        value.is_nan() || self.nodata.is_some_and(|nd| value == nd)
    }

    pub fn is_nodata_at(&self, row: usize, col: usize) -> Result<bool> {
        let value = self.get(row, col)?;
        Ok(self.is_nodata(value))
    }

    // Statistics

    /// Min, max and mean over valid cells
    pub fn statistics(&self) -> RasterStatistics {
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        let mut sum = 0.0;
        let mut count = 0usize;

        for &value in self.data.iter().filter(|&&v| !self.is_nodata(v)) {
            min = Some(min.map_or(value, |m| m.min(value)));
            max = Some(max.map_or(value, |m| m.max(value)));
            sum += value;
            count += 1;
        }

        RasterStatistics {
            min,
            max,
            mean: (count > 0).then(|| sum / count as f64),
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = RasterGrid::new(100, 200);
        assert_eq!(grid.rows(), 100);
        assert_eq!(grid.cols(), 200);
        assert_eq!(grid.shape(), (100, 200));
    }

    #[test]
    fn test_from_vec_rejects_bad_length() {
        assert!(RasterGrid::from_vec(vec![1.0; 5], 2, 3).is_err());
        assert!(RasterGrid::from_vec(vec![], 0, 3).is_err());
        assert!(RasterGrid::from_vec(vec![1.0; 6], 2, 3).is_ok());
    }

    #[test]
    fn test_access_out_of_bounds() {
        let mut grid = RasterGrid::new(10, 10);
        grid.set(5, 5, 42.0).unwrap();
        assert_eq!(grid.get(5, 5).unwrap(), 42.0);
        assert!(matches!(
            grid.get(10, 0),
            Err(Error::IndexOutOfBounds { row: 10, .. })
        ));
        assert!(grid.set(0, 10, 1.0).is_err());
    }

    #[test]
    fn test_alignment() {
        let mut a = RasterGrid::new(4, 4);
        a.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));
        let b = a.clone();
        let mut shifted = a.clone();
        shifted.set_transform(GeoTransform::new(2.0, 4.0, 1.0, -1.0));
        let smaller = RasterGrid::new(4, 3);

        assert!(a.ensure_aligned(&b).is_ok());
        assert!(matches!(
            a.ensure_aligned(&shifted),
            Err(Error::GridShapeMismatch { .. })
        ));
        assert!(matches!(
            a.ensure_aligned(&smaller),
            Err(Error::GridShapeMismatch {
                expected: (4, 4),
                actual: (4, 3),
                ..
            })
        ));
    }

    #[test]
    fn test_nodata() {
        let mut grid = RasterGrid::filled(2, 2, 1.0);
        grid.set_nodata(Some(0.0));
        grid.set(0, 0, 0.0).unwrap();
        grid.set(0, 1, f64::NAN).unwrap();

        assert!(grid.is_nodata_at(0, 0).unwrap());
        assert!(grid.is_nodata_at(0, 1).unwrap());
        assert!(!grid.is_nodata_at(1, 1).unwrap());
    }

    #[test]
    fn test_statistics() {
        let mut grid = RasterGrid::new(10, 10);
        for i in 0..10 {
            for j in 0..10 {
                grid.set(i, j, (i * 10 + j) as f64).unwrap();
            }
        }
        grid.set(9, 9, f64::NAN).unwrap();

        let stats = grid.statistics();
        assert_eq!(stats.min, Some(0.0));
        assert_eq!(stats.max, Some(98.0));
        assert_eq!(stats.valid_count, 99);
        assert_eq!(stats.nodata_count, 1);
    }
}
