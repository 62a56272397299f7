//! Affine georeferencing and bounding boxes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and map coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// Landsat Level-1 bands are north-up, so both rotations are 0 and
/// `pixel_height` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
    pub row_rotation: f64,
    pub col_rotation: f64,
}

impl GeoTransform {
    /// Create a north-up transform
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Map coordinates of the top-left corner of pixel (col, row)
    pub fn corner(&self, col: usize, row: usize) -> (f64, f64) {
        let (c, r) = (col as f64, row as f64);
        (
            self.origin_x + c * self.pixel_width + r * self.row_rotation,
            self.origin_y + c * self.col_rotation + r * self.pixel_height,
        )
    }

    /// Map coordinates of the center of pixel (col, row)
    pub fn center(&self, col: usize, row: usize) -> (f64, f64) {
        let (x, y) = self.corner(col, row);
        (
            x + 0.5 * (self.pixel_width + self.row_rotation),
            y + 0.5 * (self.col_rotation + self.pixel_height),
        )
    }

    /// Cell size along X (assumes square pixels)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Bounding box covered by a `cols` x `rows` grid
    pub fn extent(&self, cols: usize, rows: usize) -> Extent {
        let corners = [
            self.corner(0, 0),
            self.corner(cols, 0),
            self.corner(0, rows),
            self.corner(cols, rows),
        ];

        corners.iter().fold(
            Extent {
                min_x: f64::INFINITY,
                min_y: f64::INFINITY,
                max_x: f64::NEG_INFINITY,
                max_y: f64::NEG_INFINITY,
            },
            |e, &(x, y)| Extent {
                min_x: e.min_x.min(x),
                min_y: e.min_y.min(y),
                max_x: e.max_x.max(x),
                max_y: e.max_y.max(y),
            },
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

/// Axis-aligned bounding box in map units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// Whether every edge of `self` lies within `tolerance` of the matching edge of `other`
    pub fn approx_eq(&self, other: &Extent, tolerance: f64) -> bool {
        (self.min_x - other.min_x).abs() <= tolerance
            && (self.min_y - other.min_y).abs() <= tolerance
            && (self.max_x - other.max_x).abs() <= tolerance
            && (self.max_y - other.max_y).abs() <= tolerance
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.3}, {:.3}) - ({:.3}, {:.3})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_extent_north_up() {
        // 30 m Landsat-like grid
        let gt = GeoTransform::new(300_000.0, 4_000_000.0, 30.0, -30.0);
        let e = gt.extent(100, 50);

        assert_relative_eq!(e.min_x, 300_000.0, epsilon = 1e-9);
        assert_relative_eq!(e.max_x, 303_000.0, epsilon = 1e-9);
        assert_relative_eq!(e.min_y, 3_998_500.0, epsilon = 1e-9);
        assert_relative_eq!(e.max_y, 4_000_000.0, epsilon = 1e-9);
        assert_relative_eq!(e.width(), 3000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pixel_center() {
        let gt = GeoTransform::new(100.0, 200.0, 10.0, -10.0);
        let (x, y) = gt.center(5, 10);
        assert_relative_eq!(x, 155.0, epsilon = 1e-10);
        assert_relative_eq!(y, 95.0, epsilon = 1e-10);
    }

    #[test]
    fn test_extent_tolerance() {
        let a = GeoTransform::new(0.0, 10.0, 1.0, -1.0).extent(10, 10);
        let b = GeoTransform::new(1e-9, 10.0, 1.0, -1.0).extent(10, 10);
        let c = GeoTransform::new(1.0, 10.0, 1.0, -1.0).extent(10, 10);

        assert!(a.approx_eq(&b, 1e-6));
        assert!(!a.approx_eq(&c, 1e-6));
    }
}
