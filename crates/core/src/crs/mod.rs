//! Coordinate reference system tag
//!
//! Landsat Level-1 products are delivered in WGS84 / UTM north zones, so an
//! EPSG code is all the georeferencing identity this crate carries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG code base for WGS84 / UTM northern hemisphere zones
const UTM_NORTH_BASE: u32 = 32600;

/// Coordinate Reference System representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CRS {
    epsg: u32,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    /// WGS84 / UTM zone `zone` north (EPSG:326zz).
    ///
    /// Returns `None` for zones outside 1..=60.
    pub fn utm_wgs84_north(zone: u32) -> Option<Self> {
        (1..=60)
            .contains(&zone)
            .then(|| Self::from_epsg(UTM_NORTH_BASE + zone))
    }

    /// EPSG code
    pub fn epsg(&self) -> u32 {
        self.epsg
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utm_zone_codes() {
        assert_eq!(CRS::utm_wgs84_north(19).map(|c| c.epsg()), Some(32619));
        assert_eq!(CRS::utm_wgs84_north(0), None);
        assert_eq!(CRS::utm_wgs84_north(61), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(CRS::from_epsg(32633).to_string(), "EPSG:32633");
    }
}
