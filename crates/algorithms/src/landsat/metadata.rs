//! Landsat MTL metadata
//!
//! MTL files are line-oriented `KEY = VALUE` text grouped by
//! `GROUP = ...` / `END_GROUP = ...` markers. Groups carry no meaning for
//! the LST chain, so the document is read as a flat map where the first
//! occurrence of a key wins.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// MTL keys read by the LST chain
pub mod keys {
    pub const FILE_NAME_BAND_4: &str = "FILE_NAME_BAND_4";
    pub const FILE_NAME_BAND_5: &str = "FILE_NAME_BAND_5";
    pub const FILE_NAME_BAND_10: &str = "FILE_NAME_BAND_10";
    pub const SUN_ELEVATION: &str = "SUN_ELEVATION";
    pub const REFLECTANCE_MULT_BAND_4: &str = "REFLECTANCE_MULT_BAND_4";
    pub const REFLECTANCE_MULT_BAND_5: &str = "REFLECTANCE_MULT_BAND_5";
    pub const REFLECTANCE_ADD_BAND_4: &str = "REFLECTANCE_ADD_BAND_4";
    pub const REFLECTANCE_ADD_BAND_5: &str = "REFLECTANCE_ADD_BAND_5";
    pub const RADIANCE_MULT_BAND_10: &str = "RADIANCE_MULT_BAND_10";
    pub const RADIANCE_ADD_BAND_10: &str = "RADIANCE_ADD_BAND_10";
    pub const K1_CONSTANT_BAND_10: &str = "K1_CONSTANT_BAND_10";
    pub const K2_CONSTANT_BAND_10: &str = "K2_CONSTANT_BAND_10";

    pub const SPACECRAFT_ID: &str = "SPACECRAFT_ID";
    pub const LANDSAT_PRODUCT_ID: &str = "LANDSAT_PRODUCT_ID";
    pub const DATE_ACQUIRED: &str = "DATE_ACQUIRED";
    pub const UTM_ZONE: &str = "UTM_ZONE";
}

/// Failure to extract a required value from MTL text
#[derive(Error, Debug)]
pub enum MetadataParseError {
    #[error("missing metadata key {0}")]
    MissingKey(&'static str),

    #[error("metadata key {key} has invalid value {value:?}: expected {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("cannot read metadata file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

type Result<T> = std::result::Result<T, MetadataParseError>;

/// Flat `KEY = VALUE` view of an MTL file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MtlDocument {
    entries: HashMap<String, String>,
}

impl MtlDocument {
    /// Tokenize MTL text.
    ///
    /// A line is an assignment when its left-hand side is a single bare
    /// token; the key must match exactly, so `FILE_NAME_BAND_1` never
    /// picks up `FILE_NAME_BAND_10`.
    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();

        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                continue;
            }
            entries
                .entry(key.to_string())
                .or_insert_with(|| value.trim().to_string());
        }

        Self { entries }
    }

    /// Raw value, whitespace-trimmed
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value with surrounding double quotes removed
    pub fn string(&self, key: &str) -> Option<&str> {
        self.raw(key).map(|v| v.trim_matches('"'))
    }

    pub fn require_string(&self, key: &'static str) -> Result<&str> {
        let value = self.string(key).ok_or(MetadataParseError::MissingKey(key))?;
        if value.is_empty() {
            return Err(MetadataParseError::InvalidValue {
                key,
                value: value.to_string(),
                expected: "a non-empty file name",
            });
        }
        Ok(value)
    }

    pub fn require_f64(&self, key: &'static str) -> Result<f64> {
        let raw = self.raw(key).ok_or(MetadataParseError::MissingKey(key))?;
        raw.parse().map_err(|_| MetadataParseError::InvalidValue {
            key,
            value: raw.to_string(),
            expected: "a floating point number",
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Landsat 8/9 bands used by the LST chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    /// OLI band 4
    Red,
    /// OLI band 5
    Nir,
    /// TIRS band 10
    Thermal,
}

impl Band {
    pub fn number(self) -> u8 {
        match self {
            Band::Red => 4,
            Band::Nir => 5,
            Band::Thermal => 10,
        }
    }
}

/// Calibration constants and band file names for one scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConstants {
    /// `SUN_ELEVATION` exactly as written in the MTL file
    pub sun_elevation: f64,
    pub refl_mult_band4: f64,
    pub refl_mult_band5: f64,
    pub refl_add_band4: f64,
    pub refl_add_band5: f64,
    pub rad_mult_band10: f64,
    pub rad_add_band10: f64,
    pub k1_band10: f64,
    pub k2_band10: f64,
    pub band_file4: PathBuf,
    pub band_file5: PathBuf,
    pub band_file10: PathBuf,
}

impl CalibrationConstants {
    pub fn from_mtl(doc: &MtlDocument) -> Result<Self> {
        Ok(Self {
            band_file4: doc.require_string(keys::FILE_NAME_BAND_4)?.into(),
            band_file5: doc.require_string(keys::FILE_NAME_BAND_5)?.into(),
            band_file10: doc.require_string(keys::FILE_NAME_BAND_10)?.into(),
            sun_elevation: doc.require_f64(keys::SUN_ELEVATION)?,
            refl_mult_band4: doc.require_f64(keys::REFLECTANCE_MULT_BAND_4)?,
            refl_mult_band5: doc.require_f64(keys::REFLECTANCE_MULT_BAND_5)?,
            refl_add_band4: doc.require_f64(keys::REFLECTANCE_ADD_BAND_4)?,
            refl_add_band5: doc.require_f64(keys::REFLECTANCE_ADD_BAND_5)?,
            rad_mult_band10: doc.require_f64(keys::RADIANCE_MULT_BAND_10)?,
            rad_add_band10: doc.require_f64(keys::RADIANCE_ADD_BAND_10)?,
            k1_band10: doc.require_f64(keys::K1_CONSTANT_BAND_10)?,
            k2_band10: doc.require_f64(keys::K2_CONSTANT_BAND_10)?,
        })
    }

    /// File name of `band`, relative to the scene directory
    pub fn band_file(&self, band: Band) -> &Path {
        match band {
            Band::Red => &self.band_file4,
            Band::Nir => &self.band_file5,
            Band::Thermal => &self.band_file10,
        }
    }
}

/// Parse MTL text into calibration constants
pub fn parse_mtl(text: &str) -> Result<CalibrationConstants> {
    CalibrationConstants::from_mtl(&MtlDocument::parse(text))
}

/// Calibration constants plus descriptive scene fields.
///
/// The descriptive fields are optional; a missing one is never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub calibration: CalibrationConstants,
    pub spacecraft_id: Option<String>,
    pub product_id: Option<String>,
    pub date_acquired: Option<String>,
    pub utm_zone: Option<u32>,
}

impl SceneMetadata {
    pub fn from_mtl(doc: &MtlDocument) -> Result<Self> {
        let owned = |key| doc.string(key).map(str::to_string);
        Ok(Self {
            calibration: CalibrationConstants::from_mtl(doc)?,
            spacecraft_id: owned(keys::SPACECRAFT_ID),
            product_id: owned(keys::LANDSAT_PRODUCT_ID),
            date_acquired: owned(keys::DATE_ACQUIRED),
            utm_zone: doc.raw(keys::UTM_ZONE).and_then(|z| z.parse().ok()),
        })
    }

    pub fn parse(text: &str) -> Result<Self> {
        Self::from_mtl(&MtlDocument::parse(text))
    }
}
