//! Fixed-formula raster algebra
//!
//! Each [`Formula`] is a scalar kernel evaluated cell by cell over one or
//! two aligned grids. Nodata in any operand produces nodata in the output;
//! numeric faults (division by zero, log of a non-positive number) produce
//! NaN in the affected cell only.

use crate::maybe_rayon::*;
use landtherm_core::raster::RasterGrid;
use landtherm_core::{Error, Result};
use ndarray::Array2;
use tracing::debug;

/// Lower NDVI bound of the emissivity ramp (bare soil)
pub const NDVI_MIN: f64 = 0.2;
/// Emissivity at `NDVI_MIN`
pub const EMISSIVITY_BASE: f64 = 0.986;
/// Emissivity gained across the full NDVI ramp
pub const EMISSIVITY_SLOPE: f64 = 0.004;
/// Kelvin to Celsius
pub const KELVIN_OFFSET: f64 = 273.15;
/// Effective wavelength of TIRS band 10 (µm)
pub const BAND10_WAVELENGTH: f64 = 10.895;
/// h·c/σ (µm·K)
pub const C2: f64 = 14388.0;

const MAX_OPERANDS: usize = 2;

/// The per-pixel formulas of the LST chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Formula {
    /// `(band·mult − add) / sin(sun_elevation)`
    ///
    /// `sun_elevation` is used as radians as given.
    Reflectance {
        mult: f64,
        add: f64,
        sun_elevation: f64,
    },
    /// `0.986 + 0.004 · ((NDVI − ndvi_min) / (ndvi_max − ndvi_min))`
    /// with `NDVI = (rifl5 − rifl4) / (rifl5 + rifl4)`
    Emissivity { ndvi_min: f64, ndvi_max: f64 },
    /// `k2 / ln(k1 / (b10·rad_mult + rad_add) + 1) − 273.15`, in °C
    BrightnessTemperature {
        rad_mult: f64,
        rad_add: f64,
        k1: f64,
        k2: f64,
    },
    /// `bt / (1 + (10.895 · bt / 14388) · ln(emissivity))`
    LandSurfaceTemperature,
}

impl Formula {
    /// Emissivity ramp starting at [`NDVI_MIN`]
    pub fn emissivity(ndvi_max: f64) -> Self {
        Formula::Emissivity {
            ndvi_min: NDVI_MIN,
            ndvi_max,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Formula::Reflectance { .. } => "reflectance",
            Formula::Emissivity { .. } => "emissivity",
            Formula::BrightnessTemperature { .. } => "brightness temperature",
            Formula::LandSurfaceTemperature => "land surface temperature",
        }
    }

    /// Operand roles, in the order [`evaluate`] expects them
    pub fn operand_roles(&self) -> &'static [&'static str] {
        match self {
            Formula::Reflectance { .. } => &["band"],
            Formula::Emissivity { .. } => &["rifl5", "rifl4"],
            Formula::BrightnessTemperature { .. } => &["b10"],
            Formula::LandSurfaceTemperature => &["brightness_temp", "emissivity"],
        }
    }

    pub fn arity(&self) -> usize {
        self.operand_roles().len()
    }

    /// Scalar kernel. `values` must hold exactly [`Formula::arity`] entries.
    pub fn apply(&self, values: &[f64]) -> f64 {
        match *self {
            Formula::Reflectance {
                mult,
                add,
                sun_elevation,
            } => (values[0] * mult - add) / sun_elevation.sin(),
            Formula::Emissivity { ndvi_min, ndvi_max } => {
                let (rifl5, rifl4) = (values[0], values[1]);
                let ndvi = (rifl5 - rifl4) / (rifl5 + rifl4);
                EMISSIVITY_BASE + EMISSIVITY_SLOPE * ((ndvi - ndvi_min) / (ndvi_max - ndvi_min))
            }
            Formula::BrightnessTemperature {
                rad_mult,
                rad_add,
                k1,
                k2,
            } => {
                let radiance = values[0] * rad_mult + rad_add;
                k2 / (k1 / radiance + 1.0).ln() - KELVIN_OFFSET
            }
            Formula::LandSurfaceTemperature => {
                let (bt, emissivity) = (values[0], values[1]);
                bt / (1.0 + (BAND10_WAVELENGTH * bt / C2) * emissivity.ln())
            }
        }
    }
}

/// A named grid bound to one operand role of a formula
#[derive(Debug, Clone, Copy)]
pub struct Operand<'a> {
    pub name: &'a str,
    pub grid: &'a RasterGrid,
}

impl<'a> Operand<'a> {
    pub fn new(name: &'a str, grid: &'a RasterGrid) -> Self {
        Self { name, grid }
    }
}

/// Evaluate `formula` over `operands`, producing a new grid.
///
/// All operands must share shape and extent with the first one; this is
/// checked before any cell is computed. The output inherits georeferencing
/// from the first operand and uses NaN as nodata.
///
/// # Example
/// ```ignore
/// let rifl4 = evaluate(
///     &Formula::Reflectance { mult: 2e-5, add: -0.1, sun_elevation: 0.9 },
///     &[Operand::new("b4", &band4)],
/// )?;
/// ```
pub fn evaluate(formula: &Formula, operands: &[Operand<'_>]) -> Result<RasterGrid> {
    if operands.len() != formula.arity() {
        return Err(Error::InvalidParameter {
            name: "operands",
            value: operands.len().to_string(),
            reason: format!(
                "{} expects {} operand(s): {}",
                formula.name(),
                formula.arity(),
                formula.operand_roles().join(", ")
            ),
        });
    }

    let reference = operands[0].grid;
    for operand in &operands[1..] {
        reference.ensure_aligned(operand.grid)?;
    }

    let (rows, cols) = reference.shape();
    debug!(
        formula = formula.name(),
        operands = ?operands.iter().map(|o| o.name).collect::<Vec<_>>(),
        rows,
        cols,
        "evaluating"
    );

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut values = [0.0; MAX_OPERANDS];

            'cells: for (col, cell) in row_data.iter_mut().enumerate() {
                for (slot, operand) in values.iter_mut().zip(operands) {
                    let v = operand.grid.data()[(row, col)];
                    if operand.grid.is_nodata(v) {
                        continue 'cells;
                    }
                    *slot = v;
                }

                let result = formula.apply(&values[..operands.len()]);
                if result.is_finite() {
                    *cell = result;
                }
            }
            row_data
        })
        .collect();

    let array =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    let mut output = reference.with_same_meta(array)?;
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use landtherm_core::GeoTransform;

    fn make_band(rows: usize, cols: usize, value: f64) -> RasterGrid {
        let mut g = RasterGrid::filled(rows, cols, value);
        g.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        g
    }

    fn all_formulas() -> Vec<Formula> {
        vec![
            Formula::Reflectance {
                mult: 2e-5,
                add: -0.1,
                sun_elevation: 1.0,
            },
            Formula::emissivity(0.6),
            Formula::BrightnessTemperature {
                rad_mult: 3.342e-4,
                rad_add: 0.1,
                k1: 774.8853,
                k2: 1321.0789,
            },
            Formula::LandSurfaceTemperature,
        ]
    }

    #[test]
    fn test_reflectance_scenario() {
        let band4 = make_band(3, 3, 0.3);
        let formula = Formula::Reflectance {
            mult: 0.00002,
            add: -0.1,
            sun_elevation: 1.0,
        };

        let result = evaluate(&formula, &[Operand::new("b4", &band4)]).unwrap();
        let val = result.get(1, 1).unwrap();

        let expected = (0.3 * 0.00002 + 0.1) / 1.0f64.sin();
        assert_relative_eq!(val, expected, epsilon = 1e-12);
        assert!((val - 0.1190).abs() < 1e-3, "got {val}");
    }

    #[test]
    fn test_emissivity_at_ndvi_min() {
        let rifl4 = make_band(2, 2, 0.12);
        let rifl5 = make_band(2, 2, 0.18);

        let result = evaluate(
            &Formula::emissivity(0.6),
            &[Operand::new("rifl5", &rifl5), Operand::new("rifl4", &rifl4)],
        )
        .unwrap();

        assert_relative_eq!(result.get(0, 0).unwrap(), 0.986, epsilon = 1e-12);
    }

    #[test]
    fn test_emissivity_at_ndvi_max() {
        // NDVI = (0.8 - 0.2) / (0.8 + 0.2) = 0.6 -> top of the ramp
        let e = Formula::emissivity(0.6).apply(&[0.8, 0.2]);
        assert_relative_eq!(e, 0.990, epsilon = 1e-12);
    }

    #[test]
    fn test_brightness_temperature() {
        let formula = Formula::BrightnessTemperature {
            rad_mult: 3.342e-4,
            rad_add: 0.1,
            k1: 774.8853,
            k2: 1321.0789,
        };
        let dn: f64 = 30_000.0;
        let radiance = dn * 3.342e-4 + 0.1;
        let expected = 1321.0789 / (774.8853 / radiance + 1.0).ln() - 273.15;

        let bt = formula.apply(&[dn]);
        assert_relative_eq!(bt, expected, epsilon = 1e-10);
        // A DN of 30000 is a warm summer surface
        assert!(bt > 20.0 && bt < 40.0, "got {bt}");
    }

    #[test]
    fn test_lst_with_unit_emissivity_is_identity() {
        let bt = make_band(2, 2, 25.0);
        let e = make_band(2, 2, 1.0);

        let result = evaluate(
            &Formula::LandSurfaceTemperature,
            &[Operand::new("brightness_temp", &bt), Operand::new("emissivity", &e)],
        )
        .unwrap();
        assert_relative_eq!(result.get(1, 0).unwrap(), 25.0, epsilon = 1e-12);
    }

    #[test]
    fn test_lst_correction_raises_temperature() {
        let lst = Formula::LandSurfaceTemperature.apply(&[25.0, 0.986]);
        let expected = 25.0 / (1.0 + (10.895 * 25.0 / 14388.0) * 0.986f64.ln());
        assert_relative_eq!(lst, expected, epsilon = 1e-12);
        assert!(lst > 25.0);
    }

    #[test]
    fn test_nodata_propagates_for_every_formula() {
        for formula in all_formulas() {
            let mut first = make_band(3, 3, 0.5);
            first.set_nodata(Some(-9999.0));
            first.set(1, 2, -9999.0).unwrap();
            let mut second = make_band(3, 3, 0.9);
            second.set(2, 0, f64::NAN).unwrap();

            let grids = [&first, &second];
            let operands: Vec<Operand> = formula
                .operand_roles()
                .iter()
                .zip(grids)
                .map(|(name, grid)| Operand::new(name, grid))
                .collect();

            let result = evaluate(&formula, &operands).unwrap();
            assert!(result.get(1, 2).unwrap().is_nan(), "{}", formula.name());
            if formula.arity() == 2 {
                assert!(result.get(2, 0).unwrap().is_nan(), "{}", formula.name());
            }
            assert!(result.nodata().is_some_and(f64::is_nan));
        }
    }

    #[test]
    fn test_division_by_zero_is_isolated() {
        // rifl5 + rifl4 == 0 in one cell only
        let mut rifl5 = make_band(2, 2, 0.3);
        let mut rifl4 = make_band(2, 2, 0.1);
        rifl5.set(0, 0, 0.0).unwrap();
        rifl4.set(0, 0, 0.0).unwrap();

        let result = evaluate(
            &Formula::emissivity(0.6),
            &[Operand::new("rifl5", &rifl5), Operand::new("rifl4", &rifl4)],
        )
        .unwrap();

        assert!(result.get(0, 0).unwrap().is_nan());
        assert!(result.get(1, 1).unwrap().is_finite());
    }

    #[test]
    fn test_zero_sun_elevation_gives_nodata() {
        let band = make_band(2, 2, 100.0);
        let result = evaluate(
            &Formula::Reflectance {
                mult: 2e-5,
                add: -0.1,
                sun_elevation: 0.0,
            },
            &[Operand::new("b4", &band)],
        )
        .unwrap();
        assert!(result.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_log_of_non_positive_emissivity() {
        let bt = make_band(1, 2, 25.0);
        let mut e = make_band(1, 2, 0.98);
        e.set(0, 0, -0.5).unwrap();

        let result = evaluate(
            &Formula::LandSurfaceTemperature,
            &[Operand::new("brightness_temp", &bt), Operand::new("emissivity", &e)],
        )
        .unwrap();
        assert!(result.get(0, 0).unwrap().is_nan());
        assert!(result.get(0, 1).unwrap().is_finite());
    }

    #[test]
    fn test_shape_mismatch() {
        let a = make_band(5, 5, 0.5);
        let b = make_band(5, 10, 0.5);

        let result = evaluate(
            &Formula::emissivity(0.6),
            &[Operand::new("rifl5", &a), Operand::new("rifl4", &b)],
        );
        assert!(matches!(result, Err(Error::GridShapeMismatch { .. })));
    }

    #[test]
    fn test_extent_mismatch() {
        let a = make_band(5, 5, 0.5);
        let mut b = make_band(5, 5, 0.5);
        b.set_transform(GeoTransform::new(30.0, 5.0, 1.0, -1.0));

        let result = evaluate(
            &Formula::LandSurfaceTemperature,
            &[Operand::new("brightness_temp", &a), Operand::new("emissivity", &b)],
        );
        assert!(matches!(result, Err(Error::GridShapeMismatch { .. })));
    }

    #[test]
    fn test_wrong_arity() {
        let a = make_band(2, 2, 0.5);
        let result = evaluate(&Formula::emissivity(0.6), &[Operand::new("rifl5", &a)]);
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_output_inherits_georeferencing() {
        let mut band = make_band(4, 6, 1.0);
        band.set_transform(GeoTransform::new(500_000.0, 4_000_000.0, 30.0, -30.0));
        band.set_crs(landtherm_core::CRS::utm_wgs84_north(33));

        let result = evaluate(
            &Formula::Reflectance {
                mult: 1.0,
                add: 0.0,
                sun_elevation: 1.0,
            },
            &[Operand::new("b4", &band)],
        )
        .unwrap();

        assert_eq!(result.shape(), (4, 6));
        assert_eq!(result.extent(), band.extent());
        assert_eq!(result.crs(), band.crs());
    }
}
