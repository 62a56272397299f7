//! Native GeoTIFF reading/writing built on the `tiff` crate
//!
//! Only what Landsat Level-1 band files and LST products need is handled:
//! one sample per pixel, pixel-scale + tiepoint georeferencing, a projected
//! EPSG code and the GDAL nodata tag.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterGrid};
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{ColorType, Gray32Float, Gray64Float};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: Tag = Tag::Unknown(33550);
const MODEL_TIEPOINT: Tag = Tag::Unknown(33922);
const GEO_KEY_DIRECTORY: Tag = Tag::Unknown(34735);
const GDAL_NODATA: Tag = Tag::Unknown(42113);

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

/// Sample type written to the output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFormat {
    /// 32-bit IEEE float, the usual GTiff output of raster calculators
    #[default]
    Float32,
    /// 64-bit IEEE float, lossless for `RasterGrid` cells
    Float64,
}

/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    pub sample_format: SampleFormat,
}

impl GeoTiffOptions {
    pub fn float64() -> Self {
        Self {
            sample_format: SampleFormat::Float64,
        }
    }
}

/// Read a single-band GeoTIFF file into a [`RasterGrid`].
///
/// Every failure, including a missing file, is reported as
/// [`Error::RasterLoad`] carrying `path`.
pub fn read_geotiff<P: AsRef<Path>>(path: P) -> Result<RasterGrid> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::load(path, e))?;
    decode_geotiff(file).map_err(|e| Error::load(path, reason(e)))
}

/// Read a GeoTIFF from an in-memory buffer
pub fn read_geotiff_from_buffer(data: &[u8]) -> Result<RasterGrid> {
    decode_geotiff(Cursor::new(data)).map_err(|e| Error::load("<buffer>", reason(e)))
}

fn reason(e: Error) -> String {
    match e {
        Error::RasterLoad { reason, .. } | Error::RasterWrite { reason, .. } => reason,
        other => other.to_string(),
    }
}

fn decode_geotiff<R: Read + Seek>(reader: R) -> Result<RasterGrid> {
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {e}")))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {e}")))?;

    match decoder.colortype() {
        Ok(tiff::ColorType::Gray(_)) => {}
        Ok(other) => {
            return Err(Error::UnsupportedDataType(format!(
                "expected a single-band raster, found {other:?}"
            )))
        }
        Err(e) => return Err(Error::Other(format!("Cannot read color type: {e}"))),
    }

    let image = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {e}")))?;

    let data: Vec<f64> = match image {
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        DecodingResult::U64(buf) => widen(buf),
        DecodingResult::I64(buf) => widen(buf),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(Error::UnsupportedDataType(
                "unsupported TIFF sample format".into(),
            ))
        }
    };

    let mut grid = RasterGrid::from_vec(data, height as usize, width as usize)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        grid.set_transform(transform);
    }
    grid.set_nodata(read_nodata(&mut decoder));
    grid.set_crs(read_epsg(&mut decoder).map(CRS::from_epsg));

    Ok(grid)
}

fn widen<T: num_traits::ToPrimitive>(buf: Vec<T>) -> Vec<f64> {
    buf.into_iter()
        .map(|v| v.to_f64().unwrap_or(f64::NAN))
        .collect()
}

/// ModelPixelScaleTag + ModelTiepointTag, north-up only
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(MODEL_TIEPOINT).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder.get_tag_ascii_string(GDAL_NODATA).ok()?;
    text.trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .parse()
        .ok()
}

fn read_epsg<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<u32> {
    let keys = decoder.get_tag_u16_vec(GEO_KEY_DIRECTORY).ok()?;
    // Header: version, revision, minor, key count; then 4-tuples
    // (key id, tag location, count, value). Location 0 means inline value.
    keys.get(4..)?
        .chunks_exact(4)
        .find(|entry| entry[0] == PROJECTED_CS_TYPE_KEY && entry[1] == 0)
        .map(|entry| u32::from(entry[3]))
}

/// Write a [`RasterGrid`] to a GeoTIFF file.
///
/// Every failure is reported as [`Error::RasterWrite`] carrying `path`.
pub fn write_geotiff<P: AsRef<Path>>(
    grid: &RasterGrid,
    path: P,
    options: Option<GeoTiffOptions>,
) -> Result<()> {
    let path = path.as_ref();
    let options = options.unwrap_or_default();
    let file = File::create(path).map_err(|e| Error::write(path, e))?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(grid, &mut writer, &options).map_err(|e| Error::write(path, reason(e)))?;
    writer.flush().map_err(|e| Error::write(path, e))
}

/// Write a [`RasterGrid`] to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer(
    grid: &RasterGrid,
    options: Option<GeoTiffOptions>,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(grid, Cursor::new(&mut buf), &options.unwrap_or_default())
        .map_err(|e| Error::write(PathBuf::from("<buffer>"), reason(e)))?;
    Ok(buf)
}

fn encode_geotiff<W: Write + Seek>(
    grid: &RasterGrid,
    writer: W,
    options: &GeoTiffOptions,
) -> Result<()> {
    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| Error::Other(format!("TIFF encoder error: {e}")))?;

    match options.sample_format {
        SampleFormat::Float32 => {
            let data: Vec<f32> = grid.data().iter().map(|&v| v as f32).collect();
            encode_image::<_, Gray32Float>(&mut encoder, grid, &data)
        }
        SampleFormat::Float64 => {
            let data: Vec<f64> = grid.data().iter().copied().collect();
            encode_image::<_, Gray64Float>(&mut encoder, grid, &data)
        }
    }
}

fn encode_image<W, C>(
    encoder: &mut TiffEncoder<W>,
    grid: &RasterGrid,
    data: &[C::Inner],
) -> Result<()>
where
    W: Write + Seek,
    C: ColorType,
    [C::Inner]: tiff::encoder::TiffValue,
{
    let (rows, cols) = grid.shape();
    let mut image = encoder
        .new_image::<C>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {e}")))?;

    let gt = grid.transform();
    let tag_error =
        |name: &str, e: tiff::TiffError| Error::Other(format!("Cannot write {name} tag: {e}"));

    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(MODEL_PIXEL_SCALE, &scale[..])
        .map_err(|e| tag_error("pixel scale", e))?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(MODEL_TIEPOINT, &tiepoint[..])
        .map_err(|e| tag_error("tiepoint", e))?;

    let geokeys = geo_key_directory(grid.crs());
    image
        .encoder()
        .write_tag(GEO_KEY_DIRECTORY, &geokeys[..])
        .map_err(|e| tag_error("geokey directory", e))?;

    if let Some(nodata) = grid.nodata() {
        let text = if nodata.is_nan() {
            "nan".to_string()
        } else {
            nodata.to_string()
        };
        image
            .encoder()
            .write_tag(GDAL_NODATA, text.as_str())
            .map_err(|e| tag_error("nodata", e))?;
    }

    image
        .write_data(data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {e}")))
}

/// GeoKeyDirectoryTag: projected model, pixel-is-area, plus the EPSG code when known.
fn geo_key_directory(crs: Option<&CRS>) -> Vec<u16> {
    #[rustfmt::skip]
    let mut keys = vec![
        GT_MODEL_TYPE_KEY, 0, 1, 1,
        GT_RASTER_TYPE_KEY, 0, 1, 1,
    ];
    if let Some(code) = crs.and_then(|c| u16::try_from(c.epsg()).ok()) {
        keys.extend_from_slice(&[PROJECTED_CS_TYPE_KEY, 0, 1, code]);
    }
    let count = (keys.len() / 4) as u16;
    let mut directory = vec![1, 1, 0, count];
    directory.extend(keys);
    directory
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_grid() -> RasterGrid {
        let data: Vec<f64> = (0..12).map(|v| v as f64 * 0.5).collect();
        let mut grid = RasterGrid::from_vec(data, 3, 4).unwrap();
        grid.set_transform(GeoTransform::new(500_000.0, 4_200_000.0, 30.0, -30.0));
        grid.set_crs(CRS::utm_wgs84_north(19));
        grid.set_nodata(Some(-9999.0));
        grid
    }

    #[test]
    fn test_buffer_roundtrip_keeps_georeferencing() {
        let grid = sample_grid();
        let bytes = write_geotiff_to_buffer(&grid, Some(GeoTiffOptions::float64())).unwrap();
        let back = read_geotiff_from_buffer(&bytes).unwrap();

        assert_eq!(back.shape(), (3, 4));
        assert!(back.is_aligned_with(&grid));
        assert_eq!(back.crs().map(|c| c.epsg()), Some(32619));
        assert_eq!(back.nodata(), Some(-9999.0));
        assert_relative_eq!(back.get(2, 3).unwrap(), 5.5, epsilon = 1e-12);
    }

    #[test]
    fn test_float32_nan_nodata() {
        let mut grid = sample_grid();
        grid.set(0, 0, f64::NAN).unwrap();
        grid.set_nodata(Some(f64::NAN));
        grid.set_crs(None);

        let bytes = write_geotiff_to_buffer(&grid, None).unwrap();
        let back = read_geotiff_from_buffer(&bytes).unwrap();

        assert!(back.get(0, 0).unwrap().is_nan());
        assert!(back.nodata().is_some_and(f64::is_nan));
        assert!(back.crs().is_none());
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("LC08_B4.TIF");
        match read_geotiff(&path) {
            Err(Error::RasterLoad { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected RasterLoad, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_tiff.tif");
        std::fs::write(&path, b"definitely not a tiff").unwrap();
        assert!(matches!(read_geotiff(&path), Err(Error::RasterLoad { .. })));
    }

    #[test]
    fn test_write_into_missing_dir_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.tif");
        assert!(matches!(
            write_geotiff(&sample_grid(), &path, None),
            Err(Error::RasterWrite { .. })
        ));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lst.tif");
        write_geotiff(&sample_grid(), &path, None).unwrap();
        let back = read_geotiff(&path).unwrap();
        assert_eq!(back.shape(), (3, 4));
        assert_relative_eq!(back.get(1, 1).unwrap(), 2.5, epsilon = 1e-6);
    }
}
