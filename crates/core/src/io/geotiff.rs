//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate. Only the tags a grid needs survive a round trip:
//! pixel scale and tiepoint for the transform, `GDAL_NODATA` for the sentinel
//! and `ImageDescription` for the free-text metadata lines.

use crate::error::{Error, Result};
use crate::raster::{DataType, GeoTransform, Grid, DEFAULT_NODATA};
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32Float, Gray64Float, Gray8, GrayI32};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

/// Read a GeoTIFF file into a grid.
///
/// A missing file is reported as [`Error::MissingInput`] so callers can tell
/// it apart from a file that exists but fails to decode.
pub fn read_grid<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingInput {
            name: path.display().to_string(),
        });
    }
    let file = File::open(path)?;
    decode_grid(file)
}

/// Read a GeoTIFF held in memory.
pub fn read_grid_from_buffer(data: &[u8]) -> Result<Grid> {
    decode_grid(Cursor::new(data))
}

fn decode_grid<R: Read + Seek>(reader: R) -> Result<Grid> {
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;
    let rows = height as usize;
    let cols = width as usize;

    let nodata = decoder
        .get_tag_ascii_string(Tag::GdalNodata)
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok())
        .unwrap_or(DEFAULT_NODATA);

    let description = decoder.get_tag_ascii_string(Tag::ImageDescription).ok();

    let image = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let (data, data_type): (Vec<f64>, DataType) = match image {
        DecodingResult::F64(buf) => (buf, DataType::Double),
        DecodingResult::F32(buf) => (widen(&buf), DataType::Float),
        DecodingResult::I32(buf) => (widen(&buf), DataType::Integer),
        DecodingResult::I16(buf) => (widen(&buf), DataType::Integer),
        DecodingResult::U16(buf) => (widen(&buf), DataType::Integer),
        DecodingResult::U32(buf) => (widen(&buf), DataType::Integer),
        DecodingResult::I8(buf) => (widen(&buf), DataType::Byte),
        DecodingResult::U8(buf) => (widen(&buf), DataType::Byte),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    let mut grid = Grid::from_vec(data, rows, cols, nodata)?;
    grid.set_data_type(data_type);

    if let Ok(transform) = read_geotransform(&mut decoder) {
        grid.set_transform(transform);
    }
    if let Some(text) = description {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .for_each(|line| grid.add_metadata_entry(line));
    }

    Ok(grid)
}

fn widen<T: Copy + Into<f64>>(buf: &[T]) -> Vec<f64> {
    buf.iter().map(|&v| v.into()).collect()
}

/// ModelPixelScale + ModelTiepoint -> north-up transform
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| Error::Other("No pixel scale tag".into()))?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| Error::Other("No tiepoint tag".into()))?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(Error::Other("Cannot determine geotransform".into()));
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

/// Write a grid to a GeoTIFF file.
///
/// Samples follow the grid's [`DataType`]: `Double` as 64-bit float, `Float`
/// as 32-bit float, `Integer` as signed 32-bit and `Byte` as unsigned 8-bit.
/// Integer samples are rounded and saturate at the type's range, so a `Byte`
/// grid needs a no-data value in `0..=255`.
pub fn write_grid<P: AsRef<Path>>(grid: &Grid, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode_grid(grid, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a grid to an in-memory GeoTIFF.
pub fn write_grid_to_buffer(grid: &Grid) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_grid(grid, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode_grid<W: Write + Seek>(grid: &Grid, writer: W) -> Result<()> {
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;
    let (rows, cols) = grid.shape();
    let gt = grid.transform();
    let nodata = grid.nodata().to_string();
    let description = grid.metadata().join("\n");

    macro_rules! write_image {
        ($color:ty, $data:expr) => {{
            let mut image = encoder
                .new_image::<$color>(cols as u32, rows as u32)
                .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;
            let tags = image.encoder();
            tags.write_tag(
                Tag::ModelPixelScaleTag,
                &[gt.cell_size_x(), gt.cell_size_y(), 0.0][..],
            )
            .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;
            tags.write_tag(
                Tag::ModelTiepointTag,
                &[0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0][..],
            )
            .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;
            // GTModelTypeGeoKey = Projected, GTRasterTypeGeoKey = PixelIsArea
            tags.write_tag(
                Tag::GeoKeyDirectoryTag,
                &[1u16, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1][..],
            )
            .map_err(|e| Error::Other(format!("Cannot write geokey tag: {}", e)))?;
            tags.write_tag(Tag::GdalNodata, nodata.as_str())
                .map_err(|e| Error::Other(format!("Cannot write nodata tag: {}", e)))?;
            if !description.is_empty() {
                tags.write_tag(Tag::ImageDescription, description.as_str())
                    .map_err(|e| Error::Other(format!("Cannot write description: {}", e)))?;
            }
            image
                .write_data($data)
                .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;
        }};
    }

    match grid.data_type() {
        DataType::Double => {
            let data: Vec<f64> = grid.data().iter().copied().collect();
            write_image!(Gray64Float, &data);
        }
        DataType::Float => {
            let data: Vec<f32> = grid.data().iter().map(|&v| v as f32).collect();
            write_image!(Gray32Float, &data);
        }
        DataType::Integer => {
            let data: Vec<i32> = grid.data().iter().map(|&v| v.round() as i32).collect();
            write_image!(GrayI32, &data);
        }
        DataType::Byte => {
            let data: Vec<u8> = grid.data().iter().map(|&v| v.round() as u8).collect();
            write_image!(Gray8, &data);
        }
    }

    Ok(())
}
