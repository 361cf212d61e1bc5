//! (Geo)TIFF raster reading for `DataPool` gridded datasets.
//!
//! Only the first image of a file is read. Samples of every integer or
//! floating point type are widened to `f64` and kept pixel-interleaved, so a
//! multi-band image yields `bands` consecutive values per pixel.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use datapool_shared::{FormatReadError, FormatResult};
use tiff::decoder::{Decoder, DecodingResult};

/// File extensions this crate reads.
pub const EXTENSIONS: &[&str] = &["tif", "tiff"];

/// One decoded raster image.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    /// Samples per pixel.
    pub bands: usize,
    /// Row-major, pixel-interleaved samples.
    pub values: Vec<f64>,
}

/// Read the first image of a TIFF file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened and a parse error if it
/// is not a TIFF the decoder understands.
pub fn read_tiff_file(path: impl AsRef<Path>) -> FormatResult<Raster> {
    let path = path.as_ref();
    let context = path.display().to_string();
    let file = File::open(path).map_err(|e| FormatReadError::io(e, context.clone()))?;
    decode(BufReader::new(file), &context)
}

/// Read the first image of an in-memory TIFF.
///
/// # Errors
///
/// Returns a parse error if the bytes are not a TIFF the decoder understands.
pub fn read_tiff_bytes(bytes: &[u8], context: &str) -> FormatResult<Raster> {
    decode(Cursor::new(bytes), context)
}

fn decode<R: Read + Seek>(reader: R, context: &str) -> FormatResult<Raster> {
    let tiff_error = |err: tiff::TiffError| FormatReadError::Parse {
        message: err.to_string(),
        position: None,
        context: Some(context.to_string()),
    };

    let mut decoder = Decoder::new(reader).map_err(tiff_error)?;
    let (width, height) = decoder.dimensions().map_err(tiff_error)?;
    let values = widen(decoder.read_image().map_err(tiff_error)?);

    let width = to_usize(width, context)?;
    let height = to_usize(height, context)?;
    let pixels = width * height;
    if pixels == 0 || values.len() % pixels != 0 {
        return Err(FormatReadError::Schema {
            message: format!(
                "{} samples do not fill a {width}x{height} image",
                values.len()
            ),
            context: Some(context.to_string()),
        });
    }

    Ok(Raster {
        width,
        height,
        bands: values.len() / pixels,
        values,
    })
}

fn to_usize(value: u32, context: &str) -> FormatResult<usize> {
    usize::try_from(value).map_err(|_| FormatReadError::Schema {
        message: format!("image dimension {value} does not fit in memory"),
        context: Some(context.to_string()),
    })
}

#[allow(clippy::cast_precision_loss)]
fn widen(samples: DecodingResult) -> Vec<f64> {
    match samples {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiff::encoder::{TiffEncoder, colortype};

    fn encode_gray16(width: u32, height: u32, data: &[u16]) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        TiffEncoder::new(&mut bytes)
            .unwrap()
            .write_image::<colortype::Gray16>(width, height, data)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn integer_samples_are_widened() {
        let bytes = encode_gray16(3, 2, &[1, 2, 3, 4, 5, 65_535]);
        let raster = read_tiff_bytes(&bytes, "bed.tif").unwrap();

        assert_eq!((raster.width, raster.height, raster.bands), (3, 2, 1));
        assert_eq!(raster.values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 65_535.0]);
    }

    #[test]
    fn rgb_keeps_samples_interleaved() {
        let mut bytes = Cursor::new(Vec::new());
        TiffEncoder::new(&mut bytes)
            .unwrap()
            .write_image::<colortype::RGB8>(2, 1, &[10, 20, 30, 40, 50, 60])
            .unwrap();
        let raster = read_tiff_bytes(&bytes.into_inner(), "rgb.tif").unwrap();

        assert_eq!(raster.bands, 3);
        assert_eq!(raster.values[3], 40.0);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = read_tiff_bytes(b"not a tiff", "junk.tif").unwrap_err();
        assert!(matches!(err, FormatReadError::Parse { .. }));
        assert!(err.to_string().contains("junk.tif"));
    }
}
