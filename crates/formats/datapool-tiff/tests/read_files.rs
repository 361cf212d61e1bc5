use std::fs::File;

use datapool_shared::FormatReadError;
use datapool_tiff::{EXTENSIONS, read_tiff_file};
use tempfile::TempDir;
use tiff::encoder::{TiffEncoder, colortype};

#[test]
fn float_raster_is_read_from_disk() -> Result<(), FormatReadError> {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("thickness_1km.tif");
    let file = File::create(&path).expect("create");
    TiffEncoder::new(file)
        .expect("encoder")
        .write_image::<colortype::Gray32Float>(2, 2, &[1.5, -9999.0, 3.0, 4.25])
        .expect("write");

    let raster = read_tiff_file(&path)?;
    assert_eq!((raster.width, raster.height, raster.bands), (2, 2, 1));
    assert_eq!(raster.values, vec![1.5, -9999.0, 3.0, 4.25]);
    Ok(())
}

#[test]
fn missing_file_is_io_error() {
    let err = read_tiff_file("/no/such/bed.tif").unwrap_err();
    assert!(matches!(err, FormatReadError::Io { .. }));
}

#[test]
fn both_tiff_extensions_are_claimed() {
    assert_eq!(EXTENSIONS, &["tif", "tiff"]);
}
