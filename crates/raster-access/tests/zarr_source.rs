//! Integration test: write a population raster to Zarr and read it back
//! through RasterSource.

use geo_common::BoundingBox;
use raster_access::{window_for_bbox, RasterError, RasterSource, RasterSourceConfig};
use test_utils::{radial_population_grid, temp_population_raster, RasterSpec};

const RASTER: RasterSpec = RasterSpec::new(100, 80, -10.0, 50.0, 0.1);

#[tokio::test]
async fn test_local_raster_metadata() {
    let data = radial_population_grid(RASTER.width, RASTER.height, 500.0);
    let dir = temp_population_raster(&RASTER, &data).unwrap();

    let source = RasterSource::new(RasterSourceConfig::local(dir.path()));
    let handle = source.acquire().await.unwrap();
    let meta = handle.metadata();

    assert_eq!(meta.width, 100);
    assert_eq!(meta.height, 80);
    assert_eq!(meta.origin, (-10.0, 50.0));
    assert_eq!(meta.resolution, (0.1, -0.1));
    assert!(meta.fill_value.is_nan());
}

#[tokio::test]
async fn test_window_values_match_source_grid() {
    let data = radial_population_grid(RASTER.width, RASTER.height, 500.0);
    let dir = temp_population_raster(&RASTER, &data).unwrap();

    let source = RasterSource::new(RasterSourceConfig::local(dir.path()));
    let handle = source.acquire().await.unwrap();

    // lon [-8.45, -7.55] -> cols 15..=24, lat [46.05, 46.95] -> rows 30..=39
    let bbox = BoundingBox::new(-8.45, 46.05, -7.55, 46.95);
    let window = window_for_bbox(handle.metadata(), &bbox);
    let region = source.read_window(&handle, window).await.unwrap();

    let w = region.window.unwrap();
    assert_eq!((w.col0, w.row0, w.col1, w.row1), (15, 30, 24, 39));
    assert_eq!(region.len(), 100);

    for row in 0..w.height() {
        for col in 0..w.width() {
            let expected = data[(w.row0 + row) * RASTER.width + w.col0 + col];
            assert_eq!(region.data[row * w.width() + col], expected);
        }
    }
}

#[tokio::test]
async fn test_corrupt_metadata_is_decode_failure() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("zarr.json"), b"{ not json").unwrap();

    let source = RasterSource::new(RasterSourceConfig::local(dir.path()));
    let err = source.acquire().await.unwrap_err();
    assert!(matches!(err, RasterError::DecodeFailure(_)), "got {:?}", err);
    assert!(!source.is_open());
}
