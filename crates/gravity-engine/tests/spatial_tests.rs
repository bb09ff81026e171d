//! End-to-end spatial gravity against an on-disk Zarr raster.

use std::sync::Arc;

use geo_common::haversine_km;
use gravity_engine::{population_gravity, EngineConfig, EngineError, SpatialQuery};
use raster_access::{RasterError, RasterSource, RasterSourceConfig};
use test_utils::{
    assert_approx_eq, assert_rel_eq, inject_no_data, single_peak_grid, temp_population_raster,
    uniform_grid, SMALL_TILE,
};

fn pixel_center(col: usize, row: usize) -> (f64, f64) {
    (
        SMALL_TILE.origin_lon + (col as f64 + 0.5) * SMALL_TILE.pixel_deg,
        SMALL_TILE.origin_lat - (row as f64 + 0.5) * SMALL_TILE.pixel_deg,
    )
}

#[tokio::test]
async fn test_single_peak_at_query_point() {
    let data = single_peak_grid(SMALL_TILE.width, SMALL_TILE.height, 60, 60, 1000.0);
    let dir = temp_population_raster(&SMALL_TILE, &data).unwrap();
    let source = RasterSource::new(RasterSourceConfig::local(dir.path()));

    let (lon, lat) = pixel_center(60, 60);
    let query = SpatialQuery::new(lat, lon, 5.0, 2.0);
    let result = population_gravity(&source, &query, &EngineConfig::default())
        .await
        .unwrap();

    assert_approx_eq!(result.total_population, 1000.0, 1e-6);
    assert_rel_eq!(result.raw_gravity, 100_000.0, 1e-9);
    assert_approx_eq!(result.normalized_gravity, 1000.0, 1e-6);
    assert_eq!(result.bands.len(), 5);
    assert_approx_eq!(result.bands[0].population, 1000.0, 1e-6);
    assert_eq!(result.diagnostics.samples_included, 1);
    assert!(result.diagnostics.samples_examined > 1);
}

#[tokio::test]
async fn test_uniform_population_matches_brute_force() {
    let data = uniform_grid(SMALL_TILE.width, SMALL_TILE.height, 2.0);
    let dir = temp_population_raster(&SMALL_TILE, &data).unwrap();
    let source = RasterSource::new(RasterSourceConfig::local(dir.path()));

    let (lat, lng, radius) = (0.52, 0.47, 7.5);
    let result = population_gravity(
        &source,
        &SpatialQuery::new(lat, lng, radius, 2.0),
        &EngineConfig::default(),
    )
    .await
    .unwrap();

    let mut expected = 0.0;
    for row in 0..SMALL_TILE.height {
        for col in 0..SMALL_TILE.width {
            let (plon, plat) = pixel_center(col, row);
            if haversine_km(lat, lng, plat, plon) <= radius {
                expected += 2.0;
            }
        }
    }

    assert!(expected > 0.0);
    assert_approx_eq!(result.total_population, expected, 1e-6);

    let band_total: f64 = result.bands.iter().map(|b| b.population).sum();
    assert_approx_eq!(band_total, expected, 1e-6);
    assert_eq!(result.bands.last().unwrap().upper, radius);
    assert!(result.bands.iter().all(|b| b.area_km2.is_some()));
}

#[tokio::test]
async fn test_no_data_pixels_are_skipped() {
    let mut data = uniform_grid(SMALL_TILE.width, SMALL_TILE.height, 1.0);
    let masked = inject_no_data(&mut data, 3);
    assert!(masked > 0);
    let dir = temp_population_raster(&SMALL_TILE, &data).unwrap();
    let source = RasterSource::new(RasterSourceConfig::local(dir.path()));

    let result = population_gravity(
        &source,
        &SpatialQuery::new(0.5, 0.5, 3.0, 1.0),
        &EngineConfig::default(),
    )
    .await
    .unwrap();

    assert!(!result.total_population.is_nan());
    assert!(result.diagnostics.samples_excluded > 0);
}

#[tokio::test]
async fn test_query_outside_extent_returns_empty() {
    let data = uniform_grid(SMALL_TILE.width, SMALL_TILE.height, 1.0);
    let dir = temp_population_raster(&SMALL_TILE, &data).unwrap();
    let source = RasterSource::new(RasterSourceConfig::local(dir.path()));

    let result = population_gravity(
        &source,
        &SpatialQuery::new(45.0, 120.0, 10.0, 2.0),
        &EngineConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.total_population, 0.0);
    assert_eq!(result.normalized_gravity, 0.0);
    assert!(result.bands.is_empty());
    assert_eq!(source.read_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_queries_share_one_open() {
    let data = single_peak_grid(SMALL_TILE.width, SMALL_TILE.height, 30, 30, 500.0);
    let dir = temp_population_raster(&SMALL_TILE, &data).unwrap();
    let source = Arc::new(RasterSource::new(RasterSourceConfig::local(dir.path())));
    let config = Arc::new(EngineConfig::default());

    let (lon, lat) = pixel_center(30, 30);
    let mut tasks = Vec::new();
    for i in 0..8 {
        let source = Arc::clone(&source);
        let config = Arc::clone(&config);
        let radius = 2.0 + i as f64;
        tasks.push(tokio::spawn(async move {
            population_gravity(&source, &SpatialQuery::new(lat, lon, radius, 2.0), &config).await
        }));
    }

    for task in tasks {
        let result = task.await.unwrap().unwrap();
        assert_approx_eq!(result.total_population, 500.0, 1e-6);
    }
    assert_eq!(source.open_attempts(), 1);
    assert_eq!(source.read_count(), 8);
}

#[tokio::test]
async fn test_missing_raster_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let source = RasterSource::new(RasterSourceConfig::local(dir.path().join("absent.zarr")));

    let err = population_gravity(
        &source,
        &SpatialQuery::new(0.5, 0.5, 5.0, 2.0),
        &EngineConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(
        matches!(err, EngineError::Raster(RasterError::DataUnavailable(_))),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn test_invalid_query_rejected_before_open() {
    let dir = tempfile::tempdir().unwrap();
    let source = RasterSource::new(RasterSourceConfig::local(dir.path()));

    let err = population_gravity(
        &source,
        &SpatialQuery::new(0.5, 0.5, -1.0, 2.0),
        &EngineConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, EngineError::InvalidParameter(_)));
    assert_eq!(source.open_attempts(), 0);
}
