//! On-disk population raster fixtures.
//!
//! Rasters are written as uncompressed, unsharded Zarr V3 arrays carrying the
//! `origin` / `resolution` attributes the raster reader expects.

use std::path::Path;
use std::sync::Arc;

use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

/// Georeferencing for a synthetic raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterSpec {
    pub width: usize,
    pub height: usize,
    /// Longitude of the top-left corner.
    pub origin_lon: f64,
    /// Latitude of the top-left corner.
    pub origin_lat: f64,
    /// Square pixel size in degrees.
    pub pixel_deg: f64,
}

impl RasterSpec {
    /// A raster of `width` x `height` pixels with its top-left corner at
    /// (origin_lon, origin_lat).
    pub const fn new(width: usize, height: usize, origin_lon: f64, origin_lat: f64, pixel_deg: f64) -> Self {
        Self {
            width,
            height,
            origin_lon,
            origin_lat,
            pixel_deg,
        }
    }
}

/// 30 arc-second pixels over a 1° x 1° tile just south-east of (0, 1).
pub const SMALL_TILE: RasterSpec = RasterSpec::new(120, 120, 0.0, 1.0, 1.0 / 120.0);

/// Write `data` as a Zarr V3 population raster under `path`.
pub fn write_population_zarr(
    path: &Path,
    spec: &RasterSpec,
    data: &[f32],
    chunk_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(path)?;
    let store = Arc::new(FilesystemStore::new(path)?);

    let array = ArrayBuilder::new(
        vec![spec.height as u64, spec.width as u64],
        DataType::Float32,
        vec![chunk_size as u64, chunk_size as u64].try_into()?,
        FillValue::from(f32::NAN),
    )
    .attributes({
        let mut attrs = serde_json::Map::new();
        attrs.insert(
            "origin".to_string(),
            serde_json::json!([spec.origin_lon, spec.origin_lat]),
        );
        attrs.insert(
            "resolution".to_string(),
            serde_json::json!([spec.pixel_deg, -spec.pixel_deg]),
        );
        attrs.insert("units".to_string(), serde_json::json!("people"));
        attrs
    })
    .build(store.clone(), "/")?;

    array.store_metadata()?;

    let subset = ArraySubset::new_with_start_shape(
        vec![0, 0],
        vec![spec.height as u64, spec.width as u64],
    )?;
    array.store_array_subset_elements(&subset, data)?;

    Ok(())
}

/// Create a temporary directory holding a population raster.
///
/// The returned `TempDir` must be kept alive for as long as the raster is read.
pub fn temp_population_raster(
    spec: &RasterSpec,
    data: &[f32],
) -> Result<tempfile::TempDir, Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_population_zarr(dir.path(), spec, data, 64)?;
    Ok(dir)
}
