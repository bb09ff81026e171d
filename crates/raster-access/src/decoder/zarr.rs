//! Zarr V3 population raster decoder.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use zarrs::array::Array;
use zarrs::array_subset::ArraySubset;
use zarrs::storage::ReadableStorageTraits;
use zarrs_filesystem::FilesystemStore;

use geo_common::BoundingBox;

use crate::config::RasterSourceConfig;
use crate::error::{RasterError, Result};
use crate::types::{PixelWindow, RasterMetadata};

use super::storage::create_http_storage;
use super::{RasterDecoder, RasterOpener};

/// Decoder over a 2-D `float32` Zarr array laid out `[rows, cols]`.
pub struct ZarrRasterDecoder<S: ?Sized> {
    array: Array<S>,
    metadata: RasterMetadata,
}

impl<S: ReadableStorageTraits + ?Sized + 'static> ZarrRasterDecoder<S> {
    /// Open the array at `path` within `storage` and read its georeferencing.
    pub fn open(storage: Arc<S>, path: &str) -> Result<Self> {
        let array = Array::open(storage, path)
            .map_err(|e| RasterError::decode_failure(format!("cannot open array {}: {}", path, e)))?;

        let metadata = Self::extract_metadata(&array)?;

        Ok(Self { array, metadata })
    }

    /// Read georeferencing from `origin` + `resolution` attributes, falling
    /// back to a `bbox` attribute.
    fn extract_metadata(array: &Array<S>) -> Result<RasterMetadata> {
        let shape = array.shape();
        if shape.len() != 2 {
            return Err(RasterError::decode_failure(format!(
                "expected a 2-D array, found {} dimensions",
                shape.len()
            )));
        }

        let width = shape[1] as usize;
        let height = shape[0] as usize;
        let attrs = array.attributes();

        let numbers = |key: &str, n: usize| -> Option<Vec<f64>> {
            let values = attrs.get(key)?.as_array()?;
            if values.len() != n {
                return None;
            }
            values.iter().map(|v| v.as_f64()).collect()
        };

        let fill_value = array
            .fill_value()
            .as_ne_bytes()
            .try_into()
            .map(f32::from_ne_bytes)
            .unwrap_or(f32::NAN);

        if let (Some(origin), Some(res)) = (numbers("origin", 2), numbers("resolution", 2)) {
            if res[0] == 0.0 || res[1] >= 0.0 {
                return Err(RasterError::decode_failure(format!(
                    "resolution must be non-zero with a negative vertical step, got {:?}",
                    res
                )));
            }
            return Ok(RasterMetadata {
                origin: (origin[0], origin[1]),
                resolution: (res[0], res[1]),
                width,
                height,
                fill_value,
            });
        }

        if let Some(b) = numbers("bbox", 4) {
            let bbox = BoundingBox::new(b[0], b[1], b[2], b[3]);
            return Ok(RasterMetadata::from_bbox(&bbox, width, height, fill_value));
        }

        Err(RasterError::decode_failure(
            "array carries neither origin/resolution nor bbox attributes",
        ))
    }

    /// Read a window synchronously.
    fn read_window_sync(&self, window: &PixelWindow) -> Result<Vec<f32>> {
        // Zarr uses [row, col] indexing
        let subset = ArraySubset::new_with_start_shape(
            vec![window.row0 as u64, window.col0 as u64],
            vec![window.height() as u64, window.width() as u64],
        )
        .map_err(|e| RasterError::decode_failure(e.to_string()))?;

        let data: Vec<f32> = self
            .array
            .retrieve_array_subset_elements(&subset)
            .map_err(|e| RasterError::decode_failure(e.to_string()))?;

        Ok(data)
    }
}

#[async_trait]
impl<S: ReadableStorageTraits + ?Sized + Send + Sync + 'static> RasterDecoder
    for ZarrRasterDecoder<S>
{
    fn metadata(&self) -> &RasterMetadata {
        &self.metadata
    }

    async fn read_window(&self, window: &PixelWindow) -> Result<Vec<f32>> {
        debug!(window = ?window, pixels = window.len(), "Reading raster window");
        self.read_window_sync(window)
    }
}

/// Opens the population raster from a remote URL or a local directory.
pub struct ZarrRasterOpener {
    config: RasterSourceConfig,
}

impl ZarrRasterOpener {
    pub fn new(config: RasterSourceConfig) -> Self {
        Self { config }
    }

    fn open_local(&self, path: &Path) -> Result<Arc<dyn RasterDecoder>> {
        let store = FilesystemStore::new(path).map_err(|e| {
            RasterError::DataUnavailable(format!("cannot open {}: {}", path.display(), e))
        })?;
        let decoder = ZarrRasterDecoder::open(Arc::new(store), &self.config.array_path)?;
        Ok(Arc::new(decoder))
    }

    fn open_remote(&self, url: &str) -> Result<Arc<dyn RasterDecoder>> {
        let store = create_http_storage(url)?;
        // Any failure while fetching remote metadata is a fetch failure.
        let decoder = ZarrRasterDecoder::open(store, &self.config.array_path)
            .map_err(|e| RasterError::DataUnavailable(e.to_string()))?;
        Ok(Arc::new(decoder))
    }
}

#[async_trait]
impl RasterOpener for ZarrRasterOpener {
    async fn open(&self) -> Result<Arc<dyn RasterDecoder>> {
        let mut attempts = Vec::new();

        if let Some(url) = &self.config.remote_url {
            match self.open_remote(url) {
                Ok(decoder) => {
                    info!(url = %url, "Opened remote population raster");
                    return Ok(decoder);
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Remote population raster failed, trying local copy");
                    attempts.push(format!("remote {} failed: {}", url, e));
                }
            }
        }

        if let Some(path) = &self.config.local_path {
            if path.exists() {
                let decoder = self.open_local(path)?;
                info!(path = %path.display(), "Opened local population raster");
                return Ok(decoder);
            }
            attempts.push(format!("local path {} does not exist", path.display()));
        }

        Err(RasterError::unavailable(&attempts))
    }
}
