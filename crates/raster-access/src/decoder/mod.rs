//! Raster decoder and opener traits and the Zarr implementation.

mod storage;
mod zarr;

pub use storage::{create_http_storage, HttpStorage, TokioBlockOn};
pub use zarr::{ZarrRasterDecoder, ZarrRasterOpener};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{PixelWindow, RasterMetadata};

/// Decoded access to an opened raster.
///
/// Implementations are NOT required to tolerate overlapping `read_window`
/// calls; `RasterSource` guarantees at most one read in flight.
#[async_trait]
pub trait RasterDecoder: Send + Sync {
    /// Georeferencing and shape of the raster.
    fn metadata(&self) -> &RasterMetadata;

    /// Read the pixels of `window`, row-major, top row first.
    async fn read_window(&self, window: &PixelWindow) -> Result<Vec<f32>>;
}

/// Opens a raster decoder. Called at most once per successful open.
#[async_trait]
pub trait RasterOpener: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn RasterDecoder>>;
}
