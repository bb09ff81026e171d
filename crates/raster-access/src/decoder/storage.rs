//! Remote HTTP storage backend for Zarr access.

use std::sync::Arc;

use object_store::http::{HttpBuilder, HttpStore};
use zarrs_object_store::AsyncObjectStore;
use zarrs_storage::storage_adapter::async_to_sync::{
    AsyncToSyncBlockOn, AsyncToSyncStorageAdapter,
};

use crate::error::{RasterError, Result};

/// Blocking executor that works from within a tokio runtime.
///
/// Uses `tokio::task::block_in_place` to move the current task to a blocking
/// thread, then drives the future on the runtime handle. Requires the
/// multi-threaded runtime.
#[derive(Clone, Copy)]
pub struct TokioBlockOn;

impl AsyncToSyncBlockOn for TokioBlockOn {
    fn block_on<F: core::future::Future>(&self, future: F) -> F::Output {
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
    }
}

/// Storage type alias for HTTP-backed Zarr access (async).
pub type AsyncHttpStorage = AsyncObjectStore<HttpStore>;

/// Synchronous adapter over the HTTP store, usable with `ZarrRasterDecoder`.
pub type HttpStorage = AsyncToSyncStorageAdapter<AsyncHttpStorage, TokioBlockOn>;

/// Create a read-only HTTP storage backend rooted at `url`.
pub fn create_http_storage(url: &str) -> Result<Arc<HttpStorage>> {
    let http = HttpBuilder::new().with_url(url).build().map_err(|e| {
        RasterError::DataUnavailable(format!("failed to create HTTP client for {}: {}", url, e))
    })?;

    let async_store = Arc::new(AsyncObjectStore::new(http));
    let sync_store = AsyncToSyncStorageAdapter::new(async_store, TokioBlockOn);

    Ok(Arc::new(sync_store))
}
