//! The shared raster context: lazy open-once and serialized reads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use crate::config::RasterSourceConfig;
use crate::decoder::{RasterDecoder, RasterOpener, ZarrRasterOpener};
use crate::error::Result;
use crate::types::{PixelWindow, RasterMetadata, RasterWindow};

/// An opened, decoded raster. Cheap to clone; all clones share one decoder.
#[derive(Clone)]
pub struct RasterHandle {
    decoder: Arc<dyn RasterDecoder>,
}

impl RasterHandle {
    /// Georeferencing and shape of the raster.
    pub fn metadata(&self) -> &RasterMetadata {
        self.decoder.metadata()
    }
}

impl std::fmt::Debug for RasterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterHandle")
            .field("metadata", self.metadata())
            .finish()
    }
}

/// Process-wide access point to the population raster.
///
/// Construct once at start-up and share by reference (`Arc<RasterSource>`).
///
/// - `acquire` opens the raster at most once. Concurrent first callers wait on
///   the open already in flight. A failed open leaves the cell empty so a
///   later call retries; a successful handle is kept for the process lifetime.
/// - `read_window` holds a fair (FIFO) async mutex around the physical read,
///   so at most one read is in flight. A failed read releases the lock like a
///   successful one and never affects other queued callers.
pub struct RasterSource {
    opener: Box<dyn RasterOpener>,
    handle: OnceCell<RasterHandle>,
    read_lock: Mutex<()>,
    opens: AtomicU64,
    reads: AtomicU64,
}

impl RasterSource {
    /// Create a source backed by the Zarr opener.
    pub fn new(config: RasterSourceConfig) -> Self {
        Self::with_opener(ZarrRasterOpener::new(config))
    }

    /// Create a source from any opener.
    pub fn with_opener(opener: impl RasterOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            handle: OnceCell::new(),
            read_lock: Mutex::new(()),
            opens: AtomicU64::new(0),
            reads: AtomicU64::new(0),
        }
    }

    /// Get the raster handle, opening the raster on first use.
    pub async fn acquire(&self) -> Result<RasterHandle> {
        let handle = self
            .handle
            .get_or_try_init(|| async {
                let start = Instant::now();
                self.opens.fetch_add(1, Ordering::Relaxed);
                let decoder = self.opener.open().await?;
                let meta = decoder.metadata();
                info!(
                    width = meta.width,
                    height = meta.height,
                    origin = ?meta.origin,
                    resolution = ?meta.resolution,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Population raster opened"
                );
                Ok(RasterHandle { decoder })
            })
            .await?;

        Ok(handle.clone())
    }

    /// Whether the raster has been opened successfully.
    pub fn is_open(&self) -> bool {
        self.handle.initialized()
    }

    /// Read `window` from the raster. `None` yields an empty window without
    /// touching the decoder.
    pub async fn read_window(
        &self,
        handle: &RasterHandle,
        window: Option<PixelWindow>,
    ) -> Result<RasterWindow> {
        let metadata = *handle.metadata();
        let Some(window) = window else {
            return Ok(RasterWindow::empty(metadata));
        };

        let queued = Instant::now();
        let _guard = self.read_lock.lock().await;
        let waited_ms = queued.elapsed().as_millis() as u64;

        self.reads.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("raster_reads_total").increment(1);

        let data = handle.decoder.read_window(&window).await?;

        debug!(
            window = ?window,
            pixels = data.len(),
            waited_ms,
            "Raster window read"
        );

        Ok(RasterWindow {
            window: Some(window),
            data,
            metadata,
        })
    }

    /// Number of open attempts made so far.
    pub fn open_attempts(&self) -> u64 {
        self.opens.load(Ordering::Relaxed)
    }

    /// Number of physical reads issued so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}
