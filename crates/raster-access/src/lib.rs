//! Raster Access Layer for the population grid.
//!
//! A single [`RasterSource`] is built at process start-up and shared by every
//! query handler. It opens the population raster lazily, exactly once, and
//! funnels every windowed read through one FIFO lock because the decoder
//! beneath the handle must never see overlapping reads.
//!
//! # Architecture
//!
//! ```text
//! Query (center + radius)
//!      │
//!      ▼
//! bbox_for_radius ──► window_for_bbox (pixel rectangle, clamped)
//!                           │
//!                           ▼
//! RasterSource::acquire()  (open once; concurrent callers wait on the same open)
//!      │
//!      ▼
//! RasterSource::read_window()  (one physical read in flight, FIFO)
//!      │
//!      ▼
//! RasterWindow ──► gravity accumulation
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod source;
pub mod types;
pub mod window;

pub use config::RasterSourceConfig;
pub use decoder::{RasterDecoder, RasterOpener, ZarrRasterDecoder, ZarrRasterOpener};
pub use error::{RasterError, Result};
pub use source::{RasterHandle, RasterSource};
pub use types::{PixelWindow, RasterMetadata, RasterWindow};
pub use window::window_for_bbox;
