//! Core types for raster access.

use geo_common::BoundingBox;
use serde::{Deserialize, Serialize};

/// Georeferencing and shape of an opened raster. Immutable once opened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterMetadata {
    /// Top-left corner (lon, lat) in degrees.
    pub origin: (f64, f64),
    /// Degrees per pixel (x, y). `y` is negative: rows run top-to-bottom.
    pub resolution: (f64, f64),
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// No-data marker.
    pub fill_value: f32,
}

impl RasterMetadata {
    /// Build metadata from a bounding box and pixel dimensions.
    pub fn from_bbox(bbox: &BoundingBox, width: usize, height: usize, fill_value: f32) -> Self {
        Self {
            origin: (bbox.min_lon, bbox.max_lat),
            resolution: (
                bbox.width() / width as f64,
                -(bbox.height() / height as f64),
            ),
            width,
            height,
            fill_value,
        }
    }

    /// Geographic extent covered by the raster.
    pub fn bbox(&self) -> BoundingBox {
        let (ox, oy) = self.origin;
        let (rx, ry) = self.resolution;
        let x1 = ox + rx * self.width as f64;
        let y1 = oy + ry * self.height as f64;
        BoundingBox::new(ox.min(x1), oy.min(y1), ox.max(x1), oy.max(y1))
    }

    /// Centre of pixel (col, row) as (lon, lat).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        let (ox, oy) = self.origin;
        let (rx, ry) = self.resolution;
        (ox + (col as f64 + 0.5) * rx, oy + (row as f64 + 0.5) * ry)
    }

    /// Pixel edge length in degrees (horizontal).
    pub fn pixel_size_deg(&self) -> f64 {
        self.resolution.0.abs()
    }

    /// Whether a value read from the raster represents no data.
    pub fn is_no_data(&self, value: f32) -> bool {
        value.is_nan() || value == self.fill_value
    }
}

/// Inclusive pixel rectangle `[col0, row0, col1, row1]`, always within
/// `[0, width-1] x [0, height-1]` of the raster it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelWindow {
    pub col0: usize,
    pub row0: usize,
    pub col1: usize,
    pub row1: usize,
}

impl PixelWindow {
    /// Create a window from inclusive bounds.
    pub fn new(col0: usize, row0: usize, col1: usize, row1: usize) -> Self {
        debug_assert!(col0 <= col1 && row0 <= row1);
        Self {
            col0,
            row0,
            col1,
            row1,
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.col1 - self.col0 + 1
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.row1 - self.row0 + 1
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.width() * self.height()
    }

    /// A window always holds at least one pixel.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Pixel values read for a window, row-major, top row first.
#[derive(Debug, Clone)]
pub struct RasterWindow {
    /// The window the data was read for; `None` when the request fell
    /// entirely outside the raster.
    pub window: Option<PixelWindow>,
    /// The pixel values.
    pub data: Vec<f32>,
    /// Metadata of the raster the window belongs to.
    pub metadata: RasterMetadata,
}

impl RasterWindow {
    /// A zero-size window.
    pub fn empty(metadata: RasterMetadata) -> Self {
        Self {
            window: None,
            data: Vec::new(),
            metadata,
        }
    }

    /// Number of pixels in the window.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the window holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over `(lon, lat, value)` at every pixel centre, skipping
    /// no-data pixels.
    pub fn cells(&self) -> impl Iterator<Item = (f64, f64, f32)> + '_ {
        let window = self.window;
        let meta = self.metadata;
        let width = window.map(|w| w.width()).unwrap_or(0);

        self.data
            .iter()
            .enumerate()
            .filter(move |(_, v)| !meta.is_no_data(**v))
            .filter_map(move |(i, v)| {
                let w = window?;
                let (lon, lat) = meta.pixel_center(w.col0 + i % width, w.row0 + i / width);
                Some((lon, lat, *v))
            })
    }
}
