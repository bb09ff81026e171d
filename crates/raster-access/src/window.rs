//! Window Extractor: geographic bounding box to pixel rectangle.

use geo_common::BoundingBox;

use crate::types::{PixelWindow, RasterMetadata};

/// Map a bounding box to the inclusive pixel window that fully contains it,
/// clamped to the raster extent.
///
/// Each edge is mapped with `floor((coord - origin) / resolution)`, which
/// yields the index of the pixel containing that edge for both the positive
/// horizontal and the negative vertical resolution. Returns `None` when the
/// box lies entirely outside the raster or is not finite.
pub fn window_for_bbox(meta: &RasterMetadata, bbox: &BoundingBox) -> Option<PixelWindow> {
    if meta.width == 0 || meta.height == 0 || !bbox.intersects(&meta.bbox()) {
        return None;
    }

    let (ox, oy) = meta.origin;
    let (rx, ry) = meta.resolution;

    let ca = ((bbox.min_lon - ox) / rx).floor();
    let cb = ((bbox.max_lon - ox) / rx).floor();
    let ra = ((bbox.max_lat - oy) / ry).floor();
    let rb = ((bbox.min_lat - oy) / ry).floor();

    if ![ca, cb, ra, rb].iter().all(|v| v.is_finite()) {
        return None;
    }

    let (c0, c1) = (ca.min(cb), ca.max(cb));
    let (r0, r1) = (ra.min(rb), ra.max(rb));

    let max_col = (meta.width - 1) as f64;
    let max_row = (meta.height - 1) as f64;

    if c1 < 0.0 || r1 < 0.0 || c0 > max_col || r0 > max_row {
        return None;
    }

    Some(PixelWindow::new(
        c0.max(0.0) as usize,
        r0.max(0.0) as usize,
        c1.min(max_col) as usize,
        r1.min(max_row) as usize,
    ))
}
