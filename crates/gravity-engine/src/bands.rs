//! Band partitioning of the 1-D proximity domain.
//!
//! A [`BandLayout`] is an ordered, contiguous list of half-open intervals
//! `[lower, upper)` covering `[0, limit]`. The final band is closed at the
//! limit so a sample at exactly `d == limit` is counted.

use serde::Serialize;

/// Fixed travel-time bands in minutes.
pub const DEFAULT_TIME_BANDS: [(f64, f64); 9] = [
    (0.0, 5.0),
    (5.0, 10.0),
    (10.0, 15.0),
    (15.0, 20.0),
    (20.0, 30.0),
    (30.0, 45.0),
    (45.0, 60.0),
    (60.0, 90.0),
    (90.0, 120.0),
];

/// Boundary schedule for distance bands: fine near the origin, coarser
/// further out.
///
/// Steps of 1 below 10, steps of 2 while the next boundary stays below 25,
/// then steps of 5. The last boundary is clamped to `limit`.
///
/// ```text
/// limit 32  =>  [0, 1, ..., 10, 12, 14, ..., 24, 29, 32]
/// ```
///
/// A non-positive or non-finite limit yields `[0]` (no bands).
pub fn adaptive_boundaries(limit: f64) -> Vec<f64> {
    let mut boundaries = vec![0.0];
    if !(limit > 0.0 && limit.is_finite()) {
        return boundaries;
    }

    let mut current = 0.0_f64;
    while current < limit {
        let step = if current < 10.0 {
            1.0
        } else if current + 2.0 < 25.0 {
            2.0
        } else {
            5.0
        };
        current = (current + step).min(limit);
        boundaries.push(current);
    }

    if boundaries.last() != Some(&limit) {
        boundaries.push(limit);
    }

    boundaries
}

/// A single band of the domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandDef {
    /// Inclusive lower bound.
    pub lower: f64,
    /// Exclusive upper bound used for assignment.
    pub upper: f64,
    /// Upper bound reported to clients, clipped to the query limit.
    pub display_upper: f64,
}

/// Ordered, contiguous bands over `[0, limit]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BandLayout {
    bands: Vec<BandDef>,
    limit: f64,
}

impl BandLayout {
    /// Adaptive distance bands for a radius (see [`adaptive_boundaries`]).
    pub fn adaptive(limit: f64) -> Self {
        let boundaries = adaptive_boundaries(limit);
        let bands = boundaries
            .windows(2)
            .map(|pair| BandDef {
                lower: pair[0],
                upper: pair[1],
                display_upper: pair[1],
            })
            .collect();

        Self { bands, limit }
    }

    /// Bands from a fixed table, restricted to `limit`.
    ///
    /// Bands whose lower bound is at or beyond the limit are dropped. The band
    /// containing the limit keeps its full upper bound for assignment but
    /// reports the limit as its display upper. If the table ends before the
    /// limit, a final band is appended to close the gap.
    pub fn fixed(table: &[(f64, f64)], limit: f64) -> Self {
        let mut bands: Vec<BandDef> = Vec::new();
        if !(limit > 0.0 && limit.is_finite()) {
            return Self { bands, limit };
        }

        for &(lower, upper) in table {
            if lower >= limit {
                break;
            }
            bands.push(BandDef {
                lower,
                upper,
                display_upper: upper.min(limit),
            });
        }

        let covered = bands.last().map(|b| b.upper).unwrap_or(0.0);
        if covered < limit {
            bands.push(BandDef {
                lower: covered,
                upper: limit,
                display_upper: limit,
            });
        }

        Self { bands, limit }
    }

    /// The bands in ascending order.
    pub fn bands(&self) -> &[BandDef] {
        &self.bands
    }

    /// Number of bands.
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    /// True when the layout has no bands.
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Index of the band containing `d`, or `None` if `d` lies outside
    /// `[0, limit]` or is not a number.
    pub fn assign(&self, d: f64) -> Option<usize> {
        if self.bands.is_empty() || d.is_nan() || d < 0.0 || d > self.limit {
            return None;
        }

        let idx = self.bands.partition_point(|band| band.upper <= d);
        if idx < self.bands.len() {
            return (self.bands[idx].lower <= d).then_some(idx);
        }

        // d == upper of the last band, which equals the limit for adaptive layouts
        (d == self.limit).then(|| self.bands.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_boundaries_32() {
        let mut expected: Vec<f64> = (0..=10).map(f64::from).collect();
        expected.extend([12.0, 14.0, 16.0, 18.0, 20.0, 22.0, 24.0, 29.0, 32.0]);
        assert_eq!(adaptive_boundaries(32.0), expected);
    }

    #[test]
    fn test_adaptive_boundaries_small_and_fractional() {
        assert_eq!(adaptive_boundaries(2.0), vec![0.0, 1.0, 2.0]);
        assert_eq!(adaptive_boundaries(2.5), vec![0.0, 1.0, 2.0, 2.5]);
        assert_eq!(adaptive_boundaries(0.4), vec![0.0, 0.4]);
        assert_eq!(adaptive_boundaries(0.0), vec![0.0]);
        assert_eq!(adaptive_boundaries(-3.0), vec![0.0]);
        assert_eq!(adaptive_boundaries(f64::NAN), vec![0.0]);
    }

    #[test]
    fn test_adaptive_boundaries_strictly_increasing() {
        for limit in [1.0, 9.5, 10.0, 11.0, 24.0, 25.0, 26.0, 100.0, 333.3] {
            let b = adaptive_boundaries(limit);
            assert_eq!(b[0], 0.0);
            assert_eq!(*b.last().unwrap(), limit);
            assert!(b.windows(2).all(|w| w[0] < w[1]), "limit {}: {:?}", limit, b);
        }
    }

    #[test]
    fn test_assign_half_open_with_closed_final_band() {
        let layout = BandLayout::adaptive(32.0);
        assert_eq!(layout.assign(0.0), Some(0));
        assert_eq!(layout.assign(0.999), Some(0));
        assert_eq!(layout.assign(1.0), Some(1));
        assert_eq!(layout.assign(11.0), Some(10));
        assert_eq!(layout.assign(30.0), Some(layout.len() - 1));
        assert_eq!(layout.assign(32.0), Some(layout.len() - 1));
        assert_eq!(layout.assign(32.0001), None);
        assert_eq!(layout.assign(-0.1), None);
        assert_eq!(layout.assign(f64::NAN), None);
    }

    #[test]
    fn test_fixed_layout_clips_display_upper() {
        let layout = BandLayout::fixed(&DEFAULT_TIME_BANDS, 50.0);
        let bands = layout.bands();
        assert_eq!(bands.len(), 7);
        let last = bands.last().unwrap();
        assert_eq!(last.lower, 45.0);
        assert_eq!(last.upper, 60.0);
        assert_eq!(last.display_upper, 50.0);

        assert_eq!(layout.assign(50.0), Some(6));
        assert_eq!(layout.assign(45.0), Some(6));
        assert_eq!(layout.assign(44.9), Some(5));
        assert_eq!(layout.assign(50.5), None);
    }

    #[test]
    fn test_fixed_layout_drops_bands_at_limit() {
        let layout = BandLayout::fixed(&DEFAULT_TIME_BANDS, 30.0);
        assert_eq!(layout.len(), 5);
        assert_eq!(layout.bands()[4].upper, 30.0);
        assert_eq!(layout.assign(30.0), Some(4));
    }

    #[test]
    fn test_fixed_layout_extends_past_table() {
        let layout = BandLayout::fixed(&DEFAULT_TIME_BANDS, 150.0);
        assert_eq!(layout.len(), 10);
        let last = layout.bands().last().unwrap();
        assert_eq!((last.lower, last.upper), (120.0, 150.0));
        assert_eq!(layout.assign(150.0), Some(9));
    }
}
