//! Synthetic population grids.
//!
//! All grids are row-major, top row first, matching the raster layout.

/// A grid of zeros with a single populated cell.
///
/// # Example
///
/// ```
/// use test_utils::single_peak_grid;
///
/// let grid = single_peak_grid(5, 5, 2, 2, 100.0);
/// assert_eq!(grid[12], 100.0);
/// assert_eq!(grid.iter().sum::<f32>(), 100.0);
/// ```
pub fn single_peak_grid(width: usize, height: usize, col: usize, row: usize, value: f32) -> Vec<f32> {
    let mut data = vec![0.0; width * height];
    if col < width && row < height {
        data[row * width + col] = value;
    }
    data
}

/// A grid where every cell holds `value`.
pub fn uniform_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// A grid with population decreasing away from the centre, peaking at
/// `peak` and reaching roughly zero at the corners.
pub fn radial_population_grid(width: usize, height: usize, peak: f32) -> Vec<f32> {
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let max_dist = (cx * cx + cy * cy).sqrt().max(1.0);

    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dx = col as f32 - cx;
            let dy = row as f32 - cy;
            let t = 1.0 - (dx * dx + dy * dy).sqrt() / max_dist;
            data.push((peak * t).max(0.0).round());
        }
    }
    data
}

/// Sprinkle no-data markers (NaN and negative values) into an existing grid
/// at every `stride`-th cell. Returns the number of cells replaced.
pub fn inject_no_data(data: &mut [f32], stride: usize) -> usize {
    let mut replaced = 0;
    for (i, v) in data.iter_mut().enumerate() {
        if stride > 0 && i % stride == 0 {
            *v = if replaced % 2 == 0 { f32::NAN } else { -9999.0 };
            replaced += 1;
        }
    }
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radial_grid_peaks_in_centre() {
        let grid = radial_population_grid(5, 5, 100.0);
        assert_eq!(grid[12], 100.0);
        assert_eq!(grid[0], 0.0);
    }

    #[test]
    fn test_inject_no_data() {
        let mut grid = uniform_grid(4, 1, 1.0);
        assert_eq!(inject_no_data(&mut grid, 2), 2);
        assert!(grid[0].is_nan());
        assert_eq!(grid[2], -9999.0);
        assert_eq!(grid[1], 1.0);
    }
}
