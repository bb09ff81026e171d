//! Supercell downsampling of scored cells for map display.
//!
//! Cells are grouped into square tiles of `tile_deg` degrees by floor
//! division of their coordinates. Each tile reports its population, the sum
//! of its cells' gravity weights and the population-weighted mean metric.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A cell with a per-cell metric (e.g. travel time in minutes) and its
/// gravity weight `1 / max(metric, clamp)^n`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricCell {
    pub lat: f64,
    pub lng: f64,
    pub population: f64,
    pub metric: f64,
    pub weight: f64,
}

/// Aggregate over all cells falling in one tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    /// Tile centre.
    pub lat: f64,
    pub lng: f64,
    pub size_deg: f64,
    pub cell_count: usize,
    pub total_population: f64,
    pub total_weight: f64,
    /// `sum(pop * metric) / sum(pop)`, 0 when the tile has no population.
    pub mean_metric: f64,
}

/// Group `cells` into tiles of `tile_deg` degrees.
///
/// Tiles come back ordered by (row, column) of the tile grid, south to north
/// then west to east. Every cell lands in exactly one tile, so the tiles'
/// populations sum to the cells' population. Each tile's cells are summed in
/// a canonical order, so permuting the input gives bit-identical tiles.
pub fn downsample(cells: &[MetricCell], tile_deg: f64) -> Result<Vec<Tile>> {
    if !(tile_deg > 0.0 && tile_deg.is_finite()) {
        return Err(EngineError::invalid(format!(
            "tile size must be > 0, got {}",
            tile_deg
        )));
    }

    let mut tiles: BTreeMap<(i64, i64), Vec<&MetricCell>> = BTreeMap::new();
    for cell in cells {
        let key = (
            (cell.lat / tile_deg).floor() as i64,
            (cell.lng / tile_deg).floor() as i64,
        );
        tiles.entry(key).or_default().push(cell);
    }

    Ok(tiles
        .into_iter()
        .map(|((row, col), mut members)| {
            members.sort_by(|a, b| canonical_order(a, b));

            let population: f64 = members.iter().map(|c| c.population).sum();
            let weight: f64 = members.iter().map(|c| c.weight).sum();
            let weighted_metric: f64 = members.iter().map(|c| c.population * c.metric).sum();

            Tile {
                lat: (row as f64 + 0.5) * tile_deg,
                lng: (col as f64 + 0.5) * tile_deg,
                size_deg: tile_deg,
                cell_count: members.len(),
                total_population: population,
                total_weight: weight,
                mean_metric: if population > 0.0 {
                    weighted_metric / population
                } else {
                    0.0
                },
            }
        })
        .collect())
}

fn canonical_order(a: &MetricCell, b: &MetricCell) -> Ordering {
    a.population
        .total_cmp(&b.population)
        .then(a.metric.total_cmp(&b.metric))
        .then(a.weight.total_cmp(&b.weight))
        .then(a.lat.total_cmp(&b.lat))
        .then(a.lng.total_cmp(&b.lng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    fn cell(lat: f64, lng: f64, population: f64, metric: f64) -> MetricCell {
        MetricCell {
            lat,
            lng,
            population,
            metric,
            weight: population / 10.0,
        }
    }

    #[test]
    fn test_cells_grouped_by_tile() {
        let cells = vec![
            cell(0.01, 0.01, 100.0, 10.0),
            cell(0.04, 0.02, 300.0, 20.0),
            cell(0.06, 0.01, 50.0, 5.0),
        ];
        let tiles = downsample(&cells, 0.05).unwrap();

        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[0].cell_count, 2);
        assert_eq!(tiles[0].total_population, 400.0);
        assert_approx_eq!(tiles[0].mean_metric, 17.5, 1e-12);
        assert_approx_eq!(tiles[0].total_weight, 40.0, 1e-12);
        assert_approx_eq!(tiles[0].lat, 0.025, 1e-12);
        assert_eq!(tiles[1].cell_count, 1);
    }

    #[test]
    fn test_negative_coordinates_floor() {
        let cells = vec![cell(-0.01, -0.01, 1.0, 1.0), cell(0.01, 0.01, 1.0, 1.0)];
        let tiles = downsample(&cells, 0.05).unwrap();
        assert_eq!(tiles.len(), 2);
        assert!(tiles[0].lat < 0.0 && tiles[0].lng < 0.0);
    }

    #[test]
    fn test_zero_population_tile() {
        let tiles = downsample(&[cell(1.0, 1.0, 0.0, 30.0)], 0.1).unwrap();
        assert_eq!(tiles[0].mean_metric, 0.0);
    }

    #[test]
    fn test_population_conserved_for_any_tile_size() {
        let cells: Vec<MetricCell> = (0..400)
            .map(|i| {
                let i = f64::from(i);
                cell(
                    40.0 + (i * 0.0137) % 1.0,
                    -3.0 + (i * 0.0291) % 1.5,
                    1.0 + i % 13.0,
                    i % 60.0,
                )
            })
            .collect();
        let expected: f64 = cells.iter().map(|c| c.population).sum();

        for tile_deg in [0.001, 0.01, 0.05, 0.25, 1.0, 10.0] {
            let tiles = downsample(&cells, tile_deg).unwrap();
            let total: f64 = tiles.iter().map(|t| t.total_population).sum();
            let count: usize = tiles.iter().map(|t| t.cell_count).sum();
            assert_approx_eq!(total, expected, 1e-6);
            assert_eq!(count, cells.len());
        }
    }

    #[test]
    fn test_tiles_independent_of_cell_order() {
        let cells = vec![
            cell(0.01, 0.01, 1e16, 3.0),
            cell(0.02, 0.02, 1.0, 7.0),
            cell(0.03, 0.03, 1.0, 11.0),
            cell(0.07, 0.01, 2.5, 4.0),
        ];
        let expected = downsample(&cells, 0.05).unwrap();

        for order in [[1, 2, 0, 3], [3, 2, 1, 0], [2, 0, 3, 1]] {
            let permuted: Vec<MetricCell> = order.iter().map(|&i| cells[i]).collect();
            assert_eq!(downsample(&permuted, 0.05).unwrap(), expected);
        }
    }

    #[test]
    fn test_invalid_tile_size() {
        assert!(downsample(&[], 0.0).is_err());
        assert!(downsample(&[], -1.0).is_err());
        assert!(downsample(&[], f64::INFINITY).is_err());
        assert!(downsample(&[], 0.1).unwrap().is_empty());
    }
}
