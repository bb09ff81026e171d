//! Travel-time gravity over precomputed cells.
//!
//! Each [`TravelTimeCell`] holds a population and the travel time, in
//! seconds, from a fixed origin by driving and by transit. Either may be
//! missing when the cell is unreachable by that mode.

use std::fmt;
use std::str::FromStr;

use geo_common::haversine_km;
use serde::{Deserialize, Serialize};

use crate::accumulator::{accumulate, AggregationResult, Domain, GravityParams, Sample};
use crate::bands::BandLayout;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::supercell::MetricCell;

/// Transport mode used to pick a cell's travel time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Driving,
    Transit,
    /// The smaller of driving and transit, whichever is present.
    Fastest,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Transit => "transit",
            TravelMode::Fastest => "fastest",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "driving" | "drive" | "car" => Ok(TravelMode::Driving),
            "transit" | "public" => Ok(TravelMode::Transit),
            "fastest" | "best" => Ok(TravelMode::Fastest),
            other => Err(EngineError::invalid(format!(
                "unknown mode '{}', expected driving, transit or fastest",
                other
            ))),
        }
    }
}

/// A precomputed cell. Times are in seconds from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelTimeCell {
    pub lat: f64,
    pub lng: f64,
    pub pop: f64,
    #[serde(default)]
    pub driving: Option<f64>,
    #[serde(default)]
    pub transit: Option<f64>,
}

impl TravelTimeCell {
    /// Travel time in seconds for `mode`, or `None` when unreachable.
    pub fn seconds(&self, mode: TravelMode) -> Option<f64> {
        let valid = |t: Option<f64>| t.filter(|v| v.is_finite() && *v >= 0.0);
        match mode {
            TravelMode::Driving => valid(self.driving),
            TravelMode::Transit => valid(self.transit),
            TravelMode::Fastest => match (valid(self.driving), valid(self.transit)) {
                (Some(d), Some(t)) => Some(d.min(t)),
                (d, t) => d.or(t),
            },
        }
    }

    /// Travel time in minutes for `mode`.
    pub fn minutes(&self, mode: TravelMode) -> Option<f64> {
        self.seconds(mode).map(|s| s / 60.0)
    }
}

/// A travel-time gravity query for one origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeQuery {
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub mode: TravelMode,
    pub exponent: f64,
    /// Inclusive upper travel time in minutes.
    pub max_minutes: f64,
}

impl TimeQuery {
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.origin_lat) || !(-180.0..=180.0).contains(&self.origin_lng)
        {
            return Err(EngineError::invalid(format!(
                "origin ({}, {}) is out of range",
                self.origin_lat, self.origin_lng
            )));
        }
        if !(self.max_minutes > 0.0 && self.max_minutes.is_finite()) {
            return Err(EngineError::invalid(format!(
                "max time must be > 0, got {}",
                self.max_minutes
            )));
        }
        if !(self.exponent >= 0.0 && self.exponent.is_finite()) {
            return Err(EngineError::invalid(format!(
                "exponent must be >= 0, got {}",
                self.exponent
            )));
        }
        Ok(())
    }
}

/// How much of the cell set has travel times, overall and near the origin.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    pub total_cells: usize,
    pub driving_fraction: f64,
    pub transit_fraction: f64,
    pub near_radius_km: f64,
    pub near_cells: usize,
    pub near_driving_fraction: f64,
    pub near_transit_fraction: f64,
}

impl Coverage {
    /// Compute coverage for `cells` relative to an origin.
    pub fn compute(cells: &[TravelTimeCell], origin_lat: f64, origin_lng: f64, radius_km: f64) -> Self {
        let mut driving = 0usize;
        let mut transit = 0usize;
        let mut near = 0usize;
        let mut near_driving = 0usize;
        let mut near_transit = 0usize;

        for cell in cells {
            let has_driving = cell.seconds(TravelMode::Driving).is_some();
            let has_transit = cell.seconds(TravelMode::Transit).is_some();
            driving += usize::from(has_driving);
            transit += usize::from(has_transit);

            if haversine_km(origin_lat, origin_lng, cell.lat, cell.lng) <= radius_km {
                near += 1;
                near_driving += usize::from(has_driving);
                near_transit += usize::from(has_transit);
            }
        }

        let fraction = |n: usize, of: usize| if of == 0 { 0.0 } else { n as f64 / of as f64 };

        Self {
            total_cells: cells.len(),
            driving_fraction: fraction(driving, cells.len()),
            transit_fraction: fraction(transit, cells.len()),
            near_radius_km: radius_km,
            near_cells: near,
            near_driving_fraction: fraction(near_driving, near),
            near_transit_fraction: fraction(near_transit, near),
        }
    }
}

/// Aggregation plus coverage diagnostics for a travel-time query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelTimeResult {
    pub mode: TravelMode,
    pub max_minutes: f64,
    #[serde(flatten)]
    pub aggregation: AggregationResult,
    pub coverage: Coverage,
}

/// Band cells by travel time using the configured fixed time table.
///
/// Cells unreachable by the requested mode, or slower than
/// `query.max_minutes`, are excluded.
pub fn travel_time_gravity(
    cells: &[TravelTimeCell],
    query: &TimeQuery,
    config: &EngineConfig,
) -> Result<TravelTimeResult> {
    query.validate()?;

    let layout = BandLayout::fixed(&config.time_bands, query.max_minutes);
    let params = GravityParams::new(query.exponent, config.min_clamp_minutes);
    let mode = query.mode;

    let aggregation = accumulate(cells, &layout, &params, Domain::Time, |cell| {
        cell.minutes(mode).map(|minutes| Sample::new(minutes, cell.pop))
    });

    Ok(TravelTimeResult {
        mode,
        max_minutes: query.max_minutes,
        aggregation,
        coverage: Coverage::compute(
            cells,
            query.origin_lat,
            query.origin_lng,
            config.coverage_radius_km,
        ),
    })
}

/// Per-cell travel time and gravity weight, for cells within the query's
/// time limit. Feeds the supercell downsampler.
pub fn scored_cells(
    cells: &[TravelTimeCell],
    query: &TimeQuery,
    config: &EngineConfig,
) -> Vec<MetricCell> {
    let params = GravityParams::new(query.exponent, config.min_clamp_minutes);

    cells
        .iter()
        .filter_map(|cell| {
            let minutes = cell.minutes(query.mode)?;
            if minutes > query.max_minutes || !(cell.pop > 0.0) {
                return None;
            }
            Some(MetricCell {
                lat: cell.lat,
                lng: cell.lng,
                population: cell.pop,
                metric: minutes,
                weight: params.weight(minutes),
            })
        })
        .collect()
}
