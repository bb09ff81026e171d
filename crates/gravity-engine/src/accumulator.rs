//! Banded gravity accumulation.
//!
//! One pass over a sequence of samples. Each sample carries a proximity `d`
//! (km or minutes) and a population. Included samples add
//!
//! ```text
//! weight = 1 / max(d, min_clamp)^n
//! ```
//!
//! to the band that contains `d`, so that per band and in total:
//!
//! ```text
//! population         = sum(pop)
//! raw_gravity        = sum(pop * weight)
//! weight_mass        = sum(weight)
//! normalized_gravity = raw_gravity / weight_mass   (0 when weight_mass == 0)
//! ```
//!
//! Samples are excluded when `d` is NaN, negative or beyond the limit, or
//! when the population is not a positive number.

use std::time::Instant;

use serde::{Serialize, Serializer};

use crate::bands::{BandDef, BandLayout};

/// Which proximity measure a result was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Great-circle distance in km.
    Distance,
    /// Travel time in minutes.
    Time,
}

/// A single input to the accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Proximity in the layout's unit.
    pub d: f64,
    /// Population at the sample.
    pub population: f64,
    /// Ground area in km², tracked for distance samples.
    pub area_km2: Option<f64>,
}

impl Sample {
    pub fn new(d: f64, population: f64) -> Self {
        Self {
            d,
            population,
            area_km2: None,
        }
    }

    pub fn with_area(mut self, area_km2: f64) -> Self {
        self.area_km2 = Some(area_km2);
        self
    }
}

/// Weighting parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityParams {
    /// Exponent `n` in `1 / d^n`.
    pub exponent: f64,
    /// Lower bound applied to `d` before weighting.
    pub min_clamp: f64,
}

impl GravityParams {
    pub fn new(exponent: f64, min_clamp: f64) -> Self {
        Self {
            exponent,
            min_clamp,
        }
    }

    /// Weight of a sample at proximity `d`.
    #[inline]
    pub fn weight(&self, d: f64) -> f64 {
        1.0 / d.max(self.min_clamp).powf(self.exponent)
    }
}

/// Per-band output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandResult {
    pub lower: f64,
    /// Display upper bound, clipped to the query limit.
    pub upper: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub population: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub weighted_contribution: f64,
    pub weight_mass: f64,
    /// Band raw gravity over band weight mass.
    pub normalized_gravity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_km2: Option<f64>,
    /// Population per km² of band area.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
}

/// Counters describing one accumulation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Samples offered to the accumulator (no-data pixels included when the
    /// caller counts them).
    pub samples_examined: u64,
    pub samples_included: u64,
    pub samples_excluded: u64,
    pub elapsed_ms: f64,
}

/// Result of one gravity query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub domain: Domain,
    #[serde(serialize_with = "serialize_rounded")]
    pub total_population: f64,
    pub raw_gravity: f64,
    pub total_weight_mass: f64,
    pub normalized_gravity: f64,
    pub bands: Vec<BandResult>,
    pub diagnostics: Diagnostics,
}

impl AggregationResult {
    /// The result for a query that touched no data at all.
    pub fn empty(domain: Domain) -> Self {
        Self {
            domain,
            total_population: 0.0,
            raw_gravity: 0.0,
            total_weight_mass: 0.0,
            normalized_gravity: 0.0,
            bands: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }
}

fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.round())
}

#[inline]
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct BandAccumulator {
    population: f64,
    gravity: f64,
    weight_mass: f64,
    area_km2: f64,
}

impl BandAccumulator {
    fn finish(self, def: &BandDef, domain: Domain) -> BandResult {
        let (area_km2, density) = match domain {
            Domain::Distance => (
                Some(self.area_km2),
                Some(self.population / self.area_km2.max(1.0)),
            ),
            Domain::Time => (None, None),
        };

        BandResult {
            lower: def.lower,
            upper: def.display_upper,
            population: self.population,
            weighted_contribution: self.gravity,
            weight_mass: self.weight_mass,
            normalized_gravity: ratio(self.gravity, self.weight_mass),
            area_km2,
            density,
        }
    }
}

/// Accumulate `items` into the bands of `layout`.
///
/// `extract` turns each item into a [`Sample`]; returning `None` excludes the
/// item (e.g. a cell with no travel time for the requested mode). The pass is
/// O(items × log bands) and allocates only the band table.
pub fn accumulate<I, T, F>(
    items: I,
    layout: &BandLayout,
    params: &GravityParams,
    domain: Domain,
    mut extract: F,
) -> AggregationResult
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Option<Sample>,
{
    let start = Instant::now();
    let mut bands = vec![BandAccumulator::default(); layout.len()];
    let mut examined = 0u64;
    let mut included = 0u64;

    for item in items {
        examined += 1;

        let Some(sample) = extract(item) else {
            continue;
        };
        if !(sample.population > 0.0) {
            continue;
        }
        let Some(idx) = layout.assign(sample.d) else {
            continue;
        };

        let weight = params.weight(sample.d);
        let band = &mut bands[idx];
        band.population += sample.population;
        band.gravity += sample.population * weight;
        band.weight_mass += weight;
        if let Some(area) = sample.area_km2 {
            band.area_km2 += area;
        }
        included += 1;
    }

    let bands: Vec<BandResult> = bands
        .into_iter()
        .zip(layout.bands())
        .map(|(acc, def)| acc.finish(def, domain))
        .collect();

    let total_population: f64 = bands.iter().map(|b| b.population).sum();
    let raw_gravity: f64 = bands.iter().map(|b| b.weighted_contribution).sum();
    let total_weight_mass: f64 = bands.iter().map(|b| b.weight_mass).sum();

    AggregationResult {
        domain,
        total_population,
        raw_gravity,
        total_weight_mass,
        normalized_gravity: ratio(raw_gravity, total_weight_mass),
        bands,
        diagnostics: Diagnostics {
            samples_examined: examined,
            samples_included: included,
            samples_excluded: examined - included,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        },
    }
}
