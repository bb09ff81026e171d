//! Distance-based gravity over the population raster.

use std::time::Instant;

use geo_common::{approx_pixel_area_km2, bbox_for_radius, haversine_km};
use raster_access::{window_for_bbox, RasterSource, RasterWindow};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::accumulator::{accumulate, AggregationResult, Domain, GravityParams, Sample};
use crate::bands::BandLayout;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// A population query around a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
    /// Distance decay exponent `n`.
    pub exponent: f64,
}

impl SpatialQuery {
    pub fn new(lat: f64, lng: f64, radius_km: f64, exponent: f64) -> Self {
        Self {
            lat,
            lng,
            radius_km,
            exponent,
        }
    }

    /// Check coordinate ranges, radius and exponent.
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(EngineError::invalid(format!(
                "lat must be within [-90, 90], got {}",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(EngineError::invalid(format!(
                "lng must be within [-180, 180], got {}",
                self.lng
            )));
        }
        if !(self.radius_km > 0.0 && self.radius_km.is_finite()) {
            return Err(EngineError::invalid(format!(
                "radius must be > 0, got {}",
                self.radius_km
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

/// Aggregate raster population within `query.radius_km` of the query point.
///
/// Opens the raster on first use, reads the window covering the radius's
/// bounding box under the shared read lock, then bands every populated pixel
/// by its great-circle distance from the query point. The accumulation runs
/// on the blocking pool so large windows don't stall the runtime.
#[instrument(skip(source, config), fields(lat = query.lat, lng = query.lng, radius_km = query.radius_km))]
pub async fn population_gravity(
    source: &RasterSource,
    query: &SpatialQuery,
    config: &EngineConfig,
) -> Result<AggregationResult> {
    query.validate()?;
    let start = Instant::now();

    let handle = source.acquire().await?;
    let bbox = bbox_for_radius(query.lat, query.lng, query.radius_km);
    let window = window_for_bbox(handle.metadata(), &bbox);
    let region = source.read_window(&handle, window).await?;

    if region.is_empty() {
        debug!("Query window outside raster extent");
        let mut result = AggregationResult::empty(Domain::Distance);
        result.diagnostics.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        return Ok(result);
    }

    let query = *query;
    let params = GravityParams::new(query.exponent, config.min_clamp_km);
    let mut result = tokio::task::spawn_blocking(move || accumulate_window(&region, &query, &params))
        .await
        .map_err(|e| EngineError::Internal(format!("accumulation task failed: {}", e)))?;

    result.diagnostics.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    debug!(
        pixels = result.diagnostics.samples_examined,
        included = result.diagnostics.samples_included,
        total_population = result.total_population,
        elapsed_ms = result.diagnostics.elapsed_ms,
        "Spatial gravity computed"
    );

    Ok(result)
}

/// Band every populated pixel of `region` by distance from the query point.
///
/// `samples_examined` counts every pixel of the window, no-data included.
pub fn accumulate_window(
    region: &RasterWindow,
    query: &SpatialQuery,
    params: &GravityParams,
) -> AggregationResult {
    let layout = BandLayout::adaptive(query.radius_km);
    let pixel_deg = region.metadata.pixel_size_deg();

    let mut result = accumulate(
        region.cells(),
        &layout,
        params,
        Domain::Distance,
        |(lon, lat, value)| {
            Some(
                Sample::new(haversine_km(query.lat, query.lng, lat, lon), f64::from(value))
                    .with_area(approx_pixel_area_km2(lat, pixel_deg)),
            )
        },
    );

    let pixels = region.len() as u64;
    result.diagnostics.samples_excluded = pixels - result.diagnostics.samples_included;
    result.diagnostics.samples_examined = pixels;
    result
}
