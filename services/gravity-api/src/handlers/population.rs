//! Distance-based population query.
//!
//! `GET /population?lat=..&lng=..&radius=..[&n=..][&session=..]`

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    Json,
};
use gravity_engine::{population_gravity, AggregationResult, SpatialQuery};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::handlers::run_query;
use crate::state::AppState;

pub const MIN_RADIUS_KM: f64 = 1.0;
pub const MAX_RADIUS_KM: f64 = 500.0;
pub const MIN_EXPONENT: f64 = 0.1;
pub const MAX_EXPONENT: f64 = 3.0;
pub const DEFAULT_EXPONENT: f64 = 2.0;

/// Query parameters for the population endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct PopulationParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Radius in km.
    #[serde(alias = "radiusKm")]
    pub radius: Option<f64>,
    /// Distance decay exponent.
    #[serde(alias = "exponent")]
    pub n: Option<f64>,
    /// Client session id for latest-only semantics.
    pub session: Option<String>,
}

impl PopulationParams {
    /// Check presence and ranges and build the engine query.
    pub fn to_query(&self) -> Result<SpatialQuery, ApiError> {
        let lat = required(self.lat, "lat")?;
        let lng = required(self.lng, "lng")?;
        let radius = required(self.radius, "radius")?;
        let exponent = self.n.unwrap_or(DEFAULT_EXPONENT);

        check_range("lat", lat, -90.0, 90.0)?;
        check_range("lng", lng, -180.0, 180.0)?;
        check_range("radius", radius, MIN_RADIUS_KM, MAX_RADIUS_KM)?;
        check_range("n", exponent, MIN_EXPONENT, MAX_EXPONENT)?;

        Ok(SpatialQuery::new(lat, lng, radius, exponent))
    }
}

pub(crate) fn required(value: Option<f64>, name: &str) -> Result<f64, ApiError> {
    value.ok_or_else(|| ApiError::BadRequest(format!("Missing required parameter: {}", name)))
}

pub(crate) fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), ApiError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "{} must be within [{}, {}], got {}",
            name, min, max, value
        )))
    }
}

/// Response body: the query echoed back plus the aggregation.
#[derive(Debug, Serialize)]
pub struct PopulationResponse {
    pub query: SpatialQuery,
    #[serde(flatten)]
    pub result: AggregationResult,
}

/// GET /population
pub async fn population_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<PopulationParams>,
) -> Result<Json<PopulationResponse>, ApiError> {
    let query = params.to_query()?;
    let session = state.session(params.session.as_deref());

    let raster = Arc::clone(&state.raster);
    let engine = Arc::clone(&state.engine);
    let result = run_query("population", session, async move {
        population_gravity(&raster, &query, &engine).await
    })
    .await?;

    info!(
        lat = query.lat,
        lng = query.lng,
        radius_km = query.radius_km,
        total_population = result.total_population,
        elapsed_ms = result.diagnostics.elapsed_ms,
        "Population query complete"
    );

    Ok(Json(PopulationResponse { query, result }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(lat: f64, lng: f64, radius: f64) -> PopulationParams {
        PopulationParams {
            lat: Some(lat),
            lng: Some(lng),
            radius: Some(radius),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_params() {
        let query = params(51.5, -0.12, 25.0).to_query().unwrap();
        assert_eq!(query.exponent, DEFAULT_EXPONENT);
        assert_eq!(query.radius_km, 25.0);
    }

    #[test]
    fn test_missing_and_out_of_range() {
        assert!(PopulationParams::default().to_query().is_err());
        assert!(params(95.0, 0.0, 10.0).to_query().is_err());
        assert!(params(0.0, -200.0, 10.0).to_query().is_err());
        assert!(params(0.0, 0.0, 0.5).to_query().is_err());
        assert!(params(0.0, 0.0, 501.0).to_query().is_err());

        let mut p = params(0.0, 0.0, 10.0);
        p.n = Some(5.0);
        assert!(p.to_query().is_err());
    }
}
