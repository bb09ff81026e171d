//! Travel-time queries against precomputed per-origin cells.
//!
//! `GET /travel-time?origin=..&lat=..&lng=..&mode=..[&n=..][&maxTime=..][&session=..]`
//! `GET /travel-time/supercells?...[&tile=..][&bbox=minLon,minLat,maxLon,maxLat]`

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    Json,
};
use geo_common::BoundingBox;
use gravity_engine::{
    downsample, scored_cells, travel_time_gravity, CellStore, Tile, TimeQuery, TravelMode,
    TravelTimeResult,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::handlers::population::{check_range, required, DEFAULT_EXPONENT, MAX_EXPONENT, MIN_EXPONENT};
use crate::handlers::run_query;
use crate::state::AppState;

pub const DEFAULT_MAX_MINUTES: u32 = 60;

/// Query parameters shared by the travel-time endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TravelTimeParams {
    /// Origin id naming the precomputed cell set.
    pub origin: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub mode: Option<String>,
    #[serde(alias = "exponent")]
    pub n: Option<f64>,
    #[serde(rename = "maxTime", alias = "maxTimeMin")]
    pub max_time: Option<u32>,
    /// Supercell edge in degrees.
    pub tile: Option<f64>,
    /// Viewport restricting which cells are tiled.
    pub bbox: Option<String>,
    pub session: Option<String>,
}

impl TravelTimeParams {
    /// Check presence and ranges and build the engine query.
    pub fn to_query(&self) -> Result<(String, TimeQuery), ApiError> {
        let origin = match &self.origin {
            Some(o) if !o.trim().is_empty() => o.trim().to_string(),
            _ => return Err(ApiError::BadRequest("Missing required parameter: origin".into())),
        };
        let lat = required(self.lat, "lat")?;
        let lng = required(self.lng, "lng")?;
        check_range("lat", lat, -90.0, 90.0)?;
        check_range("lng", lng, -180.0, 180.0)?;

        let mode = match &self.mode {
            Some(m) => m.parse::<TravelMode>()?,
            None => TravelMode::Fastest,
        };

        let exponent = self.n.unwrap_or(DEFAULT_EXPONENT);
        check_range("n", exponent, MIN_EXPONENT, MAX_EXPONENT)?;

        let max_time = self.max_time.unwrap_or(DEFAULT_MAX_MINUTES);
        if max_time == 0 {
            return Err(ApiError::BadRequest("maxTime must be > 0".into()));
        }

        Ok((
            origin,
            TimeQuery {
                origin_lat: lat,
                origin_lng: lng,
                mode,
                exponent,
                max_minutes: f64::from(max_time),
            },
        ))
    }
}

fn cell_store(state: &AppState) -> Result<Arc<CellStore>, ApiError> {
    state
        .cells
        .as_ref()
        .map(Arc::clone)
        .ok_or(ApiError::NotConfigured("travel-time data"))
}

/// Response body for `/travel-time`.
#[derive(Debug, Serialize)]
pub struct TravelTimeResponse {
    pub origin: String,
    pub query: TimeQuery,
    #[serde(flatten)]
    pub result: TravelTimeResult,
}

/// GET /travel-time
pub async fn travel_time_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<TravelTimeParams>,
) -> Result<Json<TravelTimeResponse>, ApiError> {
    let (origin, query) = params.to_query()?;
    let store = cell_store(&state)?;
    let session = state.session(params.session.as_deref());
    let engine = Arc::clone(&state.engine);

    let task_origin = origin.clone();
    let result = run_query("travel_time", session, async move {
        let cells = store.load(&task_origin).await?;
        travel_time_gravity(&cells, &query, &engine)
    })
    .await?;

    info!(
        origin = %origin,
        mode = %query.mode,
        max_minutes = query.max_minutes,
        total_population = result.aggregation.total_population,
        "Travel-time query complete"
    );

    Ok(Json(TravelTimeResponse {
        origin,
        query,
        result,
    }))
}

/// Response body for `/travel-time/supercells`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupercellResponse {
    pub origin: String,
    pub query: TimeQuery,
    pub tile_deg: f64,
    pub tiles: Vec<Tile>,
}

/// GET /travel-time/supercells
pub async fn supercells_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<TravelTimeParams>,
) -> Result<Json<SupercellResponse>, ApiError> {
    let (origin, query) = params.to_query()?;
    let tile_deg = params.tile.unwrap_or(state.engine.supercell_deg);
    check_range("tile", tile_deg, 0.001, 1.0)?;
    let viewport = params
        .bbox
        .as_deref()
        .map(BoundingBox::from_str_list)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let store = cell_store(&state)?;
    let session = state.session(params.session.as_deref());
    let engine = Arc::clone(&state.engine);

    let task_origin = origin.clone();
    let tiles = run_query("supercells", session, async move {
        let cells = store.load(&task_origin).await?;
        let mut scored = scored_cells(&cells, &query, &engine);
        if let Some(viewport) = viewport {
            scored.retain(|cell| viewport.contains(cell.lng, cell.lat));
        }
        downsample(&scored, tile_deg)
    })
    .await?;

    Ok(Json(SupercellResponse {
        origin,
        query,
        tile_deg,
        tiles,
    }))
}
