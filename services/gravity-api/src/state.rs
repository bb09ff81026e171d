//! Application state for the gravity API.

use std::sync::Arc;

use anyhow::{Context, Result};
use gravity_engine::{CellStore, EngineConfig, QuerySession, SessionRegistry};
use metrics_exporter_prometheus::PrometheusHandle;
use raster_access::RasterSource;

use crate::config::ApiConfig;

/// Shared application state.
pub struct AppState {
    /// The process-wide population raster, opened lazily on first use.
    pub raster: Arc<RasterSource>,

    /// Per-origin travel-time cells, when a data root is configured.
    pub cells: Option<Arc<CellStore>>,

    /// Engine tunables.
    pub engine: Arc<EngineConfig>,

    /// Latest-only sessions keyed by the `session` query parameter.
    pub sessions: SessionRegistry,

    /// Prometheus recorder handle, absent when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state from configuration. Nothing is opened here; the raster is
    /// acquired by the first query or readiness probe.
    pub fn new(config: ApiConfig, prometheus: Option<PrometheusHandle>) -> Result<Self> {
        config
            .validate()
            .map_err(anyhow::Error::msg)
            .context("invalid configuration")?;

        let cells = config
            .travel_time_root
            .map(|root| Arc::new(CellStore::new(root, config.cell_cache_size)));

        Ok(Self {
            raster: Arc::new(RasterSource::new(config.raster)),
            cells,
            engine: Arc::new(config.engine),
            sessions: SessionRegistry::new(config.session_capacity),
            prometheus,
        })
    }

    /// Create state from environment configuration.
    pub fn from_env(prometheus: Option<PrometheusHandle>) -> Result<Self> {
        Self::new(ApiConfig::from_env(), prometheus)
    }

    /// Session for a client id, if the client supplied one.
    pub fn session(&self, id: Option<&str>) -> Option<Arc<QuerySession>> {
        id.filter(|s| !s.is_empty()).map(|s| self.sessions.session(s))
    }
}
