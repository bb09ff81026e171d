//! Service configuration.

use std::path::PathBuf;

use gravity_engine::{CellStoreRoot, EngineConfig};
use raster_access::RasterSourceConfig;

/// Everything the service needs to build its state.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub raster: RasterSourceConfig,
    pub engine: EngineConfig,
    /// Where per-origin travel-time files live. Travel-time endpoints answer
    /// 503 when unset.
    pub travel_time_root: Option<CellStoreRoot>,
    /// Number of origins kept in memory.
    pub cell_cache_size: usize,
    /// Number of client sessions tracked for latest-only queries.
    pub session_capacity: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            raster: RasterSourceConfig::default(),
            engine: EngineConfig::default(),
            travel_time_root: None,
            cell_cache_size: 16,
            session_capacity: 1024,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let travel_time_root = non_empty("TRAVEL_TIME_DATA_URL")
            .map(CellStoreRoot::BaseUrl)
            .or_else(|| non_empty("TRAVEL_TIME_DATA_DIR").map(|d| CellStoreRoot::Directory(PathBuf::from(d))));

        let parse_usize = |key: &str, default: usize| {
            non_empty(key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };

        Self {
            raster: RasterSourceConfig::from_env(),
            engine: EngineConfig::from_env(),
            travel_time_root,
            cell_cache_size: parse_usize("TRAVEL_TIME_CACHE_ORIGINS", 16),
            session_capacity: parse_usize("GRAVITY_SESSION_CAPACITY", 1024),
        }
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<(), String> {
        self.raster.validate()?;
        self.engine.validate()?;
        if let Some(CellStoreRoot::BaseUrl(url)) = &self.travel_time_root {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("travel-time URL must be http(s), got '{}'", url));
            }
        }
        Ok(())
    }
}
