//! Configuration for locating the population raster.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RASTER_PATH_ENV, RASTER_URL_ENV};

/// Where to find the population raster.
///
/// A remote URL takes precedence over the local path; the local path is only
/// tried when no URL is set or the remote open fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterSourceConfig {
    /// HTTP(S) URL of the Zarr store root.
    pub remote_url: Option<String>,

    /// Local directory holding the Zarr store.
    pub local_path: Option<PathBuf>,

    /// Path of the array inside the store.
    pub array_path: String,
}

impl Default for RasterSourceConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            local_path: None,
            array_path: "/".to_string(),
        }
    }
}

impl RasterSourceConfig {
    /// Config reading only a local store.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            remote_url: None,
            local_path: Some(path.into()),
            array_path: "/".to_string(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        Self {
            remote_url: non_empty(RASTER_URL_ENV),
            local_path: non_empty(RASTER_PATH_ENV).map(PathBuf::from),
            array_path: non_empty("POPULATION_RASTER_ARRAY").unwrap_or_else(|| "/".to_string()),
        }
    }

    /// Validate the configuration.
    ///
    /// An empty config is valid here; it surfaces as DataUnavailable on the
    /// first `acquire` so the service can still start and report readiness.
    pub fn validate(&self) -> Result<(), String> {
        if !self.array_path.starts_with('/') {
            return Err(format!(
                "array_path must be absolute within the store, got '{}'",
                self.array_path
            ));
        }

        if let Some(url) = &self.remote_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("remote_url must be http(s), got '{}'", url));
            }
        }

        Ok(())
    }

    /// Whether any source is configured at all.
    pub fn has_source(&self) -> bool {
        self.remote_url.is_some() || self.local_path.is_some()
    }
}
