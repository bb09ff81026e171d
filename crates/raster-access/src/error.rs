//! Error types for raster access.

use thiserror::Error;

/// Environment variable naming the local raster path.
pub const RASTER_PATH_ENV: &str = "POPULATION_RASTER_PATH";

/// Environment variable naming the remote raster URL.
pub const RASTER_URL_ENV: &str = "POPULATION_RASTER_URL";

/// Errors that can occur while opening or reading the population raster.
#[derive(Error, Debug, Clone)]
pub enum RasterError {
    /// No source could be opened (nothing configured, missing file, or the
    /// remote fetch failed).
    #[error("population raster unavailable: {0}")]
    DataUnavailable(String),

    /// The raster exists but cannot be decoded.
    #[error("failed to decode population raster: {0}")]
    DecodeFailure(String),

    /// Invalid source configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RasterError {
    /// Build a DataUnavailable error listing what was tried, followed by the
    /// two ways to fix it.
    pub fn unavailable(attempts: &[String]) -> Self {
        let tried = if attempts.is_empty() {
            "no raster source is configured".to_string()
        } else {
            attempts.join("; ")
        };
        Self::DataUnavailable(format!(
            "{}. Download a local copy of the population raster and set {}, \
             or configure a remote URL with {}",
            tried, RASTER_PATH_ENV, RASTER_URL_ENV
        ))
    }

    /// Create a DecodeFailure error.
    pub fn decode_failure(msg: impl Into<String>) -> Self {
        Self::DecodeFailure(msg.into())
    }
}

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
