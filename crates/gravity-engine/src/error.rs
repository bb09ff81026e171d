//! Error types for the gravity engine.

use raster_access::RasterError;
use thiserror::Error;

/// Errors produced by engine operations.
///
/// Sample-level problems (negative or NaN population, unreachable cells) are
/// never errors; they are filtered out during accumulation.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The raster could not be opened or decoded.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// A caller-supplied parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No precomputed travel-time data exists for the origin.
    #[error("travel-time data not found: {0}")]
    CellsNotFound(String),

    /// Precomputed travel-time data could not be loaded or parsed.
    #[error("failed to load travel-time data: {0}")]
    CellData(String),

    /// The query was superseded by a newer one in the same session.
    #[error("query superseded by a newer request")]
    Cancelled,

    /// A worker task failed unexpectedly.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Create an InvalidParameter error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::CellsNotFound(err.to_string())
        } else {
            Self::CellData(err.to_string())
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::CellData(format!("invalid JSON: {}", err))
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            Self::CellsNotFound(err.to_string())
        } else {
            Self::CellData(err.to_string())
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
