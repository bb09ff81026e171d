//! HTTP error mapping.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use gravity_engine::EngineError;
use raster_access::RasterError;
use serde::Serialize;

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub status: u16,
    pub detail: String,
}

/// Errors returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// A feature whose data source is not configured.
    NotConfigured(&'static str),
    Engine(EngineError),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidParameter(msg) => ApiError::BadRequest(msg),
            other => ApiError::Engine(other),
        }
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad-request", msg.clone()),
            ApiError::NotConfigured(what) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not-configured",
                format!("{} is not configured on this server", what),
            ),
            ApiError::Engine(err) => {
                let (status, type_) = match err {
                    EngineError::Raster(RasterError::DataUnavailable(_)) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "data-unavailable")
                    }
                    EngineError::Raster(RasterError::DecodeFailure(_)) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "decode-failure")
                    }
                    EngineError::CellsNotFound(_) => (StatusCode::NOT_FOUND, "not-found"),
                    EngineError::Cancelled => (StatusCode::CONFLICT, "superseded"),
                    EngineError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, "bad-request"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal-error"),
                };
                (status, type_, err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, type_, detail) = self.parts();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %detail, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %detail, "Request rejected");
        }

        let body = ErrorBody {
            type_,
            status: status.as_u16(),
            detail,
        };
        let json = serde_json::to_string(&body).unwrap_or_default();

        (status, [(header::CONTENT_TYPE, "application/json")], json).into_response()
    }
}
