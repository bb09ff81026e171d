//! Population Gravity API Service Library
//!
//! HTTP surface over the gravity engine: distance-based population queries
//! against the shared raster and travel-time queries against precomputed
//! per-origin cells.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
