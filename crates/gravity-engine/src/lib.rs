//! Geospatial gravity aggregation engine.
//!
//! Answers "how many people live near X, weighted by proximity?" for two
//! notions of proximity:
//!
//! - **Distance**: every populated raster pixel within a radius of a point
//!   ([`population_gravity`]).
//! - **Travel time**: precomputed `(cell, travel time)` records for a fixed
//!   origin ([`travel_time_gravity`]).
//!
//! Both run through one generic [`accumulate`] pass: each sample is assigned
//! to a band of the 1-D domain (km or minutes) and contributes
//! `population / max(d, min_clamp)^n` to its band and to the totals.
//!
//! # Example
//!
//! ```rust,ignore
//! use gravity_engine::{population_gravity, EngineConfig, SpatialQuery};
//!
//! let query = SpatialQuery::new(51.5, -0.12, 25.0, 2.0);
//! let result = population_gravity(&source, &query, &EngineConfig::default()).await?;
//! println!("{} people, normalized gravity {:.1}", result.total_population, result.normalized_gravity);
//! ```

pub mod accumulator;
pub mod bands;
pub mod cells;
pub mod config;
pub mod error;
pub mod session;
pub mod spatial;
pub mod supercell;
pub mod travel_time;

pub use accumulator::{
    accumulate, AggregationResult, BandResult, Diagnostics, Domain, GravityParams, Sample,
};
pub use bands::{adaptive_boundaries, BandDef, BandLayout, DEFAULT_TIME_BANDS};
pub use cells::{CellStore, CellStoreRoot};
pub use config::{parse_time_bands, EngineConfig};
pub use error::{EngineError, Result};
pub use session::{QuerySession, SessionRegistry};
pub use spatial::{population_gravity, SpatialQuery};
pub use supercell::{downsample, MetricCell, Tile};
pub use travel_time::{
    scored_cells, travel_time_gravity, Coverage, TimeQuery, TravelMode, TravelTimeCell,
    TravelTimeResult,
};
