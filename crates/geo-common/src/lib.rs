//! Common geographic types and geodesy utilities.
//!
//! All calculations use a spherical Earth of radius [`EARTH_RADIUS_KM`];
//! no ellipsoid corrections are applied anywhere in the workspace.

pub mod bbox;
pub mod geodesy;

pub use bbox::{BboxParseError, BoundingBox};
pub use geodesy::{
    approx_pixel_area_km2, bbox_for_radius, bearing_deg, destination_point, haversine_km,
    EARTH_RADIUS_KM,
};
