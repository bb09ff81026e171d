//! Spherical-Earth geodesy.
//!
//! Distances are great-circle distances in kilometres. The bounding box for a
//! radius is a locally flat approximation: it holds for radii well below the
//! scale where meridian convergence matters and is not corrected for high
//! latitudes.

use std::f64::consts::PI;

use crate::bbox::BoundingBox;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Initial bearing from the first point to the second, in degrees clockwise
/// from north, normalized to [0, 360).
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let y = d_lon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * d_lon.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Point reached by travelling `distance_km` from (lat, lon) along
/// `bearing_deg`. Returns (lat, lon).
pub fn destination_point(lat: f64, lon: f64, bearing_deg: f64, distance_km: f64) -> (f64, f64) {
    let lat_rad = lat.to_radians();
    let lon_rad = lon.to_radians();
    let bearing = bearing_deg.to_radians();
    let angular_dist = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat_rad.sin() * angular_dist.cos()
        + lat_rad.cos() * angular_dist.sin() * bearing.cos())
    .asin();

    let lon2 = lon_rad
        + (bearing.sin() * angular_dist.sin() * lat_rad.cos())
            .atan2(angular_dist.cos() - lat_rad.sin() * lat2.sin());

    (lat2.to_degrees(), lon2.to_degrees())
}

/// Bounding box enclosing a circle of `radius_km` around (lat, lon).
///
/// `dLat = radius / R * 180/π`, `dLon = dLat / cos(lat)`.
pub fn bbox_for_radius(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let d_lat = radius_km / EARTH_RADIUS_KM * (180.0 / PI);
    let d_lon = d_lat / lat.to_radians().cos();

    BoundingBox::new(lon - d_lon, lat - d_lat, lon + d_lon, lat + d_lat)
}

/// Approximate surface area in km² of a square pixel of `pixel_size_deg`
/// centred at `lat`.
pub fn approx_pixel_area_km2(lat: f64, pixel_size_deg: f64) -> f64 {
    let height_km = pixel_size_deg / 360.0 * 2.0 * PI * EARTH_RADIUS_KM;
    let width_km = height_km * lat.to_radians().cos();
    height_km * width_km
}
