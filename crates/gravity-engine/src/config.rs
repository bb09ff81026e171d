//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::bands::DEFAULT_TIME_BANDS;

/// Tunables for the gravity engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum distance in km used for weighting (spatial case).
    pub min_clamp_km: f64,

    /// Minimum travel time in minutes used for weighting (time case).
    pub min_clamp_minutes: f64,

    /// Radius around the origin for the "near" coverage diagnostics.
    pub coverage_radius_km: f64,

    /// Default supercell edge length in degrees.
    pub supercell_deg: f64,

    /// Fixed time bands in minutes as (min, max) pairs.
    pub time_bands: Vec<(f64, f64)>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_clamp_km: 0.1,
            min_clamp_minutes: 1.0,
            coverage_radius_km: 50.0,
            supercell_deg: 0.05,
            time_bands: DEFAULT_TIME_BANDS.to_vec(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        let parse = |key: &str| std::env::var(key).ok().and_then(|v| v.parse::<f64>().ok());

        if let Some(v) = parse("GRAVITY_MIN_CLAMP_KM") {
            config.min_clamp_km = v;
        }
        if let Some(v) = parse("GRAVITY_MIN_CLAMP_MINUTES") {
            config.min_clamp_minutes = v;
        }
        if let Some(v) = parse("GRAVITY_COVERAGE_RADIUS_KM") {
            config.coverage_radius_km = v;
        }
        if let Some(v) = parse("GRAVITY_SUPERCELL_DEG") {
            config.supercell_deg = v;
        }
        if let Some(bands) = std::env::var("GRAVITY_TIME_BANDS")
            .ok()
            .and_then(|v| parse_time_bands(&v))
        {
            config.time_bands = bands;
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("min_clamp_km", self.min_clamp_km),
            ("min_clamp_minutes", self.min_clamp_minutes),
            ("coverage_radius_km", self.coverage_radius_km),
            ("supercell_deg", self.supercell_deg),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(format!("{} must be > 0, got {}", name, value));
            }
        }

        if self.time_bands.is_empty() {
            return Err("time_bands must not be empty".to_string());
        }
        let mut expected_lower = 0.0;
        for &(lower, upper) in &self.time_bands {
            if lower != expected_lower || upper <= lower {
                return Err(format!(
                    "time_bands must be contiguous from 0 and increasing, found ({}, {})",
                    lower, upper
                ));
            }
            expected_lower = upper;
        }

        Ok(())
    }
}

/// Parse a comma-separated list of band upper edges in minutes, e.g.
/// `"5,10,30,60"`, into contiguous `(min, max)` pairs starting at 0.
///
/// Returns `None` on any unparseable entry; ordering is left to `validate`.
pub fn parse_time_bands(value: &str) -> Option<Vec<(f64, f64)>> {
    let mut lower = 0.0;
    let mut bands = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let upper = part.parse::<f64>().ok()?;
        bands.push((lower, upper));
        lower = upper;
    }
    Some(bands)
}
