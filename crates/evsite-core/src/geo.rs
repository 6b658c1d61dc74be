//! Validated WGS84 coordinates.

use serde::Serialize;

use crate::CoreError;

/// A WGS84 position in decimal degrees.
///
/// Construction via [`Coordinate::new`] is the only way to obtain one, so a
/// `Coordinate` held anywhere in the system is known to be finite and within
/// bounds. Downstream code (the enrichment pipeline, provider adapters, the
/// grid transform) never re-validates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    /// Validates and wraps a latitude/longitude pair.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidLatitude`] if `lat` is not finite or is
    /// outside [-90, 90], and [`CoreError::InvalidLongitude`] for `lon`
    /// outside [-180, 180]. Latitude is checked first.
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoreError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoreError::InvalidLatitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoreError::InvalidLongitude(lon));
        }
        Ok(Self { lat, lon })
    }

    #[must_use]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[must_use]
    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}
