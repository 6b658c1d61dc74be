//! Core value types and configuration for the EV site survey tools.
//!
//! Holds the validated input types (coordinates, charger configurations),
//! the local power-sizing computation, the WGS84 → OSGB36 national grid
//! transform, and the environment-driven application configuration shared
//! by the enrichment pipeline and its provider adapters.

use thiserror::Error;

mod app_config;
mod chargers;
mod config;
mod geo;
mod grid;

pub use app_config::AppConfig;
pub use chargers::{ChargerConfig, ChargerMix, PowerRatings, POWER_FACTOR};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::Coordinate;
pub use grid::{to_national_grid, GridRef};

/// Validation errors for site survey inputs.
///
/// These are the only fatal errors in the system: everything downstream of
/// a validated input degrades gracefully instead of failing.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),

    #[error("{class} charger count must be non-negative, got {count}")]
    NegativeChargerCount { class: &'static str, count: i64 },

    #[error("{class} power rating must be a positive finite number of kW, got {value}")]
    InvalidPowerRating { class: &'static str, value: f64 },

    #[error("capacity margin must be a positive finite factor, got {0}")]
    InvalidMargin(f64),
}

/// Errors raised while loading [`AppConfig`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
