use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse. No variable is strictly
/// required — every knob has a default and the TomTom key is optional.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing and defaulting logic lives here, decoupled from the actual
/// environment so it can be tested with a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u8 = |var: &str, default: &str| -> Result<u8, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u8>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let log_level = or_default("EVSITE_LOG_LEVEL", "info");
    let tomtom_api_key = lookup("TOMTOM_API_KEY").ok();
    let user_agent = or_default("EVSITE_USER_AGENT", "evsite/0.1 (site-survey)");
    let request_timeout_secs = parse_u64("EVSITE_REQUEST_TIMEOUT_SECS", "10")?;
    let lookup_radius_m = parse_u32("EVSITE_LOOKUP_RADIUS_M", "500")?;
    let cache_precision = parse_u8("EVSITE_CACHE_PRECISION", "4")?;
    let pacing_base_ms = parse_u64("EVSITE_PACING_BASE_MS", "250")?;
    let pacing_max_ms = parse_u64("EVSITE_PACING_MAX_MS", "8000")?;

    let geocoder_base_url = or_default(
        "EVSITE_GEOCODER_BASE_URL",
        "https://nominatim.openstreetmap.org",
    );
    let postcode_base_url = or_default("EVSITE_POSTCODE_BASE_URL", "https://api.postcodes.io");
    let traffic_base_url = or_default("EVSITE_TRAFFIC_BASE_URL", "https://api.tomtom.com");
    let overpass_base_url = or_default("EVSITE_OVERPASS_BASE_URL", "https://overpass-api.de");
    let charger_base_url = or_default("EVSITE_CHARGER_BASE_URL", "https://api.tomtom.com");

    Ok(AppConfig {
        log_level,
        tomtom_api_key,
        user_agent,
        request_timeout_secs,
        lookup_radius_m,
        cache_precision,
        pacing_base_ms,
        pacing_max_ms,
        geocoder_base_url,
        postcode_base_url,
        traffic_base_url,
        overpass_base_url,
        charger_base_url,
    })
}
