use std::time::Duration;

/// Process-wide configuration, constructed once at startup and passed into
/// the pipeline and its provider adapters. Nothing downstream reads the
/// environment directly.
#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// TomTom API key. The traffic and charger-availability providers are
    /// only registered when this is set.
    pub tomtom_api_key: Option<String>,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Search radius in metres for amenity / road / charger lookups.
    pub lookup_radius_m: u32,
    /// Decimal places coordinates are rounded to for cache keys.
    pub cache_precision: u8,
    pub pacing_base_ms: u64,
    pub pacing_max_ms: u64,
    pub geocoder_base_url: String,
    pub postcode_base_url: String,
    pub traffic_base_url: String,
    pub overpass_base_url: String,
    pub charger_base_url: String,
}

impl AppConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field(
                "tomtom_api_key",
                &self.tomtom_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("user_agent", &self.user_agent)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("lookup_radius_m", &self.lookup_radius_m)
            .field("cache_precision", &self.cache_precision)
            .field("pacing_base_ms", &self.pacing_base_ms)
            .field("pacing_max_ms", &self.pacing_max_ms)
            .field("geocoder_base_url", &self.geocoder_base_url)
            .field("postcode_base_url", &self.postcode_base_url)
            .field("traffic_base_url", &self.traffic_base_url)
            .field("overpass_base_url", &self.overpass_base_url)
            .field("charger_base_url", &self.charger_base_url)
            .finish()
    }
}
