//! External lookup providers.
//!
//! One adapter per data category, each owning its wire format and
//! normalizing its failures into [`AdapterError`](crate::error::AdapterError)
//! before they reach the pipeline. Every adapter takes an injectable base URL
//! so tests can point it at a mock server.

mod amenity;
mod chargers;
mod geocode;
mod postcode;
mod roads;
mod traffic;

pub use amenity::AmenityProvider;
pub use chargers::ChargerProvider;
pub use geocode::GeocodeProvider;
pub use postcode::PostcodeProvider;
pub use roads::RoadProvider;
pub use traffic::TrafficProvider;

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use evsite_core::{AppConfig, Coordinate};

use crate::error::AdapterError;
use crate::types::{ProviderKind, ProviderPayload};

/// One external data source: given a coordinate, produce this provider's
/// payload or a typed error. The pipeline absorbs the error into the site
/// record; implementations never panic and never hang past their client's
/// request timeout.
pub trait LookupProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn lookup(&self, coordinate: Coordinate)
        -> BoxFuture<'_, Result<ProviderPayload, AdapterError>>;
}

/// Builds the shared HTTP client used by all adapters.
///
/// # Errors
///
/// Returns [`AdapterError::Http`] if the client cannot be constructed.
pub(crate) fn build_http_client(
    user_agent: &str,
    timeout: Duration,
) -> Result<Client, AdapterError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()
        .map_err(AdapterError::from)
}

/// Parses a base URL, normalising it to end with exactly one slash so that
/// `Url::join` appends path segments instead of replacing the last one.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, AdapterError> {
    let normalised = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| AdapterError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Sends a GET request, asserts a 2xx status, and deserializes the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: Url,
    context: &str,
) -> Result<T, AdapterError> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AdapterError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| AdapterError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

/// Sends a POST with a form-encoded body (the Overpass interpreter's input
/// convention), asserts a 2xx status, and deserializes the JSON response.
pub(crate) async fn post_form_json<T: DeserializeOwned>(
    client: &Client,
    url: Url,
    body: String,
    context: &str,
) -> Result<T, AdapterError> {
    let response = client
        .post(url.clone())
        .header(
            reqwest::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(body)
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AdapterError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| AdapterError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

/// Constructs the default provider registry for a configuration.
///
/// The geocoder, postcode, amenity, and road providers are always
/// registered. The TomTom-backed traffic and charger-availability providers
/// are only registered when an API key is configured — their record entries
/// are then absent entirely, which consumers read as "never queried".
///
/// # Errors
///
/// Returns [`AdapterError`] if the HTTP client cannot be built or a
/// configured base URL does not parse.
pub fn default_providers(
    config: &AppConfig,
) -> Result<Vec<Arc<dyn LookupProvider>>, AdapterError> {
    let client = build_http_client(&config.user_agent, config.request_timeout())?;

    let mut providers: Vec<Arc<dyn LookupProvider>> = vec![
        Arc::new(GeocodeProvider::new(
            client.clone(),
            &config.geocoder_base_url,
        )?),
        Arc::new(PostcodeProvider::new(
            client.clone(),
            &config.postcode_base_url,
        )?),
        Arc::new(AmenityProvider::new(
            client.clone(),
            &config.overpass_base_url,
            config.lookup_radius_m,
        )?),
        Arc::new(RoadProvider::new(client.clone(), &config.overpass_base_url)?),
    ];

    if let Some(api_key) = &config.tomtom_api_key {
        providers.push(Arc::new(TrafficProvider::new(
            client.clone(),
            &config.traffic_base_url,
            api_key,
        )?));
        providers.push(Arc::new(ChargerProvider::new(
            client,
            &config.charger_base_url,
            api_key,
            config.lookup_radius_m,
        )?));
    } else {
        tracing::info!(
            "TOMTOM_API_KEY not set — traffic and charger availability lookups disabled"
        );
    }

    Ok(providers)
}
