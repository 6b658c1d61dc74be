//! Nearby EV charging station search against a TomTom-style availability API.

use futures::future::BoxFuture;
use reqwest::{Client, Url};
use serde::Deserialize;

use evsite_core::Coordinate;

use crate::error::AdapterError;
use crate::providers::{get_json, parse_base_url, LookupProvider};
use crate::types::{ChargerAvailability, ChargingStation, ProviderKind, ProviderPayload};

const SEARCH_PATH: &str = "search/2/evChargingAvailability.json";

pub struct ChargerProvider {
    client: Client,
    base_url: Url,
    api_key: String,
    radius_m: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    poi: Option<Poi>,
    address: Option<SearchAddress>,
    dist: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Poi {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchAddress {
    freeform_address: Option<String>,
}

impl ChargerProvider {
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(
        client: Client,
        base_url: &str,
        api_key: &str,
        radius_m: u32,
    ) -> Result<Self, AdapterError> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            api_key: api_key.to_owned(),
            radius_m,
        })
    }

    async fn nearby(&self, coordinate: Coordinate) -> Result<ChargerAvailability, AdapterError> {
        let mut url = self
            .base_url
            .join(SEARCH_PATH)
            .map_err(|e| AdapterError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("lat", &format!("{:.6}", coordinate.lat()))
            .append_pair("lon", &format!("{:.6}", coordinate.lon()))
            .append_pair("radius", &self.radius_m.to_string());

        let context = format!("evChargingAvailability({coordinate})");
        let response: SearchResponse = get_json(&self.client, url, &context).await?;

        // No stations in range is valid data — an uncontested site — not a
        // lookup failure.
        let stations = response
            .results
            .into_iter()
            .map(|result| ChargingStation {
                name: result.poi.and_then(|poi| poi.name),
                address: result.address.and_then(|a| a.freeform_address),
                distance_m: result.dist,
            })
            .collect::<Vec<_>>();

        Ok(ChargerAvailability {
            total: stations.len(),
            stations,
        })
    }
}

impl LookupProvider for ChargerProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Chargers
    }

    fn lookup(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'_, Result<ProviderPayload, AdapterError>> {
        Box::pin(async move {
            self.nearby(coordinate)
                .await
                .map(ProviderPayload::Chargers)
        })
    }
}
