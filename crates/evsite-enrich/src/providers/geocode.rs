//! Reverse geocoding against a Nominatim-style API.

use futures::future::BoxFuture;
use reqwest::{Client, Url};
use serde::Deserialize;

use evsite_core::Coordinate;

use crate::error::AdapterError;
use crate::providers::{get_json, parse_base_url, LookupProvider};
use crate::types::{AddressInfo, ProviderKind, ProviderPayload};

/// Reverse geocoder: coordinate in, address components out.
pub struct GeocodeProvider {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    /// Nominatim reports "unable to geocode" as a 200 with an error field.
    error: Option<String>,
    display_name: Option<String>,
    address: Option<ReverseAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseAddress {
    road: Option<String>,
    house_number: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    suburb: Option<String>,
    county: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

impl GeocodeProvider {
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(client: Client, base_url: &str) -> Result<Self, AdapterError> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
        })
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<AddressInfo, AdapterError> {
        let mut url = self
            .base_url
            .join("reverse")
            .map_err(|e| AdapterError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &format!("{:.6}", coordinate.lat()))
            .append_pair("lon", &format!("{:.6}", coordinate.lon()))
            .append_pair("zoom", "18")
            .append_pair("addressdetails", "1");

        let context = format!("reverse({coordinate})");
        let response: ReverseResponse = get_json(&self.client, url, &context).await?;

        if let Some(error) = response.error {
            return Err(AdapterError::NoData(error));
        }
        let formatted = response
            .display_name
            .ok_or_else(|| AdapterError::NoData("response carried no display name".to_string()))?;

        let address = response.address.unwrap_or_default();
        let locality = address
            .city
            .or(address.town)
            .or(address.village)
            .or(address.suburb);

        Ok(AddressInfo {
            street: address.road,
            house_number: address.house_number,
            locality,
            county: address.county,
            region: address.state,
            postcode: address.postcode,
            country: address.country,
            formatted,
        })
    }
}

impl LookupProvider for GeocodeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Address
    }

    fn lookup(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'_, Result<ProviderPayload, AdapterError>> {
        Box::pin(async move { self.reverse(coordinate).await.map(ProviderPayload::Address) })
    }
}
