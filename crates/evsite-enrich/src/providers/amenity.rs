//! Nearby amenity lookup against an Overpass-style API.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, Url};
use serde::Deserialize;

use evsite_core::Coordinate;

use crate::error::AdapterError;
use crate::providers::{parse_base_url, post_form_json, LookupProvider};
use crate::types::{Amenity, AmenitySummary, ProviderKind, ProviderPayload};

const INTERPRETER_PATH: &str = "api/interpreter";
/// Cap on elements requested from the interpreter.
const MAX_ELEMENTS: usize = 100;
/// Cap on named amenities carried into the summary.
const NAMED_CAP: usize = 10;

pub struct AmenityProvider {
    client: Client,
    base_url: Url,
    radius_m: u32,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

impl AmenityProvider {
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(client: Client, base_url: &str, radius_m: u32) -> Result<Self, AdapterError> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            radius_m,
        })
    }

    async fn nearby(&self, coordinate: Coordinate) -> Result<AmenitySummary, AdapterError> {
        let url = self
            .base_url
            .join(INTERPRETER_PATH)
            .map_err(|e| AdapterError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        let query = format!(
            "[out:json][timeout:10];node[\"amenity\"](around:{},{:.6},{:.6});out body {MAX_ELEMENTS};",
            self.radius_m,
            coordinate.lat(),
            coordinate.lon(),
        );
        let body = format!("data={}", utf8_percent_encode(&query, NON_ALPHANUMERIC));

        let context = format!("amenities({coordinate})");
        let response: OverpassResponse =
            post_form_json(&self.client, url, body, &context).await?;

        let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
        let mut named = Vec::new();
        for element in &response.elements {
            let Some(category) = element.tags.get("amenity") else {
                continue;
            };
            *by_category.entry(category.clone()).or_insert(0) += 1;
            if named.len() < NAMED_CAP {
                if let Some(name) = element.tags.get("name") {
                    named.push(Amenity {
                        name: name.clone(),
                        category: category.clone(),
                    });
                }
            }
        }

        Ok(AmenitySummary {
            total: by_category.values().sum(),
            by_category,
            named,
        })
    }
}

impl LookupProvider for AmenityProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Amenities
    }

    fn lookup(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'_, Result<ProviderPayload, AdapterError>> {
        Box::pin(async move {
            self.nearby(coordinate)
                .await
                .map(ProviderPayload::Amenities)
        })
    }
}
