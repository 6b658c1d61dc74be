//! Postcode and administrative-area lookup against a postcodes.io-style API.

use futures::future::BoxFuture;
use reqwest::{Client, Url};
use serde::Deserialize;

use evsite_core::Coordinate;

use crate::error::AdapterError;
use crate::providers::{get_json, parse_base_url, LookupProvider};
use crate::types::{PostcodeInfo, ProviderKind, ProviderPayload};

pub struct PostcodeProvider {
    client: Client,
    base_url: Url,
}

/// postcodes.io wraps everything in a status envelope; `result` is `null`
/// when no postcode covers the queried position.
#[derive(Debug, Deserialize)]
struct PostcodesResponse {
    status: i64,
    result: Option<Vec<PostcodeEntry>>,
}

#[derive(Debug, Deserialize)]
struct PostcodeEntry {
    postcode: String,
    admin_ward: Option<String>,
    admin_district: Option<String>,
    region: Option<String>,
}

impl PostcodeProvider {
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(client: Client, base_url: &str) -> Result<Self, AdapterError> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
        })
    }

    async fn nearest(&self, coordinate: Coordinate) -> Result<PostcodeInfo, AdapterError> {
        let mut url = self
            .base_url
            .join("postcodes")
            .map_err(|e| AdapterError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("lon", &format!("{:.6}", coordinate.lon()))
            .append_pair("lat", &format!("{:.6}", coordinate.lat()))
            .append_pair("limit", "1");

        let context = format!("postcodes({coordinate})");
        let response: PostcodesResponse = get_json(&self.client, url, &context).await?;

        if response.status != 200 {
            return Err(AdapterError::NoData(format!(
                "postcode API envelope status {}",
                response.status
            )));
        }
        let entry = response
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| {
                AdapterError::NoData("no postcode covers this position".to_string())
            })?;

        Ok(PostcodeInfo {
            postcode: entry.postcode,
            ward: entry.admin_ward,
            district: entry.admin_district,
            region: entry.region,
        })
    }
}

impl LookupProvider for PostcodeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Postcode
    }

    fn lookup(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'_, Result<ProviderPayload, AdapterError>> {
        Box::pin(async move {
            self.nearest(coordinate)
                .await
                .map(ProviderPayload::Postcode)
        })
    }
}
