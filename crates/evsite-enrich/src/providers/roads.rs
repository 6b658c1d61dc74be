//! Nearest-road lookup against an Overpass-style API, classified into the
//! site report's road taxonomy.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, Url};
use serde::Deserialize;

use evsite_core::Coordinate;

use crate::classify::classify_road;
use crate::error::AdapterError;
use crate::providers::{parse_base_url, post_form_json, LookupProvider};
use crate::types::{ProviderKind, ProviderPayload, RoadInfo};

const INTERPRETER_PATH: &str = "api/interpreter";
/// Snap radius: ways further out than this are not "the site's road".
const SNAP_RADIUS_M: u32 = 75;
const MAX_WAYS: usize = 20;

pub struct RoadProvider {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassWay>,
}

#[derive(Debug, Deserialize)]
struct OverpassWay {
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

impl RoadProvider {
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(client: Client, base_url: &str) -> Result<Self, AdapterError> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
        })
    }

    async fn nearest_road(&self, coordinate: Coordinate) -> Result<RoadInfo, AdapterError> {
        let url = self
            .base_url
            .join(INTERPRETER_PATH)
            .map_err(|e| AdapterError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        let query = format!(
            "[out:json][timeout:10];way[\"highway\"](around:{SNAP_RADIUS_M},{:.6},{:.6});out tags {MAX_WAYS};",
            coordinate.lat(),
            coordinate.lon(),
        );
        let body = format!("data={}", utf8_percent_encode(&query, NON_ALPHANUMERIC));

        let context = format!("nearest_road({coordinate})");
        let response: OverpassResponse =
            post_form_json(&self.client, url, body, &context).await?;

        // Several ways can fall inside the snap radius; report the most
        // significant one (a motorway beats the service road next to it).
        response
            .elements
            .iter()
            .map(|way| {
                let name = way
                    .tags
                    .get("name")
                    .or_else(|| way.tags.get("ref"))
                    .cloned();
                let highway_tag = way.tags.get("highway").cloned();
                let class = classify_road(
                    highway_tag.as_deref(),
                    way.tags.get("junction").map(String::as_str),
                    name.as_deref(),
                );
                RoadInfo {
                    name,
                    highway_tag,
                    class,
                }
            })
            .min_by_key(|info| info.class.priority())
            .ok_or_else(|| {
                AdapterError::NoData(format!("no road within {SNAP_RADIUS_M} m"))
            })
    }
}

impl LookupProvider for RoadProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Road
    }

    fn lookup(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'_, Result<ProviderPayload, AdapterError>> {
        Box::pin(async move {
            self.nearest_road(coordinate)
                .await
                .map(ProviderPayload::Road)
        })
    }
}
