//! Traffic flow lookup against a TomTom flow-segment-style API.

use futures::future::BoxFuture;
use reqwest::{Client, Url};
use serde::Deserialize;

use evsite_core::Coordinate;

use crate::error::AdapterError;
use crate::providers::{get_json, parse_base_url, LookupProvider};
use crate::types::{CongestionLevel, ProviderKind, ProviderPayload, TrafficInfo};

const FLOW_SEGMENT_PATH: &str = "traffic/services/4/flowSegmentData/absolute/10/json";

pub struct TrafficProvider {
    client: Client,
    base_url: Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowResponse {
    flow_segment_data: FlowSegmentData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowSegmentData {
    current_speed: f64,
    free_flow_speed: f64,
    #[serde(default)]
    road_closure: bool,
}

impl TrafficProvider {
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Result<Self, AdapterError> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            api_key: api_key.to_owned(),
        })
    }

    async fn flow(&self, coordinate: Coordinate) -> Result<TrafficInfo, AdapterError> {
        let mut url =
            self.base_url
                .join(FLOW_SEGMENT_PATH)
                .map_err(|e| AdapterError::InvalidBaseUrl {
                    url: self.base_url.to_string(),
                    reason: e.to_string(),
                })?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("point", &coordinate.to_string());

        let context = format!("flowSegmentData({coordinate})");
        let response: FlowResponse = get_json(&self.client, url, &context).await?;
        let segment = response.flow_segment_data;

        Ok(TrafficInfo {
            current_speed_kmh: segment.current_speed,
            free_flow_speed_kmh: segment.free_flow_speed,
            congestion: CongestionLevel::from_speeds(segment.current_speed, segment.free_flow_speed),
            road_closed: segment.road_closure,
        })
    }
}

impl LookupProvider for TrafficProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Traffic
    }

    fn lookup(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'_, Result<ProviderPayload, AdapterError>> {
        Box::pin(async move { self.flow(coordinate).await.map(ProviderPayload::Traffic) })
    }
}
