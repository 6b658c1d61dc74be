//! Provider payload types.
//!
//! Each provider category owns a disjoint set of output fields, so the merge
//! into a site record is a plain map insert with no conflict policy.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classify::RoadClass;
use crate::error::FailureReason;

/// The provider categories a site can be enriched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Address,
    Postcode,
    Traffic,
    Amenities,
    Road,
    Chargers,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Address => "address",
            ProviderKind::Postcode => "postcode",
            ProviderKind::Traffic => "traffic",
            ProviderKind::Amenities => "amenities",
            ProviderKind::Road => "road",
            ProviderKind::Chargers => "chargers",
        }
    }

    /// All categories in record/export order.
    #[must_use]
    pub fn all() -> [ProviderKind; 6] {
        [
            ProviderKind::Address,
            ProviderKind::Postcode,
            ProviderKind::Traffic,
            ProviderKind::Amenities,
            ProviderKind::Road,
            ProviderKind::Chargers,
        ]
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of querying one provider: structured data or a retained failure
/// reason. This is the only shape a lookup can produce — adapters never
/// return errors past this boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupOutcome {
    Success { data: ProviderPayload },
    Unavailable { reason: FailureReason },
}

impl LookupOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, LookupOutcome::Success { .. })
    }

    #[must_use]
    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            LookupOutcome::Success { .. } => None,
            LookupOutcome::Unavailable { reason } => Some(reason),
        }
    }
}

/// Structured data from one provider category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProviderPayload {
    Address(AddressInfo),
    Postcode(PostcodeInfo),
    Traffic(TrafficInfo),
    Amenities(AmenitySummary),
    Road(RoadInfo),
    Chargers(ChargerAvailability),
}

impl ProviderPayload {
    #[must_use]
    pub fn as_address(&self) -> Option<&AddressInfo> {
        match self {
            ProviderPayload::Address(info) => Some(info),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_postcode(&self) -> Option<&PostcodeInfo> {
        match self {
            ProviderPayload::Postcode(info) => Some(info),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_traffic(&self) -> Option<&TrafficInfo> {
        match self {
            ProviderPayload::Traffic(info) => Some(info),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_amenities(&self) -> Option<&AmenitySummary> {
        match self {
            ProviderPayload::Amenities(summary) => Some(summary),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_road(&self) -> Option<&RoadInfo> {
        match self {
            ProviderPayload::Road(info) => Some(info),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_chargers(&self) -> Option<&ChargerAvailability> {
        match self {
            ProviderPayload::Chargers(availability) => Some(availability),
            _ => None,
        }
    }
}

/// Reverse-geocoded address components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressInfo {
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub locality: Option<String>,
    pub county: Option<String>,
    pub region: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    /// Provider-formatted single-line address.
    pub formatted: String,
}

/// Postcode and administrative areas for a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostcodeInfo {
    pub postcode: String,
    pub ward: Option<String>,
    pub district: Option<String>,
    pub region: Option<String>,
}

/// Congestion classification derived from the current/free-flow speed ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CongestionLevel {
    FreeFlow,
    Moderate,
    Heavy,
    Severe,
}

impl CongestionLevel {
    /// Classifies from speeds. A non-positive free-flow speed (degenerate
    /// provider data) classifies as free-flowing rather than dividing by zero.
    #[must_use]
    pub fn from_speeds(current_kmh: f64, free_flow_kmh: f64) -> Self {
        if free_flow_kmh <= 0.0 {
            return CongestionLevel::FreeFlow;
        }
        let ratio = current_kmh / free_flow_kmh;
        if ratio < 0.5 {
            CongestionLevel::Severe
        } else if ratio < 0.75 {
            CongestionLevel::Heavy
        } else if ratio < 0.9 {
            CongestionLevel::Moderate
        } else {
            CongestionLevel::FreeFlow
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CongestionLevel::FreeFlow => "free_flow",
            CongestionLevel::Moderate => "moderate",
            CongestionLevel::Heavy => "heavy",
            CongestionLevel::Severe => "severe",
        }
    }
}

/// Traffic flow at the nearest road segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficInfo {
    pub current_speed_kmh: f64,
    pub free_flow_speed_kmh: f64,
    pub congestion: CongestionLevel,
    pub road_closed: bool,
}

/// A named nearby point of interest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Amenity {
    pub name: String,
    pub category: String,
}

/// Nearby points of interest, grouped by category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmenitySummary {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    /// Named amenities, capped at a small display count.
    pub named: Vec<Amenity>,
}

/// The road a site would be accessed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadInfo {
    pub name: Option<String>,
    pub highway_tag: Option<String>,
    pub class: RoadClass,
}

/// A nearby EV charging station from the availability search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargingStation {
    pub name: Option<String>,
    pub address: Option<String>,
    pub distance_m: Option<f64>,
}

/// Competitor charging infrastructure near the site. An empty result is
/// valid data (no competition), not a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargerAvailability {
    pub total: usize,
    pub stations: Vec<ChargingStation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn congestion_thresholds() {
        assert_eq!(
            CongestionLevel::from_speeds(20.0, 50.0),
            CongestionLevel::Severe
        );
        assert_eq!(
            CongestionLevel::from_speeds(30.0, 50.0),
            CongestionLevel::Heavy
        );
        assert_eq!(
            CongestionLevel::from_speeds(42.0, 50.0),
            CongestionLevel::Moderate
        );
        assert_eq!(
            CongestionLevel::from_speeds(49.0, 50.0),
            CongestionLevel::FreeFlow
        );
    }

    #[test]
    fn congestion_tolerates_degenerate_free_flow() {
        assert_eq!(
            CongestionLevel::from_speeds(10.0, 0.0),
            CongestionLevel::FreeFlow
        );
    }

    #[test]
    fn provider_kind_round_trips_through_display() {
        for kind in ProviderKind::all() {
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }
}
