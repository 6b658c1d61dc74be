//! Site survey requests and the merged site record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use evsite_core::{to_national_grid, ChargerConfig, Coordinate, GridRef};

use crate::types::{LookupOutcome, ProviderKind, ProviderPayload};

/// One validated survey request: where the site is and what will be
/// installed there. Both fields are smart-constructed value types, so a
/// `SiteRequest` cannot hold out-of-range input.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SiteRequest {
    pub coordinate: Coordinate,
    pub chargers: ChargerConfig,
}

/// The merged output for one site: local computations plus one entry per
/// consulted provider. Immutable once built — re-analysis produces a fresh
/// record.
///
/// A missing key in `providers` means that provider was never queried
/// (for example the TomTom lookups when no API key is configured), which is
/// distinct from an [`LookupOutcome::Unavailable`] entry recording a failed
/// query. Records for malformed batch rows carry `row_error` and nothing
/// else.
#[derive(Debug, Clone, Serialize)]
pub struct SiteRecord {
    pub coordinate: Option<Coordinate>,
    pub grid_ref: Option<GridRef>,
    pub required_kva: Option<f64>,
    pub generated_at: DateTime<Utc>,
    pub providers: BTreeMap<ProviderKind, LookupOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_error: Option<String>,
}

const NOT_QUERIED: &str = "not queried";

impl SiteRecord {
    pub(crate) fn enriched(
        request: &SiteRequest,
        providers: BTreeMap<ProviderKind, LookupOutcome>,
    ) -> Self {
        Self {
            coordinate: Some(request.coordinate),
            grid_ref: to_national_grid(request.coordinate),
            required_kva: Some(request.chargers.required_kva()),
            generated_at: Utc::now(),
            providers,
            row_error: None,
        }
    }

    pub(crate) fn from_row_error(message: impl Into<String>) -> Self {
        Self {
            coordinate: None,
            grid_ref: None,
            required_kva: None,
            generated_at: Utc::now(),
            providers: BTreeMap::new(),
            row_error: Some(message.into()),
        }
    }

    /// Ordered flat (column, value) pairs for tabular export.
    ///
    /// The column set is fixed regardless of which providers ran, so every
    /// record in a batch renders the same header row. Fields from a failed
    /// lookup render as `unavailable (<reason>)` and fields from a provider
    /// that was never registered render as `not queried` — the distinction
    /// the JSON form keeps as structure survives into the flat form as text.
    #[must_use]
    pub fn flat_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields: Vec<(&'static str, String)> = Vec::with_capacity(32);

        let coord = |f: fn(&Coordinate) -> f64| {
            self.coordinate
                .as_ref()
                .map(|c| format!("{:.6}", f(c)))
                .unwrap_or_default()
        };
        fields.push(("latitude", coord(Coordinate::lat)));
        fields.push(("longitude", coord(Coordinate::lon)));
        fields.push((
            "easting",
            self.grid_ref
                .map(|g| format!("{:.0}", g.easting))
                .unwrap_or_default(),
        ));
        fields.push((
            "northing",
            self.grid_ref
                .map(|g| format!("{:.0}", g.northing))
                .unwrap_or_default(),
        ));
        fields.push((
            "required_kva",
            self.required_kva
                .map(|kva| format!("{kva:.2}"))
                .unwrap_or_default(),
        ));
        fields.push(("row_error", self.row_error.clone().unwrap_or_default()));

        self.push_provider(
            &mut fields,
            ProviderKind::Address,
            &[
                "address_street",
                "address_locality",
                "address_county",
                "address_region",
                "address_postcode",
                "address_country",
                "address_formatted",
            ],
            ProviderPayload::as_address,
            |a| {
                vec![
                    a.street.clone().unwrap_or_default(),
                    a.locality.clone().unwrap_or_default(),
                    a.county.clone().unwrap_or_default(),
                    a.region.clone().unwrap_or_default(),
                    a.postcode.clone().unwrap_or_default(),
                    a.country.clone().unwrap_or_default(),
                    a.formatted.clone(),
                ]
            },
        );

        self.push_provider(
            &mut fields,
            ProviderKind::Postcode,
            &["postcode", "ward", "district", "postcode_region"],
            ProviderPayload::as_postcode,
            |p| {
                vec![
                    p.postcode.clone(),
                    p.ward.clone().unwrap_or_default(),
                    p.district.clone().unwrap_or_default(),
                    p.region.clone().unwrap_or_default(),
                ]
            },
        );

        self.push_provider(
            &mut fields,
            ProviderKind::Traffic,
            &[
                "traffic_current_kmh",
                "traffic_free_flow_kmh",
                "traffic_congestion",
                "traffic_road_closed",
            ],
            ProviderPayload::as_traffic,
            |t| {
                vec![
                    format!("{:.1}", t.current_speed_kmh),
                    format!("{:.1}", t.free_flow_speed_kmh),
                    t.congestion.as_str().to_string(),
                    t.road_closed.to_string(),
                ]
            },
        );

        self.push_provider(
            &mut fields,
            ProviderKind::Amenities,
            &["amenities_total", "amenities_by_category", "amenities_named"],
            ProviderPayload::as_amenities,
            |a| {
                let by_category = a
                    .by_category
                    .iter()
                    .map(|(category, count)| format!("{category}:{count}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                let named = a
                    .named
                    .iter()
                    .map(|amenity| amenity.name.clone())
                    .collect::<Vec<_>>()
                    .join("; ");
                vec![a.total.to_string(), by_category, named]
            },
        );

        self.push_provider(
            &mut fields,
            ProviderKind::Road,
            &["road_name", "road_highway_tag", "road_class"],
            ProviderPayload::as_road,
            |r| {
                vec![
                    r.name.clone().unwrap_or_default(),
                    r.highway_tag.clone().unwrap_or_default(),
                    r.class.as_str().to_string(),
                ]
            },
        );

        self.push_provider(
            &mut fields,
            ProviderKind::Chargers,
            &["charging_stations_total", "charging_stations"],
            ProviderPayload::as_chargers,
            |c| {
                let stations = c
                    .stations
                    .iter()
                    .map(|s| match (&s.name, &s.address) {
                        (Some(name), Some(address)) => format!("{name} ({address})"),
                        (Some(name), None) => name.clone(),
                        (None, Some(address)) => address.clone(),
                        (None, None) => "unnamed".to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                vec![c.total.to_string(), stations]
            },
        );

        fields
    }

    fn push_provider<T>(
        &self,
        fields: &mut Vec<(&'static str, String)>,
        kind: ProviderKind,
        columns: &[&'static str],
        extract: impl Fn(&ProviderPayload) -> Option<&T>,
        render: impl Fn(&T) -> Vec<String>,
    ) {
        let values = match self.providers.get(&kind) {
            None => vec![NOT_QUERIED.to_string(); columns.len()],
            Some(LookupOutcome::Unavailable { reason }) => {
                vec![format!("unavailable ({})", reason.summary()); columns.len()]
            }
            Some(LookupOutcome::Success { data }) => {
                extract(data).map_or_else(|| vec![String::new(); columns.len()], render)
            }
        };
        debug_assert_eq!(values.len(), columns.len());
        for (column, value) in columns.iter().zip(values) {
            fields.push((column, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureReason;
    use crate::types::PostcodeInfo;
    use evsite_core::ChargerMix;

    fn request() -> SiteRequest {
        SiteRequest {
            coordinate: Coordinate::new(51.5074, -0.1278).unwrap(),
            chargers: ChargerConfig::with_defaults(ChargerMix::new(2, 1, 1).unwrap()),
        }
    }

    #[test]
    fn enriched_record_carries_local_computations() {
        let record = SiteRecord::enriched(&request(), BTreeMap::new());
        assert!(record.coordinate.is_some());
        assert!(record.grid_ref.is_some(), "London is on the national grid");
        assert_eq!(record.required_kva, Some(282.22));
        assert!(record.row_error.is_none());
    }

    #[test]
    fn row_error_record_is_otherwise_empty() {
        let record = SiteRecord::from_row_error("row 3: missing longitude");
        assert!(record.coordinate.is_none());
        assert!(record.grid_ref.is_none());
        assert!(record.required_kva.is_none());
        assert!(record.providers.is_empty());
        assert_eq!(record.row_error.as_deref(), Some("row 3: missing longitude"));
    }

    #[test]
    fn flat_fields_distinguish_failure_from_never_queried() {
        let mut providers = BTreeMap::new();
        providers.insert(
            ProviderKind::Postcode,
            LookupOutcome::Unavailable {
                reason: FailureReason::Timeout,
            },
        );
        // No traffic entry at all: that provider was never registered.
        let record = SiteRecord::enriched(&request(), providers);
        let fields = record.flat_fields();

        let value = |name: &str| -> &str {
            fields
                .iter()
                .find(|(column, _)| *column == name)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };
        assert_eq!(value("postcode"), "unavailable (timeout)");
        assert_eq!(value("ward"), "unavailable (timeout)");
        assert_eq!(value("traffic_congestion"), "not queried");
        assert_eq!(value("required_kva"), "282.22");
    }

    #[test]
    fn flat_fields_render_successful_payloads() {
        let mut providers = BTreeMap::new();
        providers.insert(
            ProviderKind::Postcode,
            LookupOutcome::Success {
                data: ProviderPayload::Postcode(PostcodeInfo {
                    postcode: "SW1A 1AA".to_string(),
                    ward: Some("St James's".to_string()),
                    district: Some("Westminster".to_string()),
                    region: Some("London".to_string()),
                }),
            },
        );
        let record = SiteRecord::enriched(&request(), providers);
        let fields = record.flat_fields();
        assert!(fields.contains(&("postcode", "SW1A 1AA".to_string())));
        assert!(fields.contains(&("ward", "St James's".to_string())));
    }

    #[test]
    fn column_set_is_identical_across_records() {
        let enriched = SiteRecord::enriched(&request(), BTreeMap::new());
        let failed = SiteRecord::from_row_error("bad row");
        let names = |record: &SiteRecord| -> Vec<&'static str> {
            record.flat_fields().into_iter().map(|(n, _)| n).collect()
        };
        assert_eq!(names(&enriched), names(&failed));
    }

    #[test]
    fn records_serialize_with_string_provider_keys() {
        let mut providers = BTreeMap::new();
        providers.insert(
            ProviderKind::Postcode,
            LookupOutcome::Unavailable {
                reason: FailureReason::Denied { status: 429 },
            },
        );
        let record = SiteRecord::enriched(&request(), providers);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["required_kva"], 282.22);
        assert_eq!(json["providers"]["postcode"]["status"], "unavailable");
        assert_eq!(json["providers"]["postcode"]["reason"]["kind"], "denied");
    }
}
