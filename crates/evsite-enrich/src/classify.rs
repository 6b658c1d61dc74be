//! Road-type classification.
//!
//! Total and deterministic: a priority-ordered tag rule list first, then
//! name-pattern fallback for untagged data, then `Unknown`. Never fails.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Closed road taxonomy for site reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadClass {
    Motorway,
    /// A-road / primary route.
    Primary,
    /// B-road / secondary route.
    Secondary,
    /// Local or residential street.
    Residential,
    Service,
    Roundabout,
    Unknown,
}

impl RoadClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RoadClass::Motorway => "motorway",
            RoadClass::Primary => "primary",
            RoadClass::Secondary => "secondary",
            RoadClass::Residential => "residential",
            RoadClass::Service => "service",
            RoadClass::Roundabout => "roundabout",
            RoadClass::Unknown => "unknown",
        }
    }

    /// Ranking used when several candidate roads are returned for one
    /// coordinate: lower is more significant.
    #[must_use]
    pub(crate) fn priority(self) -> u8 {
        match self {
            RoadClass::Motorway => 0,
            RoadClass::Primary => 1,
            RoadClass::Secondary => 2,
            RoadClass::Roundabout => 3,
            RoadClass::Residential => 4,
            RoadClass::Service => 5,
            RoadClass::Unknown => 6,
        }
    }
}

impl std::fmt::Display for RoadClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn motorway_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // M6, m42, and A-road-numbered motorways like A1(M).
    RE.get_or_init(|| Regex::new(r"^(?:[Mm]\d+|[Aa]\d+\(M\))").expect("static pattern"))
}

fn a_road_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[Aa]\d+").expect("static pattern"))
}

fn b_road_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[Bb]\d+").expect("static pattern"))
}

/// Classifies a road from its provider category tags and display name.
///
/// Tag rules take priority; the name patterns only apply when the tags are
/// absent or unrecognized. A `junction=roundabout` tag wins over the highway
/// class, matching how mapping data marks roundabout segments.
#[must_use]
pub fn classify_road(
    highway_tag: Option<&str>,
    junction_tag: Option<&str>,
    name: Option<&str>,
) -> RoadClass {
    if junction_tag.is_some_and(|j| j.eq_ignore_ascii_case("roundabout")) {
        return RoadClass::Roundabout;
    }

    if let Some(tag) = highway_tag {
        match tag.to_ascii_lowercase().as_str() {
            "motorway" | "motorway_link" => return RoadClass::Motorway,
            "trunk" | "trunk_link" | "primary" | "primary_link" => return RoadClass::Primary,
            "secondary" | "secondary_link" | "tertiary" | "tertiary_link" => {
                return RoadClass::Secondary;
            }
            "residential" | "living_street" | "unclassified" | "pedestrian" | "track" => {
                return RoadClass::Residential;
            }
            "service" => return RoadClass::Service,
            _ => {}
        }
    }

    if let Some(name) = name {
        let name = name.trim();
        if motorway_name().is_match(name) {
            return RoadClass::Motorway;
        }
        if a_road_name().is_match(name) {
            return RoadClass::Primary;
        }
        if b_road_name().is_match(name) {
            return RoadClass::Secondary;
        }
        if name.to_ascii_lowercase().contains("roundabout") {
            return RoadClass::Roundabout;
        }
    }

    RoadClass::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_rules_cover_the_taxonomy() {
        assert_eq!(
            classify_road(Some("motorway"), None, None),
            RoadClass::Motorway
        );
        assert_eq!(
            classify_road(Some("motorway_link"), None, None),
            RoadClass::Motorway
        );
        assert_eq!(classify_road(Some("trunk"), None, None), RoadClass::Primary);
        assert_eq!(
            classify_road(Some("primary"), None, None),
            RoadClass::Primary
        );
        assert_eq!(
            classify_road(Some("tertiary"), None, None),
            RoadClass::Secondary
        );
        assert_eq!(
            classify_road(Some("residential"), None, None),
            RoadClass::Residential
        );
        assert_eq!(
            classify_road(Some("service"), None, None),
            RoadClass::Service
        );
    }

    #[test]
    fn roundabout_junction_wins_over_highway_tag() {
        assert_eq!(
            classify_road(Some("primary"), Some("roundabout"), Some("A38")),
            RoadClass::Roundabout
        );
    }

    #[test]
    fn name_patterns_apply_when_tags_are_absent() {
        assert_eq!(classify_road(None, None, Some("M6")), RoadClass::Motorway);
        assert_eq!(classify_road(None, None, Some("m42")), RoadClass::Motorway);
        assert_eq!(
            classify_road(None, None, Some("A1(M)")),
            RoadClass::Motorway
        );
        assert_eq!(classify_road(None, None, Some("A38")), RoadClass::Primary);
        assert_eq!(
            classify_road(None, None, Some("B4128")),
            RoadClass::Secondary
        );
        assert_eq!(
            classify_road(None, None, Some("Mitchell Roundabout")),
            RoadClass::Roundabout
        );
    }

    #[test]
    fn tag_rules_take_priority_over_name_patterns() {
        // The tag says residential even though the name looks like an M-road.
        assert_eq!(
            classify_road(Some("residential"), None, Some("M1 Cottages")),
            RoadClass::Residential
        );
    }

    #[test]
    fn unrecognized_tags_fall_through_to_the_name() {
        assert_eq!(
            classify_road(Some("cycleway"), None, Some("A5")),
            RoadClass::Primary
        );
    }

    #[test]
    fn no_signal_is_unknown() {
        assert_eq!(classify_road(None, None, None), RoadClass::Unknown);
        assert_eq!(
            classify_road(None, None, Some("High Street")),
            RoadClass::Unknown
        );
        assert_eq!(classify_road(Some("proposed"), None, None), RoadClass::Unknown);
    }

    #[test]
    fn classification_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(
                classify_road(Some("secondary"), None, Some("B500")),
                RoadClass::Secondary
            );
        }
    }
}
