//! Traffic nuisance sub-index (I_Traffic)
//!
//! I_Traffic = light × w_light + utility × w_utility + heavy × w_heavy
//!
//! Weights express per-vehicle emission/nuisance burden relative to a
//! passenger car. When counts are missing, a road-class estimate or the
//! global fallback estimate is used instead of zero.

use crate::error::ConfigError;
use crate::inputs::TrafficCounts;
use serde::{Deserialize, Serialize};

/// Per-class nuisance weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficWeights {
    pub light: f64,
    pub utility: f64,
    pub heavy: f64,
}

impl TrafficWeights {
    /// EMEP/EEA 2019 emission-equivalent factors (canonical)
    pub const EMISSION_BURDEN: TrafficWeights = TrafficWeights {
        light: 1.0,
        utility: 3.2,
        heavy: 12.5,
    };

    /// Rounded passenger-car-unit factors
    pub const PASSENGER_CAR_UNITS: TrafficWeights = TrafficWeights {
        light: 1.0,
        utility: 3.0,
        heavy: 10.0,
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("traffic_weights.light", self.light),
            ("traffic_weights.utility", self.utility),
            ("traffic_weights.heavy", self.heavy),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }
}

impl Default for TrafficWeights {
    fn default() -> Self {
        TrafficWeights::EMISSION_BURDEN
    }
}

/// Fallback when nothing is known about traffic at an address (vehicles/hour).
///
/// Matches a tertiary urban street; using it instead of zero keeps addresses
/// without data from scoring as traffic-free.
pub const DEFAULT_TRAFFIC_ESTIMATE: TrafficCounts = TrafficCounts {
    light: 100,
    utility: 20,
    heavy: 5,
};

/// Compute I_Traffic in nuisance units
pub fn calculate_traffic_index(counts: &TrafficCounts, weights: &TrafficWeights) -> f64 {
    let index = counts.light as f64 * weights.light
        + counts.utility as f64 * weights.utility
        + counts.heavy as f64 * weights.heavy;
    log::debug!(
        "I_Traffic = {:.1} ({}/{}/{} veh/h)",
        index,
        counts.light,
        counts.utility,
        counts.heavy
    );
    index
}

/// OpenStreetMap `highway` classes with a traffic estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadClass {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    LivingStreet,
    Pedestrian,
    Service,
    Unclassified,
}

impl RoadClass {
    /// Map an OSM `highway` tag; unknown tags are treated as unclassified
    pub fn from_osm(tag: &str) -> RoadClass {
        match tag.trim().to_ascii_lowercase().as_str() {
            "motorway" | "motorway_link" => RoadClass::Motorway,
            "trunk" | "trunk_link" => RoadClass::Trunk,
            "primary" | "primary_link" => RoadClass::Primary,
            "secondary" | "secondary_link" => RoadClass::Secondary,
            "tertiary" | "tertiary_link" => RoadClass::Tertiary,
            "residential" => RoadClass::Residential,
            "living_street" => RoadClass::LivingStreet,
            "pedestrian" => RoadClass::Pedestrian,
            "service" => RoadClass::Service,
            _ => RoadClass::Unclassified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoadClass::Motorway => "motorway",
            RoadClass::Trunk => "trunk",
            RoadClass::Primary => "primary",
            RoadClass::Secondary => "secondary",
            RoadClass::Tertiary => "tertiary",
            RoadClass::Residential => "residential",
            RoadClass::LivingStreet => "living_street",
            RoadClass::Pedestrian => "pedestrian",
            RoadClass::Service => "service",
            RoadClass::Unclassified => "unclassified",
        }
    }

    /// Typical two-lane urban flow in vehicles/hour (European averages)
    pub fn base_counts(&self) -> TrafficCounts {
        let (light, utility, heavy) = match self {
            RoadClass::Motorway => (800, 120, 60),
            RoadClass::Trunk => (500, 80, 30),
            RoadClass::Primary => (300, 50, 15),
            RoadClass::Secondary => (200, 40, 10),
            RoadClass::Tertiary => (100, 20, 5),
            RoadClass::Residential => (50, 10, 2),
            RoadClass::LivingStreet => (10, 2, 0),
            RoadClass::Pedestrian => (0, 0, 0),
            RoadClass::Service => (30, 8, 1),
            RoadClass::Unclassified => (60, 12, 3),
        };
        TrafficCounts {
            light,
            utility,
            heavy,
        }
    }
}

/// Flow multiplier relative to a two-lane road; an unknown lane count is 1.0
pub fn lane_multiplier(lanes: Option<u32>) -> f64 {
    match lanes {
        None | Some(2) => 1.0,
        Some(1) => 0.6,
        Some(3) => 1.3,
        Some(4) => 1.6,
        Some(5) => 1.8,
        Some(6) => 2.0,
        Some(n) => (n as f64 / 2.0).min(2.5),
    }
}

/// Estimate hourly counts from the nearest road's class and lane count
pub fn estimate_from_road(class: RoadClass, lanes: Option<u32>) -> TrafficCounts {
    let base = class.base_counts();
    let multiplier = lane_multiplier(lanes);
    // Truncation toward zero, as integer vehicle counts
    let scale = |count: i64| (count as f64 * multiplier) as i64;
    TrafficCounts {
        light: scale(base.light),
        utility: scale(base.utility),
        heavy: scale(base.heavy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_sum_with_canonical_weights() {
        let index = calculate_traffic_index(&DEFAULT_TRAFFIC_ESTIMATE, &TrafficWeights::default());
        // 100 + 20 × 3.2 + 5 × 12.5
        assert!((index - 226.5).abs() < 1e-9);
    }

    #[test]
    fn weighted_sum_with_pcu_weights() {
        let index = calculate_traffic_index(
            &DEFAULT_TRAFFIC_ESTIMATE,
            &TrafficWeights::PASSENGER_CAR_UNITS,
        );
        assert_eq!(index, 210.0);
    }

    #[test]
    fn heavy_vehicles_dominate() {
        let weights = TrafficWeights::default();
        let cars = TrafficCounts {
            light: 10,
            utility: 0,
            heavy: 0,
        };
        let trucks = TrafficCounts {
            light: 0,
            utility: 0,
            heavy: 10,
        };
        assert!(calculate_traffic_index(&trucks, &weights) > calculate_traffic_index(&cars, &weights));
    }

    #[test]
    fn rejects_negative_weight() {
        let weights = TrafficWeights {
            heavy: -1.0,
            ..TrafficWeights::default()
        };
        assert!(matches!(
            weights.validate(),
            Err(ConfigError::InvalidWeight {
                name: "traffic_weights.heavy",
                ..
            })
        ));
    }

    #[test]
    fn road_class_from_osm_tags() {
        assert_eq!(RoadClass::from_osm("primary"), RoadClass::Primary);
        assert_eq!(RoadClass::from_osm("Trunk_Link"), RoadClass::Trunk);
        assert_eq!(RoadClass::from_osm("track"), RoadClass::Unclassified);
    }

    #[test]
    fn lanes_scale_estimate() {
        assert_eq!(
            estimate_from_road(RoadClass::Primary, Some(4)),
            TrafficCounts {
                light: 480,
                utility: 80,
                heavy: 24
            }
        );
        assert_eq!(
            estimate_from_road(RoadClass::Residential, Some(1)),
            TrafficCounts {
                light: 30,
                utility: 6,
                heavy: 1
            }
        );
        assert_eq!(
            estimate_from_road(RoadClass::Tertiary, None),
            DEFAULT_TRAFFIC_ESTIMATE
        );
    }

    #[test]
    fn wide_roads_cap_multiplier() {
        assert_eq!(lane_multiplier(Some(8)), 2.5);
        assert_eq!(lane_multiplier(Some(7)), 2.5);
        assert_eq!(lane_multiplier(Some(12)), 2.5);
    }

    #[test]
    fn zero_lanes_carry_no_traffic() {
        assert_eq!(lane_multiplier(Some(0)), 0.0);
        assert_eq!(lane_multiplier(None), 1.0);
        assert_eq!(
            estimate_from_road(RoadClass::Primary, Some(0)),
            TrafficCounts {
                light: 0,
                utility: 0,
                heavy: 0
            }
        );
    }
}
