//! Immutable scoring configuration and presets
//!
//! A `ScoringConfig` carries every constant the calculators use. It is built
//! once (from a preset, optionally overridden by a config file), validated,
//! and then shared read-only; several configurations may coexist.

use crate::breakpoints::{belaqi_tables, BreakpointTable};
use crate::category::CategoryBoundaries;
use crate::error::ConfigError;
use crate::green::GreenThresholds;
use crate::inputs::{Pollutant, TrafficCounts};
use crate::normalize::NormalizationBounds;
use crate::traffic::{TrafficWeights, DEFAULT_TRAFFIC_ESTIMATE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Accepted deviation of the dimension weight sum from 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Weights of the three dimensions in the composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionWeights {
    pub air: f64,
    pub traffic: f64,
    pub green: f64,
}

impl DimensionWeights {
    pub const HEALTH_BURDEN: DimensionWeights = DimensionWeights {
        air: 0.50,
        traffic: 0.25,
        green: 0.25,
    };

    pub const METASCORE: DimensionWeights = DimensionWeights {
        air: 0.40,
        traffic: 0.30,
        green: 0.30,
    };

    pub fn sum(&self) -> f64 {
        self.air + self.traffic + self.green
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("weights.air", self.air),
            ("weights.traffic", self.traffic),
            ("weights.green", self.green),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(())
    }
}

impl Default for DimensionWeights {
    fn default() -> Self {
        DimensionWeights::HEALTH_BURDEN
    }
}

/// Normalization bounds per dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionBounds {
    /// Raw air index range, inverted when normalized
    pub air: NormalizationBounds,
    /// Nuisance units, inverted when normalized
    pub traffic: NormalizationBounds,
    pub green: NormalizationBounds,
}

impl Default for DimensionBounds {
    fn default() -> Self {
        DimensionBounds {
            air: NormalizationBounds::new(1.0, 10.0),
            traffic: NormalizationBounds::new(0.0, 5000.0),
            green: NormalizationBounds::new(0.0, 1.0),
        }
    }
}

impl DimensionBounds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.air.validate("air")?;
        self.traffic.validate("traffic")?;
        self.green.validate("green")
    }
}

/// Named weight regimes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Air 0.50, traffic 0.25, green 0.25; traffic 1.0/3.2/12.5
    #[default]
    HealthBurden,
    /// Air 0.40, traffic 0.30, green 0.30; traffic 1/3/10
    Metascore,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::HealthBurden, Preset::Metascore];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::HealthBurden => "health-burden",
            Preset::Metascore => "metascore",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Preset::HealthBurden => {
                "air-led weighting with emission-equivalent vehicle factors (default)"
            }
            Preset::Metascore => "balanced weighting with passenger-car-unit vehicle factors",
        }
    }

    pub fn from_name(name: &str) -> Result<Preset, ConfigError> {
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))
    }

    pub fn config(&self) -> ScoringConfig {
        let (weights, traffic_weights) = match self {
            Preset::HealthBurden => (
                DimensionWeights::HEALTH_BURDEN,
                TrafficWeights::EMISSION_BURDEN,
            ),
            Preset::Metascore => (
                DimensionWeights::METASCORE,
                TrafficWeights::PASSENGER_CAR_UNITS,
            ),
        };
        ScoringConfig {
            weights,
            traffic_weights,
            default_traffic: DEFAULT_TRAFFIC_ESTIMATE,
            green: GreenThresholds::default(),
            bounds: DimensionBounds::default(),
            categories: CategoryBoundaries::default(),
            breakpoints: belaqi_tables(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every constant the calculators need
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    pub weights: DimensionWeights,
    pub traffic_weights: TrafficWeights,
    /// Counts used when an address has no traffic data at all
    pub default_traffic: TrafficCounts,
    pub green: GreenThresholds,
    pub bounds: DimensionBounds,
    pub categories: CategoryBoundaries,
    pub breakpoints: BTreeMap<Pollutant, BreakpointTable>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Preset::default().config()
    }
}

impl ScoringConfig {
    /// Check every configuration rule; the first violation is returned
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.traffic_weights.validate()?;

        for (class, value) in [
            ("light", self.default_traffic.light),
            ("utility", self.default_traffic.utility),
            ("heavy", self.default_traffic.heavy),
        ] {
            if value < 0 {
                return Err(ConfigError::DefaultTraffic { class, value });
            }
        }

        self.green.validate()?;
        self.bounds.validate()?;
        self.categories.validate()?;

        for pollutant in Pollutant::ALL {
            match self.breakpoints.get(&pollutant) {
                Some(table) => table.validate(pollutant)?,
                None => {
                    return Err(ConfigError::EmptyBreakpoints {
                        pollutant: pollutant.as_str(),
                    })
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for preset in Preset::ALL {
            preset.config().validate().unwrap();
        }
    }

    #[test]
    fn default_is_health_burden() {
        let config = ScoringConfig::default();
        assert_eq!(config.weights, DimensionWeights::HEALTH_BURDEN);
        assert_eq!(config.traffic_weights, TrafficWeights::EMISSION_BURDEN);
        assert_eq!(config.default_traffic, DEFAULT_TRAFFIC_ESTIMATE);
    }

    #[test]
    fn preset_names_round_trip() {
        assert_eq!(Preset::from_name("metascore").unwrap(), Preset::Metascore);
        assert_eq!(
            Preset::from_name("Health-Burden").unwrap(),
            Preset::HealthBurden
        );
        assert!(matches!(
            Preset::from_name("balanced"),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let weights = DimensionWeights {
            air: 0.5,
            traffic: 0.3,
            green: 0.3,
        };
        assert!(matches!(
            weights.validate(),
            Err(ConfigError::WeightSum { .. })
        ));
    }

    #[test]
    fn tolerates_float_rounding_in_weight_sum() {
        let weights = DimensionWeights {
            air: 0.1 + 0.2,
            traffic: 0.3,
            green: 0.4,
        };
        weights.validate().unwrap();
    }

    #[test]
    fn rejects_missing_breakpoint_table() {
        let mut config = ScoringConfig::default();
        config.breakpoints.remove(&Pollutant::So2);
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyBreakpoints { pollutant: "so2" })
        );
    }

    #[test]
    fn rejects_degenerate_bounds() {
        let mut config = ScoringConfig::default();
        config.bounds.traffic = NormalizationBounds::new(0.0, 0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DegenerateBounds {
                dimension: "traffic",
                ..
            })
        ));
    }

    #[test]
    fn rejects_negative_default_traffic() {
        let mut config = ScoringConfig::default();
        config.default_traffic.heavy = -1;
        assert!(config.validate().is_err());
    }
}
