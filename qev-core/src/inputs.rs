//! Typed measurement inputs
//!
//! These value objects are what the data-access layer hands to the scoring
//! core. Every field is optional: `Default` is the "unavailable" sentinel for
//! each dimension. `validate()` rejects values outside their physical domain;
//! absent values are never errors.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pollutants covered by the air sub-index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    No2,
    Pm25,
    Pm10,
    O3,
    So2,
}

impl Pollutant {
    pub const ALL: [Pollutant; 5] = [
        Pollutant::No2,
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::O3,
        Pollutant::So2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::No2 => "no2",
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::O3 => "o3",
            Pollutant::So2 => "so2",
        }
    }

    /// Field path used in validation errors
    pub fn field(&self) -> &'static str {
        match self {
            Pollutant::No2 => "air.no2",
            Pollutant::Pm25 => "air.pm25",
            Pollutant::Pm10 => "air.pm10",
            Pollutant::O3 => "air.o3",
            Pollutant::So2 => "air.so2",
        }
    }

    /// Upper plausibility limit in µg/m³.
    ///
    /// Roughly ten times the worst hourly values recorded in European cities;
    /// anything above is a unit or sensor error, not air.
    pub fn max_plausible(&self) -> f64 {
        match self {
            Pollutant::No2 => 2_000.0,
            Pollutant::Pm25 => 1_000.0,
            Pollutant::Pm10 => 2_000.0,
            Pollutant::O3 => 1_000.0,
            Pollutant::So2 => 2_500.0,
        }
    }

    pub fn parse(name: &str) -> Option<Pollutant> {
        match name.to_ascii_lowercase().as_str() {
            "no2" | "nitrogen_dioxide" => Some(Pollutant::No2),
            "pm25" | "pm2_5" | "pm2.5" => Some(Pollutant::Pm25),
            "pm10" => Some(Pollutant::Pm10),
            "o3" | "ozone" => Some(Pollutant::O3),
            "so2" | "sulphur_dioxide" => Some(Pollutant::So2),
            _ => None,
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-window concentrations (µg/m³) for one address
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AirQualityData {
    pub no2: Option<f64>,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub o3: Option<f64>,
    pub so2: Option<f64>,
}

impl AirQualityData {
    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::No2 => self.no2,
            Pollutant::Pm25 => self.pm25,
            Pollutant::Pm10 => self.pm10,
            Pollutant::O3 => self.o3,
            Pollutant::So2 => self.so2,
        }
    }

    pub fn set(&mut self, pollutant: Pollutant, value: Option<f64>) {
        let slot = match pollutant {
            Pollutant::No2 => &mut self.no2,
            Pollutant::Pm25 => &mut self.pm25,
            Pollutant::Pm10 => &mut self.pm10,
            Pollutant::O3 => &mut self.o3,
            Pollutant::So2 => &mut self.so2,
        };
        *slot = value;
    }

    /// Builder-style setter
    pub fn with(mut self, pollutant: Pollutant, value: f64) -> Self {
        self.set(pollutant, Some(value));
        self
    }

    /// Present pollutants in canonical order
    pub fn present(&self) -> impl Iterator<Item = (Pollutant, f64)> + '_ {
        Pollutant::ALL
            .into_iter()
            .filter_map(move |p| self.get(p).map(|v| (p, v)))
    }

    pub fn is_available(&self) -> bool {
        self.present().next().is_some()
    }

    pub fn present_fields(&self) -> usize {
        self.present().count()
    }

    pub const FIELD_COUNT: usize = 5;

    /// Time-window mean per pollutant.
    ///
    /// Missing or non-finite sample values are skipped; a pollutant without a
    /// single usable sample stays absent.
    pub fn from_samples<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = &'a AirQualityData>,
    {
        let mut sums = [0.0f64; 5];
        let mut counts = [0usize; 5];

        for sample in samples {
            for (i, pollutant) in Pollutant::ALL.iter().enumerate() {
                if let Some(v) = sample.get(*pollutant) {
                    if v.is_finite() {
                        sums[i] += v;
                        counts[i] += 1;
                    }
                }
            }
        }

        let mut mean = AirQualityData::default();
        for (i, pollutant) in Pollutant::ALL.iter().enumerate() {
            if counts[i] > 0 {
                mean.set(*pollutant, Some(sums[i] / counts[i] as f64));
            }
        }
        mean
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (pollutant, value) in self.present() {
            if !value.is_finite() {
                return Err(ValidationError::new(
                    pollutant.field(),
                    value,
                    "not a finite number",
                ));
            }
            if value < 0.0 {
                return Err(ValidationError::new(
                    pollutant.field(),
                    value,
                    "concentration cannot be negative",
                ));
            }
            if value > pollutant.max_plausible() {
                return Err(ValidationError::new(
                    pollutant.field(),
                    value,
                    "concentration above physically plausible limit",
                ));
            }
        }
        Ok(())
    }
}

/// Vehicle counts per hour for one address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrafficData {
    pub light_vehicles: Option<i64>,
    pub utility_vehicles: Option<i64>,
    pub heavy_vehicles: Option<i64>,
}

impl TrafficData {
    pub fn counts(light: i64, utility: i64, heavy: i64) -> Self {
        TrafficData {
            light_vehicles: Some(light),
            utility_vehicles: Some(utility),
            heavy_vehicles: Some(heavy),
        }
    }

    pub fn is_available(&self) -> bool {
        self.present_fields() > 0
    }

    pub fn present_fields(&self) -> usize {
        [self.light_vehicles, self.utility_vehicles, self.heavy_vehicles]
            .iter()
            .filter(|c| c.is_some())
            .count()
    }

    pub const FIELD_COUNT: usize = 3;

    /// Fill absent classes from `fallback`
    pub fn or_counts(&self, fallback: &TrafficCounts) -> TrafficCounts {
        TrafficCounts {
            light: self.light_vehicles.unwrap_or(fallback.light),
            utility: self.utility_vehicles.unwrap_or(fallback.utility),
            heavy: self.heavy_vehicles.unwrap_or(fallback.heavy),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, count) in [
            ("traffic.light_vehicles", self.light_vehicles),
            ("traffic.utility_vehicles", self.utility_vehicles),
            ("traffic.heavy_vehicles", self.heavy_vehicles),
        ] {
            if let Some(c) = count {
                if c < 0 {
                    return Err(ValidationError::new(
                        field,
                        c as f64,
                        "vehicle count cannot be negative",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Fully resolved vehicle counts, one per class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficCounts {
    pub light: i64,
    pub utility: i64,
    pub heavy: i64,
}

impl From<TrafficCounts> for TrafficData {
    fn from(c: TrafficCounts) -> Self {
        TrafficData::counts(c.light, c.utility, c.heavy)
    }
}

/// Green-space detection results for one address
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GreenSpaceData {
    pub trees_visible: Option<i64>,
    pub canopy_coverage_pct: Option<f64>,
    pub distance_to_green_space_m: Option<f64>,
}

impl GreenSpaceData {
    pub fn new(trees_visible: i64, canopy_coverage_pct: f64, distance_to_green_space_m: f64) -> Self {
        GreenSpaceData {
            trees_visible: Some(trees_visible),
            canopy_coverage_pct: Some(canopy_coverage_pct),
            distance_to_green_space_m: Some(distance_to_green_space_m),
        }
    }

    pub fn is_available(&self) -> bool {
        self.present_fields() > 0
    }

    pub fn present_fields(&self) -> usize {
        usize::from(self.trees_visible.is_some())
            + usize::from(self.canopy_coverage_pct.is_some())
            + usize::from(self.distance_to_green_space_m.is_some())
    }

    pub const FIELD_COUNT: usize = 3;

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(trees) = self.trees_visible {
            if trees < 0 {
                return Err(ValidationError::new(
                    "green.trees_visible",
                    trees as f64,
                    "tree count cannot be negative",
                ));
            }
        }
        if let Some(pct) = self.canopy_coverage_pct {
            if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                return Err(ValidationError::new(
                    "green.canopy_coverage_pct",
                    pct,
                    "percentage must be within [0, 100]",
                ));
            }
        }
        if let Some(distance) = self.distance_to_green_space_m {
            if !distance.is_finite() || distance < 0.0 {
                return Err(ValidationError::new(
                    "green.distance_to_green_space_m",
                    distance,
                    "distance must be a non-negative number of meters",
                ));
            }
        }
        Ok(())
    }
}
