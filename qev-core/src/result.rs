//! Score record produced by the calculator
//!
//! A `QevResult` is built once per request and never mutated. It carries the
//! inputs it was computed from so that it can be stored or serialized on its
//! own.

use crate::air::AirIndex;
use crate::category::QevCategory;
use crate::green::GreenIndex;
use crate::inputs::{AirQualityData, GreenSpaceData, TrafficCounts, TrafficData};
use crate::scoring::DimensionWeights;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three scored dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Air,
    Traffic,
    Green,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Air, Dimension::Traffic, Dimension::Green];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Air => "air",
            Dimension::Traffic => "traffic",
            Dimension::Green => "green",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed inputs for one address and time window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QevInputs {
    pub air: AirQualityData,
    pub traffic: TrafficData,
    pub green: GreenSpaceData,
}

/// Where the traffic counts used for I_Traffic came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficSource {
    /// All three classes supplied
    Measured,
    /// Some classes supplied, the rest filled from the default estimate
    Partial,
    /// No counts supplied; the default estimate was used
    DefaultEstimate,
}

impl TrafficSource {
    pub fn is_real(&self) -> bool {
        !matches!(self, TrafficSource::DefaultEstimate)
    }
}

/// Raw sub-indices; `None` where the dimension had no data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubIndices {
    pub air: Option<AirIndex>,
    pub traffic: f64,
    pub green: Option<GreenIndex>,
}

/// Normalized scores in [0, 1], 1 meaning favorable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedScores {
    pub air: Option<f64>,
    pub traffic: f64,
    pub green: Option<f64>,
}

/// Complete QeV score record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QevResult {
    pub inputs: QevInputs,
    /// Counts actually fed to the traffic index
    pub traffic_counts: TrafficCounts,
    pub traffic_source: TrafficSource,
    pub sub_indices: SubIndices,
    pub scores: NormalizedScores,
    /// Configured dimension weights
    pub weights: DimensionWeights,
    /// Weights after excluding dimensions without data (sum to 1)
    pub applied_weights: DimensionWeights,
    pub qev_score: f64,
    pub category: QevCategory,
    /// Fraction of the three dimensions backed by real data
    pub data_completeness: f64,
    /// `data_completeness` squared
    pub confidence_level: f64,
    /// Mean over the three dimensions of the share of fields supplied
    pub field_coverage: f64,
    pub missing_dimensions: Vec<Dimension>,
    pub calculated_at: DateTime<Utc>,
}

impl QevResult {
    pub fn is_complete(&self) -> bool {
        self.missing_dimensions.is_empty()
    }
}
