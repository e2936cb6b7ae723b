//! Error types for scoring
//!
//! Two failure families exist:
//! - `ValidationError`: an input lies outside its physical domain. The whole
//!   calculation is rejected; no partial score is produced.
//! - `ConfigError`: the scoring configuration is unusable. Raised when a
//!   `ScoringConfig` is built or validated, never per request.
//!
//! Missing data is not an error. It is absorbed by the calculator and shows up
//! only as lower `data_completeness` / `confidence_level`, except when no
//! dimension carries real data at all (`QevError::InsufficientData`).

use thiserror::Error;

/// An input value outside its physically valid domain
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid {field}: {value} ({reason})")]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `air.no2`
    pub field: &'static str,
    /// The rejected value
    pub value: f64,
    /// What the value violated
    pub reason: &'static str,
}

impl ValidationError {
    pub fn new(field: &'static str, value: f64, reason: &'static str) -> Self {
        ValidationError {
            field,
            value,
            reason,
        }
    }
}

/// Unusable scoring configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("normalization bounds for {dimension} are degenerate: min {min}, max {max}")]
    DegenerateBounds {
        dimension: &'static str,
        min: f64,
        max: f64,
    },

    #[error("breakpoint table for {pollutant} is empty")]
    EmptyBreakpoints { pollutant: &'static str },

    #[error("breakpoint table for {pollutant} is malformed at band {band}: {reason}")]
    MalformedBreakpoints {
        pollutant: &'static str,
        band: usize,
        reason: &'static str,
    },

    #[error("dimension weights must sum to 1.0 (got {sum})")]
    WeightSum { sum: f64 },

    #[error("weight {name} must be a non-negative finite number (got {value})")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("category boundaries must be strictly increasing within (0, 1): {boundaries:?}")]
    CategoryBoundaries { boundaries: [f64; 4] },

    #[error("green-space threshold {name} is invalid: {value}")]
    GreenThreshold { name: &'static str, value: f64 },

    #[error("default traffic estimate {class} must be non-negative (got {value})")]
    DefaultTraffic { class: &'static str, value: i64 },

    #[error("unknown preset '{0}' (expected one of: health-burden, metascore)")]
    UnknownPreset(String),

    #[error("unknown pollutant '{0}' (expected one of: no2, pm25, pm10, o3, so2)")]
    UnknownPollutant(String),
}

/// Any failure of a scoring request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QevError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No dimension carries real data; a score would be fabricated
    #[error("insufficient data: no air, traffic or green-space measurements available")]
    InsufficientData,
}
