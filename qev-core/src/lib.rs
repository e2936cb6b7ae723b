//! QeV core library - Quality of Environmental Life scoring for addresses

// Global invariants enforced in this crate:
// - Scoring is a pure function of typed inputs, configuration and timestamp
// - No global mutable state; configuration is immutable once validated
// - Normalized scores and the composite score always lie in [0, 1]
// - Missing data lowers completeness, it is never scored as zero
// - Invalid inputs reject the whole request; no partial results

pub mod air;
pub mod breakpoints;
pub mod calculator;
pub mod category;
pub mod config;
pub mod error;
pub mod green;
pub mod inputs;
pub mod normalize;
pub mod report;
pub mod result;
pub mod scoring;
pub mod service;
pub mod traffic;

pub use calculator::{calculate_qev, QevCalculator};
pub use category::{CategoryBoundaries, QevCategory};
pub use config::ResolvedConfig;
pub use error::{ConfigError, QevError, ValidationError};
pub use inputs::{AirQualityData, GreenSpaceData, Pollutant, TrafficCounts, TrafficData};
pub use report::{render_json, render_text, AddressReport};
pub use result::{Dimension, QevInputs, QevResult};
pub use scoring::{DimensionWeights, Preset, ScoringConfig};
pub use service::{AddressRequest, QevService};

/// Score requests with a resolved configuration
pub fn score_requests(
    requests: &[AddressRequest],
    resolved: &ResolvedConfig,
) -> Result<Vec<AddressReport>, QevError> {
    let calculator = QevCalculator::new(resolved.scoring.clone())?;
    let service = QevService::new(calculator, resolved.preset);
    requests.iter().map(|r| service.score(r)).collect()
}
