//! QeV aggregation
//!
//! Pipeline per request: validate inputs → sub-indices → normalization →
//! weighted sum → category.
//!
//! Missing data policy:
//! - air or green without any value is excluded and the remaining weights are
//!   rescaled to sum to 1
//! - traffic without any count uses the configured default estimate and stays
//!   in the sum, but does not count as real data
//! - when no dimension with a positive weight has real data the request
//!   fails with `QevError::InsufficientData`
//!
//! `confidence_level` is `data_completeness` squared. `field_coverage` refines
//! it with the share of fields supplied inside each dimension.
//!
//! The calculator holds only an immutable `ScoringConfig`; identical inputs
//! and timestamp always yield identical results.

use crate::air::calculate_air_index;
use crate::error::{ConfigError, QevError};
use crate::green::calculate_green_index;
use crate::inputs::{AirQualityData, GreenSpaceData, TrafficData};
use crate::normalize::normalize_within;
use crate::result::{
    Dimension, NormalizedScores, QevInputs, QevResult, SubIndices, TrafficSource,
};
use crate::scoring::{DimensionWeights, Preset, ScoringConfig};
use crate::traffic::calculate_traffic_index;
use chrono::{DateTime, Utc};

/// Scores addresses under one validated configuration
#[derive(Debug, Clone)]
pub struct QevCalculator {
    config: ScoringConfig,
}

impl QevCalculator {
    /// Validate `config` and build a calculator around it
    pub fn new(config: ScoringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(QevCalculator { config })
    }

    pub fn with_preset(preset: Preset) -> Self {
        QevCalculator {
            config: preset.config(),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score inputs, stamping the result with the current time
    pub fn calculate(&self, inputs: &QevInputs) -> Result<QevResult, QevError> {
        self.calculate_at(inputs, Utc::now())
    }

    /// Score inputs with an explicit timestamp
    pub fn calculate_at(
        &self,
        inputs: &QevInputs,
        calculated_at: DateTime<Utc>,
    ) -> Result<QevResult, QevError> {
        inputs.air.validate()?;
        inputs.traffic.validate()?;
        inputs.green.validate()?;

        let config = &self.config;

        let air_index = calculate_air_index(&inputs.air, &config.breakpoints);
        let green_index = calculate_green_index(&inputs.green, &config.green);

        let traffic_source = match inputs.traffic.present_fields() {
            0 => TrafficSource::DefaultEstimate,
            TrafficData::FIELD_COUNT => TrafficSource::Measured,
            _ => TrafficSource::Partial,
        };
        if traffic_source == TrafficSource::DefaultEstimate {
            log::warn!(
                "no traffic counts; using default estimate {}/{}/{} veh/h",
                config.default_traffic.light,
                config.default_traffic.utility,
                config.default_traffic.heavy
            );
        }
        let traffic_counts = inputs.traffic.or_counts(&config.default_traffic);
        let traffic_raw = calculate_traffic_index(&traffic_counts, &config.traffic_weights);

        let real = [
            air_index.is_some(),
            traffic_source.is_real(),
            green_index.is_some(),
        ];
        if !real.iter().any(|r| *r) {
            return Err(QevError::InsufficientData);
        }
        let missing_dimensions: Vec<Dimension> = Dimension::ALL
            .into_iter()
            .zip(real)
            .filter(|(_, r)| !r)
            .map(|(d, _)| d)
            .collect();
        for dimension in &missing_dimensions {
            log::warn!("no real data for {} dimension", dimension);
        }

        let bounds = &config.bounds;
        let scores = NormalizedScores {
            air: air_index
                .as_ref()
                .map(|a| normalize_within(a.raw, &bounds.air, true, "air"))
                .transpose()?,
            traffic: normalize_within(traffic_raw, &bounds.traffic, true, "traffic")?,
            green: green_index
                .as_ref()
                .map(|g| normalize_within(g.raw, &bounds.green, false, "green"))
                .transpose()?,
        };

        let applied_weights = applied_weights(&config.weights, &scores, traffic_source)?;
        let qev_score = (applied_weights.air * scores.air.unwrap_or(0.0)
            + applied_weights.traffic * scores.traffic
            + applied_weights.green * scores.green.unwrap_or(0.0))
        .clamp(0.0, 1.0);
        let category = config.categories.classify(qev_score);

        let real_count = real.iter().filter(|r| **r).count();
        let data_completeness = real_count as f64 / 3.0;
        let confidence_level = confidence_level(data_completeness);
        let field_coverage = field_coverage(&inputs.air, &inputs.traffic, &inputs.green);

        log::debug!(
            "QeV = {:.3} ({}), completeness {:.2}, confidence {:.2}, field coverage {:.2}",
            qev_score,
            category,
            data_completeness,
            confidence_level,
            field_coverage
        );

        Ok(QevResult {
            inputs: *inputs,
            traffic_counts,
            traffic_source,
            sub_indices: SubIndices {
                air: air_index,
                traffic: traffic_raw,
                green: green_index,
            },
            scores,
            weights: config.weights,
            applied_weights,
            qev_score,
            category,
            data_completeness,
            confidence_level,
            field_coverage,
            missing_dimensions,
            calculated_at,
        })
    }
}

impl Default for QevCalculator {
    fn default() -> Self {
        QevCalculator::with_preset(Preset::default())
    }
}

/// Rescale configured weights over the dimensions that have a score
fn applied_weights(
    weights: &DimensionWeights,
    scores: &NormalizedScores,
    traffic_source: TrafficSource,
) -> Result<DimensionWeights, QevError> {
    let air = if scores.air.is_some() { weights.air } else { 0.0 };
    let traffic = weights.traffic;
    let green = if scores.green.is_some() {
        weights.green
    } else {
        0.0
    };
    // Real data must carry weight; a defaulted traffic estimate alone is not a score
    let real_traffic = if traffic_source.is_real() { traffic } else { 0.0 };
    if air + real_traffic + green <= 0.0 {
        return Err(QevError::InsufficientData);
    }
    let total = air + traffic + green;
    Ok(DimensionWeights {
        air: air / total,
        traffic: traffic / total,
        green: green / total,
    })
}

/// Strictly increasing in completeness: 0, 1/9, 4/9, 1
fn confidence_level(data_completeness: f64) -> f64 {
    data_completeness * data_completeness
}

/// Mean field coverage per dimension; defaulted traffic covers nothing.
///
/// Never exceeds `data_completeness` and equals it when every present
/// dimension is fully populated.
fn field_coverage(air: &AirQualityData, traffic: &TrafficData, green: &GreenSpaceData) -> f64 {
    let coverage = |present: usize, total: usize| present as f64 / total as f64;
    (coverage(air.present_fields(), AirQualityData::FIELD_COUNT)
        + coverage(traffic.present_fields(), TrafficData::FIELD_COUNT)
        + coverage(green.present_fields(), GreenSpaceData::FIELD_COUNT))
        / 3.0
}

/// Score one address with the default configuration and custom weights.
///
/// The result is stamped with `calculated_at`, so identical arguments give
/// identical results.
pub fn calculate_qev(
    air: &AirQualityData,
    traffic: &TrafficData,
    green: &GreenSpaceData,
    weights: &DimensionWeights,
    calculated_at: DateTime<Utc>,
) -> Result<QevResult, QevError> {
    let config = ScoringConfig {
        weights: *weights,
        ..ScoringConfig::default()
    };
    let calculator = QevCalculator::new(config)?;
    calculator.calculate_at(
        &QevInputs {
            air: *air,
            traffic: *traffic,
            green: *green,
        },
        calculated_at,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::QevCategory;
    use crate::inputs::Pollutant;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 14, 9, 0, 0).unwrap()
    }

    fn scenario_one() -> QevInputs {
        QevInputs {
            air: AirQualityData {
                no2: Some(19.6),
                pm25: Some(12.0),
                pm10: Some(15.7),
                ..Default::default()
            },
            traffic: TrafficData::counts(100, 20, 5),
            green: GreenSpaceData::new(40, 0.0, 999.0),
        }
    }

    #[test]
    fn urban_scenario_scores_good() {
        let result = QevCalculator::default()
            .calculate_at(&scenario_one(), at())
            .unwrap();

        let air = result.sub_indices.air.as_ref().unwrap();
        assert!((air.raw - 2.4).abs() < 1e-9);
        assert!((result.scores.air.unwrap() - 0.8444).abs() < 1e-3);
        assert!((result.scores.traffic - 0.9547).abs() < 1e-3);
        assert!((result.scores.green.unwrap() - 1.0 / 3.0).abs() < 1e-9);
        assert!((result.qev_score - 0.744).abs() < 2e-3);
        assert_eq!(result.category, QevCategory::Good);
        assert_eq!(result.data_completeness, 1.0);
        assert_eq!(result.traffic_source, TrafficSource::Measured);
        assert!(result.is_complete());
    }

    #[test]
    fn field_coverage_reflects_missing_pollutants() {
        let result = QevCalculator::default()
            .calculate_at(&scenario_one(), at())
            .unwrap();
        // 3 of 5 pollutants, full traffic and green
        assert!((result.field_coverage - (0.6 + 1.0 + 1.0) / 3.0).abs() < 1e-12);
        assert!(result.field_coverage <= result.data_completeness);
        // Sparse pollutants do not move confidence, only completeness does
        assert_eq!(result.confidence_level, 1.0);
    }

    #[test]
    fn confidence_follows_completeness() {
        let calculator = QevCalculator::default();
        let full = calculator.calculate_at(&scenario_one(), at()).unwrap();
        let no_green = calculator
            .calculate_at(
                &QevInputs {
                    green: GreenSpaceData::default(),
                    ..scenario_one()
                },
                at(),
            )
            .unwrap();
        let air_only = calculator
            .calculate_at(
                &QevInputs {
                    air: scenario_one().air,
                    ..QevInputs::default()
                },
                at(),
            )
            .unwrap();

        assert_eq!(full.confidence_level, 1.0);
        assert!((no_green.confidence_level - 4.0 / 9.0).abs() < 1e-12);
        assert!((air_only.confidence_level - 1.0 / 9.0).abs() < 1e-12);
        assert!(air_only.confidence_level < no_green.confidence_level);
    }

    #[test]
    fn missing_green_renormalizes_weights() {
        let inputs = QevInputs {
            green: GreenSpaceData::default(),
            ..scenario_one()
        };
        let result = QevCalculator::default().calculate_at(&inputs, at()).unwrap();

        assert!((result.data_completeness - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.missing_dimensions, vec![Dimension::Green]);
        assert_eq!(result.applied_weights.green, 0.0);
        assert!((result.applied_weights.air - 2.0 / 3.0).abs() < 1e-12);
        assert!((result.applied_weights.traffic - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.scores.green, None);
    }

    #[test]
    fn missing_traffic_uses_default_estimate() {
        let inputs = QevInputs {
            traffic: TrafficData::default(),
            ..scenario_one()
        };
        let result = QevCalculator::default().calculate_at(&inputs, at()).unwrap();
        let measured = QevCalculator::default()
            .calculate_at(&scenario_one(), at())
            .unwrap();

        assert_eq!(result.traffic_source, TrafficSource::DefaultEstimate);
        assert_eq!(result.scores.traffic, measured.scores.traffic);
        assert_eq!(result.qev_score, measured.qev_score);
        assert!((result.data_completeness - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.missing_dimensions, vec![Dimension::Traffic]);
    }

    #[test]
    fn partial_traffic_counts_as_real() {
        let inputs = QevInputs {
            traffic: TrafficData {
                heavy_vehicles: Some(40),
                ..Default::default()
            },
            ..scenario_one()
        };
        let result = QevCalculator::default().calculate_at(&inputs, at()).unwrap();
        assert_eq!(result.traffic_source, TrafficSource::Partial);
        assert_eq!(result.traffic_counts.light, 100);
        assert_eq!(result.traffic_counts.heavy, 40);
        assert_eq!(result.data_completeness, 1.0);
    }

    #[test]
    fn no_data_is_refused() {
        let result = QevCalculator::default().calculate_at(&QevInputs::default(), at());
        assert_eq!(result, Err(QevError::InsufficientData));
    }

    #[test]
    fn invalid_input_is_rejected_whole() {
        let inputs = QevInputs {
            air: AirQualityData::default().with(Pollutant::No2, -4.0),
            ..scenario_one()
        };
        match QevCalculator::default().calculate_at(&inputs, at()) {
            Err(QevError::Validation(err)) => assert_eq!(err.field, "air.no2"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn calculator_rejects_invalid_config() {
        let config = ScoringConfig {
            weights: DimensionWeights {
                air: 0.5,
                traffic: 0.5,
                green: 0.5,
            },
            ..ScoringConfig::default()
        };
        assert!(QevCalculator::new(config).is_err());
    }

    #[test]
    fn zero_weighted_data_only_is_insufficient() {
        let calculator = QevCalculator::new(ScoringConfig {
            weights: DimensionWeights {
                air: 1.0,
                traffic: 0.0,
                green: 0.0,
            },
            ..ScoringConfig::default()
        })
        .unwrap();
        let inputs = QevInputs {
            green: GreenSpaceData::new(5, 40.0, 100.0),
            ..QevInputs::default()
        };
        assert_eq!(
            calculator.calculate_at(&inputs, at()),
            Err(QevError::InsufficientData)
        );
    }

    #[test]
    fn defaulted_traffic_alone_cannot_carry_the_score() {
        let calculator = QevCalculator::new(ScoringConfig {
            weights: DimensionWeights {
                air: 0.0,
                traffic: 0.5,
                green: 0.5,
            },
            ..ScoringConfig::default()
        })
        .unwrap();
        let inputs = QevInputs {
            air: scenario_one().air,
            ..QevInputs::default()
        };
        assert_eq!(
            calculator.calculate_at(&inputs, at()),
            Err(QevError::InsufficientData)
        );

        // Measured traffic under the same weights is a real score
        let measured = QevInputs {
            traffic: TrafficData::counts(100, 20, 5),
            ..inputs
        };
        let result = calculator.calculate_at(&measured, at()).unwrap();
        assert_eq!(result.applied_weights.traffic, 1.0);
    }

    #[test]
    fn free_function_is_bit_identical_across_calls() {
        let inputs = scenario_one();
        let score = || {
            calculate_qev(
                &inputs.air,
                &inputs.traffic,
                &inputs.green,
                &DimensionWeights::HEALTH_BURDEN,
                at(),
            )
            .unwrap()
        };
        let first = score();
        let second = score();
        assert_eq!(first, second);
        assert_eq!(first.qev_score.to_bits(), second.qev_score.to_bits());
        assert_eq!(first.calculated_at, at());
    }

    #[test]
    fn free_function_uses_given_weights() {
        let inputs = scenario_one();
        let result = calculate_qev(
            &inputs.air,
            &inputs.traffic,
            &inputs.green,
            &DimensionWeights::METASCORE,
            at(),
        )
        .unwrap();
        assert_eq!(result.weights, DimensionWeights::METASCORE);
        // Traffic weights stay at the canonical factors
        assert!((result.sub_indices.traffic - 226.5).abs() < 1e-9);
    }
}
