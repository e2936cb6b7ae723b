//! Min-max normalization onto [0, 1]

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Raw-value range for one dimension, serialized as `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct NormalizationBounds {
    pub min: f64,
    pub max: f64,
}

impl NormalizationBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        NormalizationBounds { min, max }
    }

    pub fn validate(&self, dimension: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.max <= self.min {
            return Err(ConfigError::DegenerateBounds {
                dimension,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl From<[f64; 2]> for NormalizationBounds {
    fn from(v: [f64; 2]) -> Self {
        NormalizationBounds::new(v[0], v[1])
    }
}

impl From<NormalizationBounds> for [f64; 2] {
    fn from(b: NormalizationBounds) -> Self {
        [b.min, b.max]
    }
}

/// Rescale `raw` into [0, 1] between `min` and `max`.
///
/// Values outside the bounds are clamped. With `invert`, the result is
/// `1 - score`, so that 1 always means favorable for dimensions where a high
/// raw value is harmful.
///
/// `min == max` (or `max < min`) has no meaningful scale and is reported as a
/// configuration error.
pub fn normalize(raw: f64, min: f64, max: f64, invert: bool) -> Result<f64, ConfigError> {
    let span = max - min;
    if !span.is_finite() || span <= 0.0 {
        return Err(ConfigError::DegenerateBounds {
            dimension: "normalization",
            min,
            max,
        });
    }
    let score = ((raw - min) / span).clamp(0.0, 1.0);
    Ok(if invert { 1.0 - score } else { score })
}

/// `normalize` over a bounds value, tagging errors with the dimension name
pub fn normalize_within(
    raw: f64,
    bounds: &NormalizationBounds,
    invert: bool,
    dimension: &'static str,
) -> Result<f64, ConfigError> {
    bounds.validate(dimension)?;
    normalize(raw, bounds.min, bounds.max, invert)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_points_map_to_zero_and_one() {
        assert_eq!(normalize(1.0, 1.0, 10.0, false).unwrap(), 0.0);
        assert_eq!(normalize(10.0, 1.0, 10.0, false).unwrap(), 1.0);
        assert_eq!(normalize(1.0, 1.0, 10.0, true).unwrap(), 1.0);
        assert_eq!(normalize(10.0, 1.0, 10.0, true).unwrap(), 0.0);
    }

    #[test]
    fn clamps_outside_bounds() {
        assert_eq!(normalize(-50.0, 0.0, 5000.0, false).unwrap(), 0.0);
        assert_eq!(normalize(9000.0, 0.0, 5000.0, false).unwrap(), 1.0);
        assert_eq!(normalize(9000.0, 0.0, 5000.0, true).unwrap(), 0.0);
    }

    #[test]
    fn midpoint() {
        assert_eq!(normalize(2500.0, 0.0, 5000.0, false).unwrap(), 0.5);
    }

    #[test]
    fn equal_bounds_are_a_config_error() {
        assert!(matches!(
            normalize(3.0, 2.0, 2.0, false),
            Err(ConfigError::DegenerateBounds { .. })
        ));
    }

    #[test]
    fn bounds_validation_names_dimension() {
        let err = NormalizationBounds::new(5.0, 1.0).validate("traffic").unwrap_err();
        assert!(err.to_string().contains("traffic"));
    }
}
