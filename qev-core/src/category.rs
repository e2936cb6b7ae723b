//! QeV categories
//!
//! Five ordinal bands over [0, 1]. Each boundary belongs to the band above it.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// QeV category, ordered from worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QevCategory {
    VeryPoor,  // < 0.2
    Poor,      // 0.2-0.4
    Moderate,  // 0.4-0.6
    Good,      // 0.6-0.8
    Excellent, // >= 0.8
}

impl QevCategory {
    pub const ALL: [QevCategory; 5] = [
        QevCategory::VeryPoor,
        QevCategory::Poor,
        QevCategory::Moderate,
        QevCategory::Good,
        QevCategory::Excellent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QevCategory::VeryPoor => "very_poor",
            QevCategory::Poor => "poor",
            QevCategory::Moderate => "moderate",
            QevCategory::Good => "good",
            QevCategory::Excellent => "excellent",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            QevCategory::VeryPoor => "Very Poor",
            QevCategory::Poor => "Poor",
            QevCategory::Moderate => "Moderate",
            QevCategory::Good => "Good",
            QevCategory::Excellent => "Excellent",
        }
    }

    pub fn interpretation(&self) -> &'static str {
        match self {
            QevCategory::VeryPoor => {
                "Very unfavorable environment with significant health risks. Urgent action needed."
            }
            QevCategory::Poor => {
                "Unfavorable environment. Several factors can affect health and well-being."
            }
            QevCategory::Moderate => {
                "Average environment. Some risk factors are present and improvement is possible."
            }
            QevCategory::Good => {
                "Satisfactory environment. Environmental quality is good overall."
            }
            QevCategory::Excellent => {
                "Very favorable environment for health. Low pollution, little traffic and accessible green space."
            }
        }
    }
}

impl fmt::Display for QevCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower bounds of Poor, Moderate, Good and Excellent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryBoundaries(pub [f64; 4]);

impl Default for CategoryBoundaries {
    fn default() -> Self {
        CategoryBoundaries([0.2, 0.4, 0.6, 0.8])
    }
}

impl CategoryBoundaries {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = self.0;
        let in_range = b.iter().all(|v| v.is_finite() && *v > 0.0 && *v < 1.0);
        let increasing = b.windows(2).all(|w| w[0] < w[1]);
        if !in_range || !increasing {
            return Err(ConfigError::CategoryBoundaries { boundaries: b });
        }
        Ok(())
    }

    /// Category for a score; each boundary value belongs to the higher band
    pub fn classify(&self, score: f64) -> QevCategory {
        let [poor, moderate, good, excellent] = self.0;
        if score < poor {
            QevCategory::VeryPoor
        } else if score < moderate {
            QevCategory::Poor
        } else if score < good {
            QevCategory::Moderate
        } else if score < excellent {
            QevCategory::Good
        } else {
            QevCategory::Excellent
        }
    }
}
