//! Pollutant breakpoint tables
//!
//! A table is an ordered list of contiguous concentration bands, each mapping
//! `[c_low, c_high)` linearly onto `[i_low, i_high]`, plus a ceiling index
//! returned for any concentration at or beyond the last band.
//!
//! Invariants (checked by `validate`):
//! - at least one band
//! - bands are contiguous and strictly widening (`c_high > c_low`)
//! - index ranges never decrease, within or across bands, up to the ceiling
//!
//! Together these make `interpolate` monotonically non-decreasing.

use crate::error::ConfigError;
use crate::inputs::Pollutant;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One concentration band, serialized as `[c_low, c_high, i_low, i_high]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BreakpointBand {
    pub c_low: f64,
    pub c_high: f64,
    pub i_low: f64,
    pub i_high: f64,
}

impl BreakpointBand {
    pub const fn new(c_low: f64, c_high: f64, i_low: f64, i_high: f64) -> Self {
        BreakpointBand {
            c_low,
            c_high,
            i_low,
            i_high,
        }
    }

    fn contains(&self, concentration: f64) -> bool {
        self.c_low <= concentration && concentration < self.c_high
    }

    fn interpolate(&self, concentration: f64) -> f64 {
        self.i_low
            + (concentration - self.c_low) * (self.i_high - self.i_low) / (self.c_high - self.c_low)
    }
}

impl From<[f64; 4]> for BreakpointBand {
    fn from(v: [f64; 4]) -> Self {
        BreakpointBand::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BreakpointBand> for [f64; 4] {
    fn from(b: BreakpointBand) -> Self {
        [b.c_low, b.c_high, b.i_low, b.i_high]
    }
}

/// Piecewise-linear concentration → index mapping for one pollutant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BreakpointTable {
    pub bands: Vec<BreakpointBand>,
    /// Index for concentrations at or above the last band's upper bound
    pub ceiling: f64,
}

impl BreakpointTable {
    /// Build a table from band upper bounds on a unit-step index scale.
    ///
    /// `upper_bounds[k]` closes the band that maps onto `[k, k + 1]`; the
    /// first band starts at zero.
    fn unit_steps(upper_bounds: &[f64], ceiling: f64) -> Self {
        let mut bands = Vec::with_capacity(upper_bounds.len());
        let mut c_low = 0.0;
        for (k, &c_high) in upper_bounds.iter().enumerate() {
            bands.push(BreakpointBand::new(c_low, c_high, k as f64, (k + 1) as f64));
            c_low = c_high;
        }
        BreakpointTable { bands, ceiling }
    }

    /// Map a concentration onto the index scale.
    ///
    /// Below the first band the first index is returned; at or above the last
    /// band the ceiling is returned.
    pub fn interpolate(&self, concentration: f64) -> f64 {
        let Some(first) = self.bands.first() else {
            return self.ceiling;
        };
        if concentration < first.c_low {
            return first.i_low;
        }
        self.bands
            .iter()
            .find(|band| band.contains(concentration))
            .map(|band| band.interpolate(concentration))
            .unwrap_or(self.ceiling)
    }

    /// Highest index this table can produce
    pub fn max_index(&self) -> f64 {
        self.ceiling
    }

    pub fn validate(&self, pollutant: Pollutant) -> Result<(), ConfigError> {
        let name = pollutant.as_str();
        if self.bands.is_empty() {
            return Err(ConfigError::EmptyBreakpoints { pollutant: name });
        }

        let malformed = |band: usize, reason: &'static str| ConfigError::MalformedBreakpoints {
            pollutant: name,
            band,
            reason,
        };

        let mut previous: Option<&BreakpointBand> = None;
        for (i, band) in self.bands.iter().enumerate() {
            let values = [band.c_low, band.c_high, band.i_low, band.i_high];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(malformed(i, "non-finite value"));
            }
            if band.c_high <= band.c_low {
                return Err(malformed(i, "upper concentration must exceed lower"));
            }
            if band.i_high < band.i_low {
                return Err(malformed(i, "index range decreases"));
            }
            if let Some(prev) = previous {
                if band.c_low != prev.c_high {
                    return Err(malformed(i, "band does not start where the previous one ends"));
                }
                if band.i_low < prev.i_high {
                    return Err(malformed(i, "index drops between bands"));
                }
            }
            previous = Some(band);
        }

        let last = self.bands.len() - 1;
        if !self.ceiling.is_finite() || self.ceiling < self.bands[last].i_high {
            return Err(malformed(last, "ceiling below the last band's index"));
        }
        Ok(())
    }
}

/// BelAQI-style tables for the five pollutants, index scale 0..10.
///
/// Band k (k = 1..9) covers the published class k and maps onto `[k-1, k]`;
/// anything at or above the class-10 threshold scores the ceiling of 10.
pub fn belaqi_tables() -> BTreeMap<Pollutant, BreakpointTable> {
    let mut tables = BTreeMap::new();
    tables.insert(
        Pollutant::No2,
        BreakpointTable::unit_steps(
            &[10.0, 20.0, 30.0, 40.0, 50.0, 70.0, 100.0, 150.0, 200.0],
            10.0,
        ),
    );
    tables.insert(
        Pollutant::Pm25,
        BreakpointTable::unit_steps(&[5.0, 10.0, 15.0, 20.0, 25.0, 35.0, 50.0, 70.0, 100.0], 10.0),
    );
    tables.insert(
        Pollutant::Pm10,
        BreakpointTable::unit_steps(
            &[10.0, 20.0, 30.0, 40.0, 50.0, 70.0, 100.0, 150.0, 200.0],
            10.0,
        ),
    );
    tables.insert(
        Pollutant::O3,
        BreakpointTable::unit_steps(
            &[25.0, 50.0, 70.0, 90.0, 110.0, 145.0, 180.0, 240.0, 300.0],
            10.0,
        ),
    );
    tables.insert(
        Pollutant::So2,
        BreakpointTable::unit_steps(
            &[25.0, 50.0, 75.0, 100.0, 150.0, 200.0, 300.0, 400.0, 500.0],
            10.0,
        ),
    );
    tables
}
