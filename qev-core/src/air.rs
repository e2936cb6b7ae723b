//! Air sub-index (I_Air)
//!
//! Each present pollutant is mapped through its breakpoint table; the raw air
//! index is the worst (maximum) of these sub-indices. Absent pollutants are
//! skipped, never counted as zero.

use crate::breakpoints::BreakpointTable;
use crate::inputs::{AirQualityData, Pollutant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw air index with the per-pollutant sub-indices that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirIndex {
    pub raw: f64,
    /// Pollutant holding the maximum (first in canonical order on ties)
    pub dominant: Pollutant,
    pub breakdown: BTreeMap<Pollutant, f64>,
}

/// Compute I_Air; `None` when no pollutant is present
pub fn calculate_air_index(
    air: &AirQualityData,
    tables: &BTreeMap<Pollutant, BreakpointTable>,
) -> Option<AirIndex> {
    let breakdown: BTreeMap<Pollutant, f64> = air
        .present()
        .filter_map(|(pollutant, concentration)| {
            tables
                .get(&pollutant)
                .map(|table| (pollutant, table.interpolate(concentration)))
        })
        .collect();

    let (dominant, raw) = breakdown
        .iter()
        .fold(None, |worst: Option<(Pollutant, f64)>, (&p, &index)| match worst {
            Some((_, w)) if w >= index => worst,
            _ => Some((p, index)),
        })?;

    log::debug!("I_Air = {:.3} (dominant {})", raw, dominant);

    Some(AirIndex {
        raw,
        dominant,
        breakdown,
    })
}
