//! Green-space sub-index (I_Green), the 3-30-300 rule
//!
//! - visibility: 1 when at least `min_trees` trees are visible, else 0
//! - canopy: `min(canopy_pct / target_canopy_pct, 1)`, graded
//! - accessibility: 1 when a green space lies within `max_distance_m`, else 0
//!
//! I_Green is the mean of the sub-criteria that have data.

use crate::error::ConfigError;
use crate::inputs::GreenSpaceData;
use serde::{Deserialize, Serialize};

/// Mean Earth radius used for haversine distances (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GreenThresholds {
    pub min_trees: i64,
    pub target_canopy_pct: f64,
    pub max_distance_m: f64,
}

impl Default for GreenThresholds {
    fn default() -> Self {
        GreenThresholds {
            min_trees: 3,
            target_canopy_pct: 30.0,
            max_distance_m: 300.0,
        }
    }
}

impl GreenThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_trees < 0 {
            return Err(ConfigError::GreenThreshold {
                name: "green.min_trees",
                value: self.min_trees as f64,
            });
        }
        if !self.target_canopy_pct.is_finite()
            || self.target_canopy_pct <= 0.0
            || self.target_canopy_pct > 100.0
        {
            return Err(ConfigError::GreenThreshold {
                name: "green.target_canopy_pct",
                value: self.target_canopy_pct,
            });
        }
        if !self.max_distance_m.is_finite() || self.max_distance_m < 0.0 {
            return Err(ConfigError::GreenThreshold {
                name: "green.max_distance_m",
                value: self.max_distance_m,
            });
        }
        Ok(())
    }
}

/// Raw green index with its sub-criteria; absent criteria stay `None`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GreenIndex {
    pub raw: f64,
    pub visibility_score: Option<f64>,
    pub canopy_score: Option<f64>,
    pub accessibility_score: Option<f64>,
}

/// Compute I_Green; `None` when no sub-criterion has data
pub fn calculate_green_index(
    green: &GreenSpaceData,
    thresholds: &GreenThresholds,
) -> Option<GreenIndex> {
    let visibility_score = green
        .trees_visible
        .map(|trees| if trees >= thresholds.min_trees { 1.0 } else { 0.0 });
    let canopy_score = green
        .canopy_coverage_pct
        .map(|pct| (pct / thresholds.target_canopy_pct).min(1.0));
    let accessibility_score = green.distance_to_green_space_m.map(|distance| {
        if distance <= thresholds.max_distance_m {
            1.0
        } else {
            0.0
        }
    });

    let present: Vec<f64> = [visibility_score, canopy_score, accessibility_score]
        .into_iter()
        .flatten()
        .collect();
    if present.is_empty() {
        return None;
    }
    let raw = present.iter().sum::<f64>() / present.len() as f64;

    log::debug!(
        "I_Green = {:.3} (visibility {:?}, canopy {:?}, access {:?})",
        raw,
        visibility_score,
        canopy_score,
        accessibility_score
    );

    Some(GreenIndex {
        raw,
        visibility_score,
        canopy_score,
        accessibility_score,
    })
}

/// A park, square or wood that counts as accessible green space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GreenSpaceSite {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Great-circle distance in meters between two WGS84 points
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Nearest site and its distance; `None` for an empty candidate list
pub fn nearest_green_space<'a>(
    latitude: f64,
    longitude: f64,
    sites: &'a [GreenSpaceSite],
) -> Option<(&'a GreenSpaceSite, f64)> {
    sites
        .iter()
        .map(|site| {
            (
                site,
                haversine_m(latitude, longitude, site.latitude, site.longitude),
            )
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
