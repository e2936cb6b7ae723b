//! Address report generation
//!
//! Global invariants enforced:
//! - Reports keep the order in which addresses were requested
//! - JSON output is deterministic for a given result

use crate::result::QevResult;
use crate::scoring::Preset;
use serde::{Deserialize, Serialize};

/// How the traffic counts for an address were obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TrafficOrigin {
    Measured,
    /// Estimated from the nearest road's OSM class and lane count
    RoadEstimate {
        highway: String,
        lanes: Option<u32>,
    },
    DefaultEstimate,
}

impl TrafficOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficOrigin::Measured => "measured",
            TrafficOrigin::RoadEstimate { .. } => "road_estimate",
            TrafficOrigin::DefaultEstimate => "default_estimate",
        }
    }
}

/// Nearest candidate green space and its distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestGreenSpace {
    pub name: String,
    pub distance_m: f64,
}

/// Complete scoring report for one address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressReport {
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub preset: Preset,
    pub traffic_origin: TrafficOrigin,
    pub nearest_green_space: Option<NearestGreenSpace>,
    /// Plain-language reading of the category
    pub interpretation: String,
    pub result: QevResult,
}

/// Render reports as a fixed-width text table
pub fn render_text(reports: &[AddressReport]) -> String {
    let mut output = String::new();

    // Header
    output.push_str(&format!(
        "{:<6} {:<10} {:<6} {:<8} {:<6} {:<9} {}\n",
        "QEV", "CATEGORY", "AIR", "TRAFFIC", "GREEN", "COMPLETE", "ADDRESS"
    ));

    for report in reports {
        let result = &report.result;
        let real = 3 - result.missing_dimensions.len();
        output.push_str(&format!(
            "{:<6} {:<10} {:<6} {:<8} {:<6} {:<9} {}\n",
            format!("{:.3}", result.qev_score),
            result.category.label(),
            score_cell(result.scores.air),
            score_cell(Some(result.scores.traffic)),
            score_cell(result.scores.green),
            format!("{}/3", real),
            truncate_or_pad(&report.address, 40).trim_end(),
        ));

        let mut notes = Vec::new();
        if let Some(air) = &result.sub_indices.air {
            notes.push(format!("air index {:.2} ({})", air.raw, air.dominant));
        }
        match &report.traffic_origin {
            TrafficOrigin::Measured => {}
            TrafficOrigin::RoadEstimate { highway, .. } => {
                notes.push(format!("traffic estimated from {} road", highway));
            }
            TrafficOrigin::DefaultEstimate => notes.push("traffic defaulted".to_string()),
        }
        if let Some(park) = &report.nearest_green_space {
            notes.push(format!("{} at {:.0} m", park.name, park.distance_m));
        }
        if !notes.is_empty() {
            output.push_str(&format!("       {}\n", notes.join(", ")));
        }
        output.push_str(&format!("       {}\n", report.interpretation));
    }

    output
}

/// Render reports as JSON output
pub fn render_json(reports: &[AddressReport]) -> String {
    serde_json::to_string_pretty(reports).unwrap_or_else(|_| "[]".to_string())
}

fn score_cell(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.2}", s),
        None => "-".to_string(),
    }
}

/// Truncate or pad string to fixed width (in characters)
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}
