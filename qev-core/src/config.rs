//! Configuration file support for QeV
//!
//! Loads scoring overrides from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.qevrc.json` in the working directory
//! 3. `qev.config.json` in the working directory
//!
//! All fields are optional. A preset supplies the base values and every other
//! field overrides part of it. CLI flags take precedence over config file values.

use crate::breakpoints::BreakpointTable;
use crate::category::CategoryBoundaries;
use crate::error::ConfigError;
use crate::inputs::Pollutant;
use crate::normalize::NormalizationBounds;
use crate::scoring::{Preset, ScoringConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// QeV configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QevConfig {
    /// Base weight regime (default: "health-burden")
    #[serde(default)]
    pub preset: Option<String>,

    /// Dimension weights; must sum to 1.0 after merging with the preset
    #[serde(default)]
    pub weights: Option<WeightConfig>,

    /// Per-vehicle-class nuisance weights
    #[serde(default)]
    pub traffic_weights: Option<TrafficWeightConfig>,

    /// Fallback counts when an address has no traffic data
    #[serde(default)]
    pub default_traffic: Option<DefaultTrafficConfig>,

    /// 3-30-300 rule thresholds
    #[serde(default)]
    pub green: Option<GreenConfig>,

    /// Normalization bounds, each as `[min, max]`
    #[serde(default)]
    pub bounds: Option<BoundsConfig>,

    /// Lower bounds of Poor, Moderate, Good, Excellent
    #[serde(default)]
    pub categories: Option<CategoryBoundaries>,

    /// Breakpoint tables replacing the built-in ones, keyed by pollutant
    #[serde(default)]
    pub breakpoints: Option<BTreeMap<String, BreakpointTable>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightConfig {
    /// Weight of air quality (default: 0.50)
    pub air: Option<f64>,
    /// Weight of traffic nuisance (default: 0.25)
    pub traffic: Option<f64>,
    /// Weight of green space (default: 0.25)
    pub green: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficWeightConfig {
    /// Passenger car (default: 1.0)
    pub light: Option<f64>,
    /// Van (default: 3.2)
    pub utility: Option<f64>,
    /// Truck or bus (default: 12.5)
    pub heavy: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultTrafficConfig {
    /// Light vehicles per hour (default: 100)
    pub light: Option<i64>,
    /// Utility vehicles per hour (default: 20)
    pub utility: Option<i64>,
    /// Heavy vehicles per hour (default: 5)
    pub heavy: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GreenConfig {
    /// Visible trees required (default: 3)
    pub min_trees: Option<i64>,
    /// Canopy percentage giving full credit (default: 30)
    pub target_canopy_pct: Option<f64>,
    /// Maximum walking distance to a green space in meters (default: 300)
    pub max_distance_m: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundsConfig {
    /// Raw air index range (default: [1, 10])
    pub air: Option<NormalizationBounds>,
    /// Traffic nuisance range (default: [0, 5000])
    pub traffic: Option<NormalizationBounds>,
    /// Green index range (default: [0, 1])
    pub green: Option<NormalizationBounds>,
}

/// Resolved configuration ready for the calculator
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub preset: Preset,
    pub scoring: ScoringConfig,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl QevConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        let scoring = self.merge()?;
        scoring
            .validate()
            .context("configuration produces an invalid scoring setup")?;
        Ok(())
    }

    /// Resolve config into an immutable scoring configuration
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;
        Ok(ResolvedConfig {
            preset: self.preset()?,
            scoring: self.merge()?,
            config_path: None,
        })
    }

    fn preset(&self) -> Result<Preset, ConfigError> {
        match &self.preset {
            Some(name) => Preset::from_name(name),
            None => Ok(Preset::default()),
        }
    }

    /// Preset values with every present field applied on top
    fn merge(&self) -> Result<ScoringConfig, ConfigError> {
        let mut config = self.preset()?.config();

        if let Some(w) = &self.weights {
            config.weights.air = w.air.unwrap_or(config.weights.air);
            config.weights.traffic = w.traffic.unwrap_or(config.weights.traffic);
            config.weights.green = w.green.unwrap_or(config.weights.green);
        }

        if let Some(tw) = &self.traffic_weights {
            let t = &mut config.traffic_weights;
            t.light = tw.light.unwrap_or(t.light);
            t.utility = tw.utility.unwrap_or(t.utility);
            t.heavy = tw.heavy.unwrap_or(t.heavy);
        }

        if let Some(dt) = &self.default_traffic {
            let d = &mut config.default_traffic;
            d.light = dt.light.unwrap_or(d.light);
            d.utility = dt.utility.unwrap_or(d.utility);
            d.heavy = dt.heavy.unwrap_or(d.heavy);
        }

        if let Some(g) = &self.green {
            config.green.min_trees = g.min_trees.unwrap_or(config.green.min_trees);
            config.green.target_canopy_pct =
                g.target_canopy_pct.unwrap_or(config.green.target_canopy_pct);
            config.green.max_distance_m = g.max_distance_m.unwrap_or(config.green.max_distance_m);
        }

        if let Some(b) = &self.bounds {
            config.bounds.air = b.air.unwrap_or(config.bounds.air);
            config.bounds.traffic = b.traffic.unwrap_or(config.bounds.traffic);
            config.bounds.green = b.green.unwrap_or(config.bounds.green);
        }

        if let Some(categories) = self.categories {
            config.categories = categories;
        }

        if let Some(tables) = &self.breakpoints {
            for (name, table) in tables {
                let pollutant = Pollutant::parse(name)
                    .ok_or_else(|| ConfigError::UnknownPollutant(name.clone()))?;
                config.breakpoints.insert(pollutant, table.clone());
            }
        }

        Ok(config)
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Self {
        ResolvedConfig {
            preset: Preset::default(),
            scoring: ScoringConfig::default(),
            config_path: None,
        }
    }
}

/// Discover and load a config file from a directory
///
/// Search order:
/// 1. `.qevrc.json`
/// 2. `qev.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(root: &Path) -> Result<Option<(QevConfig, PathBuf)>> {
    for name in [".qevrc.json", "qev.config.json"] {
        let path = root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<QevConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: QevConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Load and resolve config
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config in `root`.
/// `preset_override` replaces the file's preset before resolution.
/// Returns default config if nothing is found.
pub fn load_and_resolve(
    root: &Path,
    config_path: Option<&Path>,
    preset_override: Option<&str>,
) -> Result<ResolvedConfig> {
    let (mut config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(root)? {
            Some((config, path)) => (config, Some(path)),
            None => (QevConfig::default(), None),
        }
    };

    if let Some(preset) = preset_override {
        config.preset = Some(preset.to_string());
    }

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::DimensionWeights;
    use crate::traffic::TrafficWeights;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = QevConfig::default();
        config.validate().expect("default config should be valid");
        let resolved = config.resolve().expect("default config should resolve");
        assert_eq!(resolved.preset, Preset::HealthBurden);
        assert_eq!(resolved.scoring, ScoringConfig::default());
        assert!(resolved.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: QevConfig = serde_json::from_str("{}").unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "preset": "health-burden",
            "weights": {"air": 0.6, "traffic": 0.2, "green": 0.2},
            "traffic_weights": {"light": 1.0, "utility": 3.0, "heavy": 10.0},
            "default_traffic": {"light": 80, "utility": 15, "heavy": 4},
            "green": {"min_trees": 4, "target_canopy_pct": 25.0, "max_distance_m": 250.0},
            "bounds": {"traffic": [0.0, 4000.0]},
            "categories": [0.25, 0.45, 0.65, 0.85],
            "breakpoints": {
                "pm2_5": {"bands": [[0.0, 10.0, 0.0, 5.0], [10.0, 50.0, 5.0, 9.0]], "ceiling": 10.0}
            }
        }"#;
        let config: QevConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
        let scoring = config.resolve().unwrap().scoring;
        assert_eq!(scoring.weights.air, 0.6);
        assert_eq!(scoring.traffic_weights, TrafficWeights::PASSENGER_CAR_UNITS);
        assert_eq!(scoring.default_traffic.light, 80);
        assert_eq!(scoring.green.min_trees, 4);
        assert_eq!(scoring.bounds.traffic.max, 4000.0);
        assert_eq!(scoring.bounds.air.max, 10.0);
        assert_eq!(scoring.categories.0[3], 0.85);
        assert_eq!(scoring.breakpoints[&Pollutant::Pm25].bands.len(), 2);
        assert_eq!(scoring.breakpoints[&Pollutant::No2].bands.len(), 9);
    }

    #[test]
    fn test_reject_unknown_fields() {
        let json = r#"{"unknown_field": true}"#;
        let result: Result<QevConfig, _> = serde_json::from_str(json);
        assert!(result.is_err(), "unknown fields should be rejected");
    }

    #[test]
    fn test_reject_unknown_preset() {
        let config: QevConfig = serde_json::from_str(r#"{"preset": "balanced"}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown preset"));
    }

    #[test]
    fn test_reject_partial_weights_breaking_sum() {
        let config: QevConfig = serde_json::from_str(r#"{"weights": {"air": 0.6}}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_negative_weight() {
        let json = r#"{"weights": {"air": 1.2, "traffic": -0.1, "green": -0.1}}"#;
        let config: QevConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_degenerate_bounds() {
        let config: QevConfig =
            serde_json::from_str(r#"{"bounds": {"air": [5.0, 5.0]}}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_unordered_categories() {
        let config: QevConfig =
            serde_json::from_str(r#"{"categories": [0.4, 0.2, 0.6, 0.8]}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_empty_breakpoint_table() {
        let json = r#"{"breakpoints": {"o3": {"bands": [], "ceiling": 10.0}}}"#;
        let config: QevConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_unknown_pollutant() {
        let json = r#"{"breakpoints": {"co": {"bands": [[0.0, 1.0, 0.0, 1.0]], "ceiling": 1.0}}}"#;
        let config: QevConfig = serde_json::from_str(json).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("co"));
    }

    #[test]
    fn test_metascore_preset_from_file() {
        let config: QevConfig = serde_json::from_str(r#"{"preset": "metascore"}"#).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.preset, Preset::Metascore);
        assert_eq!(resolved.scoring.weights, DimensionWeights::METASCORE);
    }

    #[test]
    fn test_discover_qevrc() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".qevrc.json");
        fs::write(&config_path, r#"{"preset": "metascore"}"#).unwrap();

        let result = discover_config(dir.path()).unwrap();
        assert!(result.is_some());
        let (config, path) = result.unwrap();
        assert_eq!(config.preset.as_deref(), Some("metascore"));
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_qev_config_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("qev.config.json"),
            r#"{"green": {"min_trees": 5}}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.green.unwrap().min_trees, Some(5));
    }

    #[test]
    fn test_discover_priority_order() {
        let dir = tempfile::tempdir().unwrap();

        // Create both config files - .qevrc.json should win
        fs::write(dir.path().join(".qevrc.json"), r#"{"preset": "metascore"}"#).unwrap();
        fs::write(
            dir.path().join("qev.config.json"),
            r#"{"preset": "health-burden"}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(
            config.preset.as_deref(),
            Some("metascore"),
            ".qevrc.json should take priority"
        );
    }

    #[test]
    fn test_no_config_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".qevrc.json");
        fs::write(&path, r#"{"weights": {"air": 0.9}}"#).unwrap();

        let err = discover_config(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains(".qevrc.json"));
    }

    #[test]
    fn test_load_and_resolve_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load_and_resolve(dir.path(), None, None).unwrap();
        assert!(resolved.config_path.is_none());
        assert_eq!(resolved.preset, Preset::HealthBurden);
    }

    #[test]
    fn test_load_and_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("custom.json");
        fs::write(&config_path, r#"{"green": {"max_distance_m": 500.0}}"#).unwrap();

        let resolved = load_and_resolve(dir.path(), Some(&config_path), None).unwrap();
        assert_eq!(resolved.scoring.green.max_distance_m, 500.0);
        assert_eq!(resolved.config_path, Some(config_path));
    }

    #[test]
    fn test_preset_override_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".qevrc.json"), r#"{"preset": "health-burden"}"#).unwrap();

        let resolved = load_and_resolve(dir.path(), None, Some("metascore")).unwrap();
        assert_eq!(resolved.preset, Preset::Metascore);
    }
}
