//! QeV CLI - Quality of Environmental Life scoring for addresses

// Global invariants enforced:
// - Reports follow the order of the requests file
// - Any validation or configuration failure exits with status 1

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use qev_core::config::{self, ResolvedConfig};
use qev_core::{render_json, render_text, score_requests, AddressRequest, Preset};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "qev")]
#[command(about = "Score addresses with the Quality of Environmental Life (QeV) index")]
#[command(version = env!("QEV_VERSION"))]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one address request or an array of requests from a JSON file
    Score {
        /// Path to the requests file
        path: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Weight preset (overrides config file)
        #[arg(long)]
        preset: Option<String>,
    },
    /// Validate or show the scoring configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List the built-in weight presets
    Presets,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without scoring anything
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (preset + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Weight preset (overrides config file)
        #[arg(long)]
        preset: Option<String>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// A requests file holds either one request or an array of them
#[derive(Deserialize)]
#[serde(untagged)]
enum RequestsFile {
    Many(Vec<AddressRequest>),
    One(Box<AddressRequest>),
}

impl RequestsFile {
    fn into_vec(self) -> Vec<AddressRequest> {
        match self {
            RequestsFile::Many(requests) => requests,
            RequestsFile::One(request) => vec![*request],
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Score {
            path,
            format,
            config,
            preset,
        } => {
            let cwd = std::env::current_dir()?;
            let resolved = config::load_and_resolve(&cwd, config.as_deref(), preset.as_deref())
                .context("failed to load configuration")?;
            if let Some(ref p) = resolved.config_path {
                log::info!("using config {}", p.display());
            }

            let requests = load_requests(&path)?;
            log::info!(
                "scoring {} address(es) with preset {}",
                requests.len(),
                resolved.preset
            );
            let reports = score_requests(&requests, &resolved)
                .with_context(|| format!("failed to score {}", path.display()))?;

            match format {
                OutputFormat::Text => print!("{}", render_text(&reports)),
                OutputFormat::Json => println!("{}", render_json(&reports)),
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let cwd = std::env::current_dir()?;
                match config::load_and_resolve(&cwd, path.as_deref(), None) {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path, preset } => {
                let cwd = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&cwd, path.as_deref(), preset.as_deref())
                    .context("failed to load configuration")?;
                print_config(&resolved);
            }
        },
        Commands::Presets => {
            for preset in Preset::ALL {
                let config = preset.config();
                println!("{:<14} {}", preset.as_str(), preset.description());
                println!(
                    "{:<14} weights air {:.2} / traffic {:.2} / green {:.2}",
                    "",
                    config.weights.air,
                    config.weights.traffic,
                    config.weights.green
                );
                println!(
                    "{:<14} vehicles light {} / utility {} / heavy {}",
                    "",
                    config.traffic_weights.light,
                    config.traffic_weights.utility,
                    config.traffic_weights.heavy
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_requests(path: &Path) -> anyhow::Result<Vec<AddressRequest>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read requests file: {}", path.display()))?;
    let file: RequestsFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse requests file: {}", path.display()))?;
    Ok(file.into_vec())
}

fn print_config(resolved: &ResolvedConfig) {
    let scoring = &resolved.scoring;

    println!("Configuration:");
    if let Some(ref p) = resolved.config_path {
        println!("  Source: {}", p.display());
    } else {
        println!("  Source: defaults (no config file found)");
    }
    println!("  Preset: {}", resolved.preset);
    println!();
    println!("Weights:");
    println!("  air: {}", scoring.weights.air);
    println!("  traffic: {}", scoring.weights.traffic);
    println!("  green: {}", scoring.weights.green);
    println!();
    println!("Traffic:");
    println!(
        "  vehicle weights: light {} / utility {} / heavy {}",
        scoring.traffic_weights.light, scoring.traffic_weights.utility, scoring.traffic_weights.heavy
    );
    println!(
        "  default estimate: {} / {} / {} veh/h",
        scoring.default_traffic.light, scoring.default_traffic.utility, scoring.default_traffic.heavy
    );
    println!();
    println!("Green space:");
    println!("  min trees: {}", scoring.green.min_trees);
    println!("  target canopy: {}%", scoring.green.target_canopy_pct);
    println!("  max distance: {} m", scoring.green.max_distance_m);
    println!();
    println!("Normalization bounds:");
    println!("  air: [{}, {}] (inverted)", scoring.bounds.air.min, scoring.bounds.air.max);
    println!(
        "  traffic: [{}, {}] (inverted)",
        scoring.bounds.traffic.min, scoring.bounds.traffic.max
    );
    println!("  green: [{}, {}]", scoring.bounds.green.min, scoring.bounds.green.max);
    println!();
    let [poor, moderate, good, excellent] = scoring.categories.0;
    println!("Categories (lower bound inclusive):");
    println!("  poor: {}", poor);
    println!("  moderate: {}", moderate);
    println!("  good: {}", good);
    println!("  excellent: {}", excellent);
    println!();
    println!("Breakpoint tables:");
    for (pollutant, table) in &scoring.breakpoints {
        let upper = table
            .bands
            .iter()
            .map(|b| b.c_high.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {}: [{}] → ceiling {}", pollutant, upper, table.max_index());
    }
}
