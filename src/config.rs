//! Configuration loading and validation.
//!
//! Reads `repair-sim.toml` (or the path given by `--config` /
//! `REPAIR_SIM_CONFIG`). Every field has a default, so a missing file is
//! not an error.

use crate::aggregation::Granularity;
use crate::assembly::default_required_sequence;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "REPAIR_SIM_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "repair-sim.toml";

const MAX_SEED_RECORDS: usize = 100_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Currency label shown next to costs
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Category labels in assembly order
    #[serde(default = "default_required_sequence")]
    pub required_sequence: Vec<String>,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub activity: ActivityConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

fn default_currency() -> String {
    "TL".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// CSV with `id,name,lifespan,price,image_path`; built-in parts when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Activity CSV; random records are generated when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,

    #[serde(default = "default_seed_records")]
    pub seed_records: usize,

    /// Fixed RNG seed for reproducible generated data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

fn default_seed_records() -> usize {
    100
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            seed_records: default_seed_records(),
            rng_seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_granularity")]
    pub default_granularity: String,
}

fn default_granularity() -> String {
    "monthly".into()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_granularity: default_granularity(),
        }
    }
}

impl AppConfig {
    /// Load from `explicit`, else `$REPAIR_SIM_CONFIG`, else `./repair-sim.toml`.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => std::env::var(CONFIG_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE)),
        };
        Self::load_from(&path)
    }

    /// Load from a specific file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.required_sequence.is_empty() {
            return Err(ConfigError::Validation(
                "required_sequence must not be empty".into(),
            ));
        }
        if self.required_sequence.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "required_sequence must not contain blank labels".into(),
            ));
        }
        if self.activity.seed_records > MAX_SEED_RECORDS {
            return Err(ConfigError::Validation(format!(
                "activity.seed_records must be at most {}",
                MAX_SEED_RECORDS
            )));
        }
        self.granularity()?;
        Ok(())
    }

    /// The configured default report granularity.
    pub fn granularity(&self) -> Result<Granularity, ConfigError> {
        self.report
            .default_granularity
            .parse()
            .map_err(|e: crate::error::AggregationError| ConfigError::Validation(e.to_string()))
    }

    /// This config as TOML, e.g. for writing a starter file.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            required_sequence: default_required_sequence(),
            catalog: CatalogConfig::default(),
            activity: ActivityConfig::default(),
            report: ReportConfig::default(),
        }
    }
}
