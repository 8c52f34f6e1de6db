//! Runtime configuration.
//!
//! Loaded from a TOML file (every section and key optional) and then
//! overridden from the environment. `.env` files are honoured through
//! `dotenv`, so a deployment can pin a seed or tick interval without
//! editing the TOML.
//!
//! ```toml
//! [simulation]
//! tick_interval_secs = 5
//! seed = 42
//! queue_cap = 20
//!
//! [simulation.rates]
//! waste = 0.10
//! flood = 0.08
//!
//! [alerts]
//! ph_low = 6.5
//! clear_band = 0.2
//!
//! [logging]
//! level = "debug"
//! file = "rivermon.log"
//! ```

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alert::thresholds::AlertThresholds;
use crate::logging::LogLevel;
use crate::simulation::events::EventRates;

pub const CONFIG_PATH_VAR: &str = "RIVERMON_CONFIG";
pub const SEED_VAR: &str = "RIVERMON_SEED";
pub const TICK_SECS_VAR: &str = "RIVERMON_TICK_SECS";
pub const LOG_LEVEL_VAR: &str = "RIVERMON_LOG_LEVEL";

/// Read when `RIVERMON_CONFIG` is unset and the file exists.
pub const DEFAULT_CONFIG_PATH: &str = "rivermon.toml";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read configuration from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_interval_secs: u64,
    /// Fixed seed for reproducible runs; entropy when absent.
    pub seed: Option<u64>,
    /// Capacity of each event list.
    pub queue_cap: usize,
    pub rates: EventRates,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 5,
            seed: None,
            queue_cap: 20,
            rates: EventRates::default(),
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StalenessConfig {
    pub max_age_minutes: u64,
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self { max_age_minutes: 15 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: true,
        }
    }
}

impl LoggingConfig {
    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        self.level.parse().map_err(ConfigError::Invalid)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub simulation: SimulationConfig,
    pub alerts: AlertThresholds,
    pub staleness: StalenessConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl MonitorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Loads `.env`, then the TOML file named by `RIVERMON_CONFIG` (or
    /// `rivermon.toml` if present), then applies the environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = match env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|var| env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `RIVERMON_SEED`, `RIVERMON_TICK_SECS` and
    /// `RIVERMON_LOG_LEVEL` as returned by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(SEED_VAR) {
            let seed = value.trim().parse().map_err(|_| ConfigError::Env {
                var: SEED_VAR,
                value: value.clone(),
            })?;
            self.simulation.seed = Some(seed);
        }
        if let Some(value) = lookup(TICK_SECS_VAR) {
            self.simulation.tick_interval_secs =
                value.trim().parse().map_err(|_| ConfigError::Env {
                    var: TICK_SECS_VAR,
                    value: value.clone(),
                })?;
        }
        if let Some(value) = lookup(LOG_LEVEL_VAR) {
            if value.parse::<LogLevel>().is_err() {
                return Err(ConfigError::Env {
                    var: LOG_LEVEL_VAR,
                    value,
                });
            }
            self.logging.level = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.tick_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "simulation.tick_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.simulation.queue_cap == 0 {
            return Err(ConfigError::Invalid(
                "simulation.queue_cap must be at least 1".to_string(),
            ));
        }
        if let Some((name, rate)) = self.simulation.rates.invalid_rate() {
            return Err(ConfigError::Invalid(format!(
                "simulation.rates.{} must be within [0, 1], got {}",
                name, rate
            )));
        }
        self.alerts.validate().map_err(ConfigError::Invalid)?;
        self.logging.log_level()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = MonitorConfig::from_toml_str("").unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.simulation.tick_interval(), Duration::from_secs(5));
        assert_eq!(config.simulation.queue_cap, 20);
        assert_eq!(config.staleness.max_age_minutes, 15);
    }

    #[test]
    fn test_example_file_matches_defaults() {
        let config = MonitorConfig::from_toml_str(include_str!("../rivermon.example.toml")).unwrap();
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_remaining_defaults() {
        let config = MonitorConfig::from_toml_str(
            r#"
            [simulation]
            seed = 42

            [simulation.rates]
            flood = 0.5

            [alerts]
            clear_band = 0.2
            "#,
        )
        .unwrap();

        assert_eq!(config.simulation.seed, Some(42));
        assert_eq!(config.simulation.rates.flood, 0.5);
        assert_eq!(config.simulation.rates.waste, 0.10);
        assert_eq!(config.alerts.clear_band, 0.2);
        assert_eq!(config.alerts.ph_low, 6.5);
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let err = MonitorConfig::from_toml_str("[simulation\nseed = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn test_out_of_range_probability_is_rejected() {
        let err = MonitorConfig::from_toml_str("[simulation.rates]\nsafety = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("safety")));
    }

    #[test]
    fn test_zero_queue_cap_is_rejected() {
        let err = MonitorConfig::from_toml_str("[simulation]\nqueue_cap = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_misordered_thresholds_are_rejected() {
        let err = MonitorConfig::from_toml_str("[alerts]\nwaste_high = 90.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let err = MonitorConfig::from_toml_str("[logging]\nlevel = \"loud\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[staleness]\nmax_age_minutes = 30").unwrap();
        let config = MonitorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.staleness.max_age_minutes, 30);
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MonitorConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<&str, &str> = [
            (SEED_VAR, "7"),
            (TICK_SECS_VAR, " 2 "),
            (LOG_LEVEL_VAR, "debug"),
        ]
        .into_iter()
        .collect();
        let mut config = MonitorConfig::default();
        config
            .apply_overrides(|var| vars.get(var).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.tick_interval_secs, 2);
        assert_eq!(config.logging.log_level().unwrap(), LogLevel::Debug);
    }

    #[test]
    fn test_unparseable_override_names_the_variable() {
        let mut config = MonitorConfig::default();
        let err = config
            .apply_overrides(|var| (var == SEED_VAR).then(|| "forty-two".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: SEED_VAR, .. }));
        assert_eq!(config.simulation.seed, None);
    }
}
