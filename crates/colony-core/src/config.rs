//! Configuration loading and typed config structures.
//!
//! The configuration lives in `colony-config.yaml` in the working directory.
//! Every field has a default, so an empty or partial file is valid.

use std::path::Path;

use serde::Deserialize;

/// Environment variable overriding `logging.level`.
pub const LOG_LEVEL_ENV: &str = "COLONY_LOG_LEVEL";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration, mirroring `colony-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Tick loop settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// The headless demo colony.
    #[serde(default)]
    pub colony: ColonyConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file.
    ///
    /// `COLONY_LOG_LEVEL` overrides `logging.level` when set.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying env overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config = Self::parse_without_env(yaml)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    fn parse_without_env(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Tick loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Real-time milliseconds per tick (0 runs as fast as possible).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = unlimited).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Run colony maintenance (work-order sweep, request generation) every
    /// this many ticks.
    #[serde(default = "default_colony_tick_period")]
    pub colony_tick_period: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: default_max_ticks(),
            colony_tick_period: default_colony_tick_period(),
        }
    }
}

/// The headless demo colony.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColonyConfig {
    /// Colony name, used in logs.
    #[serde(default = "default_colony_name")]
    pub name: String,

    /// Number of builder citizens.
    #[serde(default = "default_builders")]
    pub builders: u32,

    /// Number of deliveryman citizens.
    #[serde(default = "default_deliverymen")]
    pub deliverymen: u32,

    /// Random seed for work and request generation.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            name: default_colony_name(),
            builders: default_builders(),
            deliverymen: default_deliverymen(),
            seed: default_seed(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter (trace, debug, info, warn, error) when `RUST_LOG` is
    /// unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    /// Apply `COLONY_LOG_LEVEL` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
            self.level = level;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_max_ticks() -> u64 {
    200
}

const fn default_colony_tick_period() -> u64 {
    20
}

fn default_colony_name() -> String {
    "Riverside".to_owned()
}

const fn default_builders() -> u32 {
    2
}

const fn default_deliverymen() -> u32 {
    2
}

const fn default_seed() -> u64 {
    42
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.engine.tick_interval_ms, 50);
        assert_eq!(config.engine.max_ticks, 200);
        assert_eq!(config.colony.builders, 2);
        assert_eq!(config.colony.seed, 42);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
engine:
  tick_interval_ms: 0
  max_ticks: 1000
  colony_tick_period: 5

colony:
  name: "Hilltop"
  builders: 4
  deliverymen: 3
  seed: 7

logging:
  level: "debug"
  json: true
"#;
        let config = SimulationConfig::parse_without_env(yaml)
            .ok()
            .unwrap_or_default();
        assert_eq!(config.engine.tick_interval_ms, 0);
        assert_eq!(config.engine.max_ticks, 1000);
        assert_eq!(config.engine.colony_tick_period, 5);
        assert_eq!(config.colony.name, "Hilltop");
        assert_eq!(config.colony.deliverymen, 3);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = SimulationConfig::parse_without_env("colony:\n  seed: 9\n")
            .ok()
            .unwrap_or_default();
        assert_eq!(config.colony.seed, 9);
        assert_eq!(config.colony.builders, 2);
        assert_eq!(config.engine.max_ticks, 200);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(SimulationConfig::parse("").is_ok());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(matches!(
            SimulationConfig::parse_without_env("engine: [1, 2"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("colony-config.yaml");
        if path.exists() {
            let config = SimulationConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
