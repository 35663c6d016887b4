//! Configuration system for airport simulations.
//!
//! This module provides YAML/JSON configuration file support for the run
//! parameters and the airport timings.
//!
//! # Configuration File Structure
//!
//! ```yaml
//! simulation:
//!   horizon: 36000
//!   log_level: info
//!   confluent_policy: internal_first
//!   max_cascade: 10000
//!
//! airport:
//!   runway_time: 60
//!   routing_time: 30
//!   bay_limits: [249, 499, 749, 999]
//! ```
//!
//! Every field is optional; missing fields take the values shown above.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::airport::AirportParams;
use crate::kernel::{Simulation, DEFAULT_MAX_CASCADE};
use crate::model::ConfluentPolicy;
use crate::models::BayLimits;
use crate::types::SimTime;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Run parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Last simulation time to process
    #[serde(default = "default_horizon")]
    pub horizon: SimTime,

    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Order of simultaneous internal and external events
    #[serde(default)]
    pub confluent_policy: ConfluentPolicy,

    /// Bound on consecutive steps at one instant
    #[serde(default = "default_max_cascade")]
    pub max_cascade: usize,
}

fn default_horizon() -> SimTime {
    36000.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_cascade() -> usize {
    DEFAULT_MAX_CASCADE
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            log_level: default_log_level(),
            confluent_policy: ConfluentPolicy::default(),
            max_cascade: default_max_cascade(),
        }
    }
}

impl SimulationParams {
    /// Applies the kernel settings to `sim`.
    pub fn apply(&self, sim: Simulation) -> Simulation {
        sim.with_policy(self.confluent_policy)
            .with_max_cascade(self.max_cascade)
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AirportConfig {
    /// Run parameters
    #[serde(default)]
    pub simulation: SimulationParams,

    /// Airport timings and bay limits
    #[serde(default)]
    pub airport: AirportParams,
}

impl AirportConfig {
    /// Creates a configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: AirportConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: AirportConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let sim = &self.simulation;
        if sim.horizon.is_nan() || sim.horizon < 0.0 {
            return Err(ConfigError::Validation(format!(
                "horizon must be non-negative, got {}",
                sim.horizon
            )));
        }
        if !LOG_LEVELS.contains(&sim.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "Unknown log level: {}",
                sim.log_level
            )));
        }
        if sim.max_cascade == 0 {
            return Err(ConfigError::Validation(
                "max_cascade must be at least 1".to_string(),
            ));
        }

        let airport = &self.airport;
        for (name, value) in [
            ("runway_time", airport.runway_time),
            ("routing_time", airport.routing_time),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be a positive finite time, got {value}"
                )));
            }
        }
        if !airport.bay_limits.is_valid() {
            return Err(ConfigError::Validation(format!(
                "bay_limits must be non-negative and strictly increasing, got {:?}",
                airport.bay_limits.0
            )));
        }

        Ok(())
    }

    /// Saves configuration to a YAML file.
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Converts to YAML string.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Converts to JSON string.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for creating an [`AirportConfig`] programmatically.
#[derive(Default)]
pub struct AirportConfigBuilder {
    config: AirportConfig,
}

impl AirportConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn horizon(mut self, horizon: SimTime) -> Self {
        self.config.simulation.horizon = horizon;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.simulation.log_level = level.into();
        self
    }

    pub fn confluent_policy(mut self, policy: ConfluentPolicy) -> Self {
        self.config.simulation.confluent_policy = policy;
        self
    }

    pub fn max_cascade(mut self, max_cascade: usize) -> Self {
        self.config.simulation.max_cascade = max_cascade;
        self
    }

    pub fn runway_time(mut self, time: SimTime) -> Self {
        self.config.airport.runway_time = time;
        self
    }

    pub fn routing_time(mut self, time: SimTime) -> Self {
        self.config.airport.routing_time = time;
        self
    }

    pub fn bay_limits(mut self, limits: [i64; 4]) -> Self {
        self.config.airport.bay_limits = BayLimits(limits);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<AirportConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
