//! # Settings Module
//!
//! ## Purpose
//! Keeps the run-time configuration of the laboratory tools in one place: which
//! descriptor plugins run when a compound is saved, the lab group used by the command
//! line front end, the relation name written into ARFF files and the logging setup.
//!
//! ## Architecture
//! - **DrpConfig**: serializable configuration structure
//! - **ConfigManager**: validation of updates and persistence to `drp_config.json`
//! - **Global Access**: thread-safe singleton with test isolation
//! - **init_logging**: terminal logger plus an optional log file, via `simplelog`
//!
//! ## Configuration Format
//! ```json
//! {
//!   "mol_descriptor_plugins": ["formula"],
//!   "default_lab_group": "default",
//!   "arff_relation": "drp",
//!   "log_level": "info",
//!   "log_file": null
//! }
//! ```
//! A missing or unreadable file means the defaults above.
//!
//! ## Usage Patterns
//! ```rust,no_run
//! use drp_data::settings::{with_config, with_config_mut};
//!
//! let relation = with_config(|manager| manager.config().arff_relation.clone());
//! let result = with_config_mut(|manager| manager.set_default_lab_group("Norquist"));
//! ```
use crate::Descriptors::plugins::AVAILABLE_PLUGINS;
use log::{LevelFilter, info, warn};
use serde::{Deserialize, Serialize};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::{self, File};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};
use thiserror::Error;

pub const CONFIG_FILE: &str = "drp_config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown descriptor plugin: {0}")]
    UnknownPlugin(String),
    #[error("unknown log level: {0}")]
    UnknownLogLevel(String),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("logger already initialised")]
    Logger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrpConfig {
    /// plugins run, in this order, when a compound is saved with descriptor calculation
    pub mol_descriptor_plugins: Vec<String>,
    pub default_lab_group: String,
    pub arff_relation: String,
    /// off, error, warn, info, debug or trace
    pub log_level: String,
    pub log_file: Option<String>,
}

impl Default for DrpConfig {
    fn default() -> Self {
        Self {
            mol_descriptor_plugins: vec!["formula".to_string()],
            default_lab_group: "default".to_string(),
            arff_relation: "drp".to_string(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl DrpConfig {
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        parse_level(&self.log_level)
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, ConfigError> {
    level
        .trim()
        .parse::<LevelFilter>()
        .map_err(|_| ConfigError::UnknownLogLevel(level.to_string()))
}

/// Loads, validates and saves the configuration.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: DrpConfig,
    config_file: String,
}

impl ConfigManager {
    /// configuration from `drp_config.json` in the working directory, or the defaults
    pub fn new() -> Self {
        Self::with_config_file(CONFIG_FILE)
    }

    pub fn with_config_file(config_file: &str) -> Self {
        let config = match Self::load_config(config_file) {
            Ok(config) => config,
            Err(e) => {
                warn!("{} ignored, using default settings: {}", config_file, e);
                DrpConfig::default()
            }
        };
        Self {
            config,
            config_file: config_file.to_string(),
        }
    }

    fn load_config(config_file: &str) -> Result<DrpConfig, ConfigError> {
        if Path::new(config_file).exists() {
            let content = fs::read_to_string(config_file)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(DrpConfig::default())
        }
    }

    /// Writes the configuration to its file. Does nothing in tests.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        #[cfg(test)]
        {
            return Ok(());
        }

        #[cfg(not(test))]
        {
            let content = serde_json::to_string_pretty(&self.config)?;
            fs::write(&self.config_file, content)?;
            info!("settings saved to {}", self.config_file);
            Ok(())
        }
    }

    pub fn config(&self) -> &DrpConfig {
        &self.config
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Replaces the plugin list. Every name must be a known plugin.
    pub fn set_mol_descriptor_plugins(&mut self, plugins: &[String]) -> Result<(), ConfigError> {
        if let Some(unknown) = plugins
            .iter()
            .find(|p| !AVAILABLE_PLUGINS.contains(&p.as_str()))
        {
            return Err(ConfigError::UnknownPlugin(unknown.clone()));
        }
        self.config.mol_descriptor_plugins = plugins.to_vec();
        self.save_config()
    }

    pub fn set_default_lab_group(&mut self, lab_group: &str) -> Result<(), ConfigError> {
        if lab_group.trim().is_empty() {
            return Err(ConfigError::Empty("lab group"));
        }
        self.config.default_lab_group = lab_group.trim().to_string();
        self.save_config()
    }

    pub fn set_arff_relation(&mut self, relation: &str) -> Result<(), ConfigError> {
        if relation.trim().is_empty() {
            return Err(ConfigError::Empty("ARFF relation"));
        }
        self.config.arff_relation = relation.trim().to_string();
        self.save_config()
    }

    pub fn set_log_level(&mut self, level: &str) -> Result<(), ConfigError> {
        parse_level(level)?;
        self.config.log_level = level.trim().to_lowercase();
        self.save_config()
    }

    /// `None` logs to the terminal only
    pub fn set_log_file(&mut self, path: Option<&str>) -> Result<(), ConfigError> {
        self.config.log_file = path.map(str::to_string);
        self.save_config()
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), ConfigError> {
        self.config = DrpConfig::default();
        self.save_config()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_CONFIG_MANAGER: OnceLock<Mutex<ConfigManager>> = OnceLock::new();

#[cfg(test)]
static TEST_MANAGER: Mutex<Option<ConfigManager>> = Mutex::new(None);

/// Makes the global accessors use `manager` in this test run.
#[cfg(test)]
pub fn set_test_manager(manager: ConfigManager) {
    *TEST_MANAGER.lock().unwrap() = Some(manager);
}

#[cfg(test)]
pub fn clear_test_manager() {
    *TEST_MANAGER.lock().unwrap() = None;
}

/// Guard to the process-wide manager. A poisoned lock is taken over as is.
pub fn get_config_manager() -> MutexGuard<'static, ConfigManager> {
    #[cfg(test)]
    {
        if let Some(ref manager) = *TEST_MANAGER.lock().unwrap() {
            let _ = GLOBAL_CONFIG_MANAGER.set(Mutex::new(manager.clone()));
        }
    }

    GLOBAL_CONFIG_MANAGER
        .get_or_init(|| Mutex::new(ConfigManager::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&ConfigManager) -> R,
{
    let manager = get_config_manager();
    f(&manager)
}

pub fn with_config_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut ConfigManager) -> R,
{
    let mut manager = get_config_manager();
    f(&mut manager)
}

/// Starts logging at the configured level: always to the terminal, and to `log_file` as
/// well when one is set.
pub fn init_logging(config: &DrpConfig) -> Result<(), ConfigError> {
    let level = config.level_filter()?;
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));
    if let Some(path) = &config.log_file {
        loggers.push(WriteLogger::new(level, Config::default(), File::create(path)?));
    }
    CombinedLogger::init(loggers).map_err(|_| ConfigError::Logger)?;
    info!("logging at level {}", level);
    Ok(())
}
