//! Configuration file support for OCAT.
//!
//! This module provides serialization and deserialization of engine settings,
//! allowing users to export and import their configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIG_VERSION, DEFAULT_FLAG_BASE, DEFAULT_SAMPLING_DIVISIONS, DEFAULT_SAMPLING_SEED,
};
use crate::model::{Attribute, ClassifierClass, ObjectClass};

/// Log level setting for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show per-object transitions
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Engine configuration that can be exported and imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Offset added to every classification flag (at least 1)
    #[serde(default = "default_flag_base")]
    pub flag_base: u32,

    /// User preferences
    #[serde(default)]
    pub preferences: Preferences,

    /// Filter settings
    #[serde(default)]
    pub filter: FilterConfig,

    /// Classifier settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Sampling settings
    #[serde(default)]
    pub sampling: SamplingConfig,
}

fn default_flag_base() -> u32 {
    DEFAULT_FLAG_BASE
}

/// User preferences section of the config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Filter section of the config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Objects failing the filter are forced to non-feature by the classifier
    #[serde(default)]
    pub gates_classifier: bool,
}

/// Classifier section of the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Attributes forming the feature vector, in order
    #[serde(default = "default_features")]
    pub features: Vec<Attribute>,
}

fn default_features() -> Vec<Attribute> {
    Attribute::ALL.to_vec()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            features: default_features(),
        }
    }
}

/// Sampling section of the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Class whose oracle probability drives sampling
    #[serde(default = "default_target_class")]
    pub target_class: ClassifierClass,

    /// Seed for randomized sampling
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Sub-intervals for stratified sampling
    #[serde(default = "default_divisions")]
    pub divisions: usize,
}

fn default_target_class() -> ClassifierClass {
    ObjectClass::Feature
}

fn default_seed() -> u64 {
    DEFAULT_SAMPLING_SEED
}

fn default_divisions() -> usize {
    DEFAULT_SAMPLING_DIVISIONS
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            target_class: default_target_class(),
            seed: default_seed(),
            divisions: default_divisions(),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            flag_base: default_flag_base(),
            preferences: Preferences::default(),
            filter: FilterConfig::default(),
            classifier: ClassifierConfig::default(),
            sampling: SamplingConfig::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for config export.
    pub fn default_filename() -> &'static str {
        "ocat-config.json"
    }

    /// Get the default config file path for auto-load/save.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("ocat").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("ocat")
                    .join(Self::default_filename())
            })
        }
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(&path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let mut config = EngineConfig::new();
        config.filter.gates_classifier = true;
        config.classifier.features = vec![Attribute::Volume, Attribute::MeanIntensity];
        config.sampling.target_class = ObjectClass::NonFeature;
        config.preferences.log_level = LogLevel::Debug;

        let json = config.to_json().expect("Failed to serialize");
        assert!(json.contains("\"gates_classifier\": true"));
        assert!(json.contains("mean_intensity"));
        assert!(json.contains("\"debug\""));

        let loaded = EngineConfig::from_json(&json).expect("Failed to deserialize");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let loaded = EngineConfig::from_json(r#"{ "version": 1 }"#).expect("Failed to parse");
        assert_eq!(loaded, EngineConfig::default());
        assert_eq!(loaded.flag_base, DEFAULT_FLAG_BASE);
        assert_eq!(loaded.classifier.features.len(), Attribute::COUNT);
    }

    #[test]
    fn test_version_too_new() {
        let json = format!(r#"{{ "version": {} }}"#, CONFIG_VERSION + 1);
        let result = EngineConfig::from_json(&json);
        assert!(matches!(result, Err(ConfigError::VersionTooNew { .. })));
    }

    #[test]
    fn test_malformed_json() {
        let result = EngineConfig::from_json("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::default().to_level_filter(), log::LevelFilter::Info);
        assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
    }
}
