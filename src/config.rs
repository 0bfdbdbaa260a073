//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files. The `strategy`
//! section is kept as a free-form mapping: the strategy deserializes its own
//! settings from it and the hyperopt loss reads the sampled periods from it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `data.data_dir`
pub const DATA_DIR_ENV: &str = "DOUBLE_MA_DATA_DIR";

/// Main configuration structure
///
/// A missing `strategy` section becomes an empty mapping. An explicit
/// `"strategy": null` is kept as null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Strategy section: `name` plus any strategy parameters
    #[serde(default = "empty_strategy")]
    pub strategy: serde_json::Value,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub hyperopt: HyperoptConfig,
}

fn empty_strategy() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

impl Default for Config {
    fn default() -> Self {
        Config {
            strategy: empty_strategy(),
            data: DataConfig::default(),
            hyperopt: HyperoptConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        if let Ok(data_dir) = std::env::var(DATA_DIR_ENV) {
            config.data.data_dir = data_dir;
        }

        Ok(config)
    }

    /// Build a config around a strategy mapping, everything else defaulted
    pub fn with_strategy(strategy: serde_json::Value) -> Self {
        Config {
            strategy,
            ..Default::default()
        }
    }

    /// Get strategy name from strategy config
    pub fn strategy_name(&self) -> Result<String> {
        self.strategy
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .context("'name' is required in the 'strategy' section of config. Example: \"strategy\": { \"name\": \"double_ma\", ... }")
    }

    /// Set a single strategy parameter, creating the mapping if needed
    pub fn set_strategy_param(&mut self, key: &str, value: serde_json::Value) {
        if !self.strategy.is_object() {
            self.strategy = serde_json::json!({});
        }
        if let Some(obj) = self.strategy.as_object_mut() {
            obj.insert(key.to_string(), value);
        }
    }
}

/// Data location configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub data_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            data_dir: "user_data/data".to_string(),
        }
    }
}

/// Hyperopt loss selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HyperoptConfig {
    /// Registered loss function name
    #[serde(default = "default_loss")]
    pub loss: String,
    /// Log the per-term breakdown of every scored trial
    #[serde(default)]
    pub debug: bool,
}

fn default_loss() -> String {
    "double_ma".to_string()
}

impl Default for HyperoptConfig {
    fn default() -> Self {
        HyperoptConfig {
            loss: default_loss(),
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.strategy, json!({}));
        assert_eq!(config.data.data_dir, "user_data/data");
        assert_eq!(config.hyperopt.loss, "double_ma");
        assert!(!config.hyperopt.debug);
    }

    #[test]
    fn test_explicit_null_strategy_is_kept() {
        let config: Config = serde_json::from_str(r#"{ "strategy": null }"#).unwrap();
        assert!(config.strategy.is_null());
        assert_eq!(Config::default().strategy, json!({}));
    }

    #[test]
    fn test_strategy_name() {
        let config = Config::with_strategy(json!({ "name": "double_ma", "fast_ma_period": 12 }));
        assert_eq!(config.strategy_name().unwrap(), "double_ma");

        let config = Config::with_strategy(json!({ "fast_ma_period": 12 }));
        assert!(config.strategy_name().is_err());
    }

    #[test]
    fn test_set_strategy_param_on_empty_mapping() {
        let mut config = Config::default();
        config.set_strategy_param("slow_ma_period", json!(40));
        assert_eq!(config.strategy["slow_ma_period"], json!(40));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "strategy": { "name": "double_ma" }, "hyperopt": { "debug": true } }"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.strategy_name().unwrap(), "double_ma");
        assert!(config.hyperopt.debug);
        assert_eq!(config.hyperopt.loss, "double_ma");
    }

    #[test]
    fn test_from_file_missing() {
        assert!(Config::from_file("/nonexistent/config.json").is_err());
    }
}
