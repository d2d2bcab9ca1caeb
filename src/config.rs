//! Configuration management for the coupon abuse detector

use crate::rules::config::{default_categories, default_fraudulent_vendors, RuleCategory, RuleConfig};
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Detection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Vendor names that are known to be fraudulent
    #[serde(default = "default_fraudulent_vendors")]
    pub fraudulent_vendors: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            fraudulent_vendors: default_fraudulent_vendors(),
        }
    }
}

/// Rule category weight table
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_categories")]
    pub categories: Vec<RuleCategory>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
        }
    }
}

/// Input locations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputConfig {
    /// Separate label file; labels in the transaction file are used otherwise
    pub ground_truth_path: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Load from `path` when it exists, falling back to built-in defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Initial (version 1) rule configuration
    pub fn rule_config(&self) -> RuleConfig {
        RuleConfig::new(
            self.detection.fraudulent_vendors.clone(),
            self.rules.categories.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::rule::Rule;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.detection.fraudulent_vendors.len(), 3);
        assert_eq!(config.rules.categories.len(), 3);
        assert_eq!(config.logging.level, "info");
        assert!(config.input.ground_truth_path.is_none());
        assert_eq!(config.rule_config(), RuleConfig::default());
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[detection]
fraudulent_vendors = ["FakeShop", "BogusBazaar"]

[[rules.categories]]
name = "vendor_check"
rules = ["fraudulent_vendor_name"]
weight = 0.8

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        let rules = config.rule_config();

        assert!(rules.is_fraudulent_vendor("BogusBazaar"));
        assert!(!rules.is_fraudulent_vendor("ScamStore"));
        assert_eq!(rules.weight_for(Rule::FraudulentVendorName), 0.8);
        assert_eq!(rules.weight_for(Rule::HighDiscountRatio), 0.0);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_or_default("does/not/exist.toml").unwrap();
        assert_eq!(config.rules.categories.len(), 3);
    }
}
