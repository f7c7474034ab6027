//! Configuration management for the CLI
//!
//! Defaults come from an optional JSON file; command-line flags always win.

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use kusage_lib::ReportConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// CLI configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Namespace used when `--namespace` is not given
    pub default_namespace: Option<String>,
    /// Threshold percent used when `--threshold` is not given
    pub default_threshold: Option<u8>,
    /// Output format used when `--format` is not given
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from an explicit path, or the default location.
    ///
    /// A missing file at the default location yields the default config;
    /// a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::config_path()?;
                if !path.exists() {
                    return Ok(Self::default());
                }
                Self::load_from(&path)
            }
        }
    }

    /// Load configuration from a file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("kusage").join("config.json"))
    }

    /// Merge command-line values over file defaults
    pub fn report_config(
        &self,
        namespace: Option<String>,
        low_usage_only: bool,
        threshold: Option<u8>,
    ) -> Result<ReportConfig> {
        let namespace = namespace
            .or_else(|| self.default_namespace.clone())
            .unwrap_or_else(|| ReportConfig::DEFAULT_NAMESPACE.to_string());
        let threshold = threshold
            .or(self.default_threshold)
            .unwrap_or(ReportConfig::DEFAULT_THRESHOLD);

        ReportConfig::new(namespace, low_usage_only, threshold).context("Invalid report settings")
    }

    /// Resolve the output format from the flag or the file default
    pub fn output_format(&self, flag: Option<OutputFormat>) -> Result<OutputFormat> {
        if let Some(format) = flag {
            return Ok(format);
        }

        match &self.default_format {
            Some(name) => OutputFormat::from_str(name, true)
                .map_err(|e| anyhow!("Invalid default_format '{}' in config: {}", name, e)),
            None => Ok(OutputFormat::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "default_namespace": "shop", "default_threshold": 50, "default_format": "json" }"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.default_namespace.as_deref(), Some("shop"));
        assert_eq!(config.default_threshold, Some(50));
        assert!(matches!(
            config.output_format(None).unwrap(),
            OutputFormat::Json
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.json"))).is_err());
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let config = Config {
            default_namespace: Some("shop".to_string()),
            default_threshold: Some(50),
            default_format: Some("json".to_string()),
        };

        let report = config
            .report_config(Some("payments".to_string()), true, Some(10))
            .unwrap();
        assert_eq!(report.namespace(), "payments");
        assert_eq!(report.threshold_percent(), 10);
        assert!(report.low_usage_only());

        assert!(matches!(
            config.output_format(Some(OutputFormat::Table)).unwrap(),
            OutputFormat::Table
        ));
    }

    #[test]
    fn test_builtin_defaults() {
        let report = Config::default().report_config(None, false, None).unwrap();
        assert_eq!(report.namespace(), "default");
        assert_eq!(report.threshold_percent(), 30);
    }

    #[test]
    fn test_out_of_range_file_threshold_is_rejected() {
        let config = Config {
            default_threshold: Some(150),
            ..Default::default()
        };
        assert!(config.report_config(None, false, None).is_err());
    }

    #[test]
    fn test_unknown_default_format_is_rejected() {
        let config = Config {
            default_format: Some("yaml".to_string()),
            ..Default::default()
        };
        assert!(config.output_format(None).is_err());
    }
}
