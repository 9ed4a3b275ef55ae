//! Node configuration.
//!
//! Loaded from an optional TOML file; every key has a default so an empty
//! file (or no file at all) gives the stock node:
//!
//! ```toml
//! [node]
//! name = "lidar_filters"
//! topic = "/scan"
//! error_policy = "shutdown"
//!
//! [fit]
//! residual_threshold = 5.0
//! seed = 0
//!
//! [view]
//! mode = "snapshot"
//! output_dir = "scans"
//!
//! [logging]
//! level = "info"
//! ```

use crate::constants::{NODE_NAME, PLOT_HEIGHT, PLOT_WIDTH, SCAN_TOPIC};
use crate::error::Result;
use crate::ransac::RansacConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub node: NodeConfig,
    pub fit: RansacConfig,
    pub view: ViewConfig,
    pub logging: LoggingConfig,
}

/// What to do when a scan cannot be processed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log the error and tear the node down.
    #[default]
    Shutdown,
    /// Log the error and wait for the next scan.
    Skip,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub name: String,
    pub topic: String,
    pub error_policy: ErrorPolicy,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: NODE_NAME.to_string(),
            topic: SCAN_TOPIC.to_string(),
            error_policy: ErrorPolicy::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// No visualisation.
    Off,
    /// PNG file per scan.
    #[default]
    Snapshot,
    /// Blocking window per scan.
    Window,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub mode: ViewMode,
    pub output_dir: PathBuf,
    /// Keep one file per scan instead of overwriting `latest.png`.
    pub keep_all: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            mode: ViewMode::default(),
            output_dir: PathBuf::from("scans"),
            keep_all: false,
            width: PLOT_WIDTH,
            height: PLOT_HEIGHT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl FilterConfig {
    pub fn load(path: &Path) -> Result<FilterConfig> {
        let content = fs::read_to_string(path)?;
        FilterConfig::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<FilterConfig> {
        let config: FilterConfig = toml::from_str(content)?;
        config.fit.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LidarFilterError;

    #[test]
    fn test_defaults() {
        let config = FilterConfig::from_toml("").unwrap();
        assert_eq!(config, FilterConfig::default());
        assert_eq!(config.node.name, "lidar_filters");
        assert_eq!(config.node.topic, "/scan");
        assert_eq!(config.node.error_policy, ErrorPolicy::Shutdown);
        assert_eq!(config.fit.residual_threshold, 5.0);
        assert_eq!(config.fit.seed, 0);
        assert_eq!(config.view.mode, ViewMode::Snapshot);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file() {
        let config = FilterConfig::from_toml(
            r#"
            [node]
            topic = "/front/scan"
            error_policy = "skip"

            [fit]
            residual_threshold = 0.05
            max_trials = 250

            [view]
            mode = "off"
            "#,
        )
        .unwrap();
        assert_eq!(config.node.name, "lidar_filters");
        assert_eq!(config.node.topic, "/front/scan");
        assert_eq!(config.node.error_policy, ErrorPolicy::Skip);
        assert_eq!(config.fit.residual_threshold, 0.05);
        assert_eq!(config.fit.max_trials, 250);
        assert_eq!(config.fit.min_samples, 2);
        assert_eq!(config.view.mode, ViewMode::Off);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            FilterConfig::from_toml("[fit]\nresidual_threshold = -1.0"),
            Err(LidarFilterError::InvalidConfig(_))
        ));
        assert!(matches!(
            FilterConfig::from_toml("[view]\nmode = \"hologram\""),
            Err(LidarFilterError::Config(_))
        ));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filter.toml");
        fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(FilterConfig::load(&path).unwrap().logging.level, "debug");
        assert!(matches!(
            FilterConfig::load(&dir.path().join("missing.toml")),
            Err(LidarFilterError::IoError(_))
        ));
    }
}
