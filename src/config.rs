//! TOML configuration file support.
//!
//! Instead of passing role flags for every file, settings can live in a
//! config file:
//!
//! ```toml
//! # rusty-scan.toml
//! [roles]
//! scan = ["QH", "EN"]
//! counter = "CNTS"
//! monitor = "M1"
//! pol_channels = 2
//! strict = false
//!
//! [trajectory]
//! frameskip = 100
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::data::RoleConfig;

/// Root configuration structure.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Column role overrides for instrument tables.
    #[serde(default)]
    pub roles: RoleConfig,

    /// Trajectory loading settings.
    #[serde(default)]
    pub trajectory: TrajectoryConfig,
}

/// Configuration for trajectory loading.
#[derive(Debug, Default, Deserialize)]
pub struct TrajectoryConfig {
    /// Frames dropped after each kept frame.
    pub frameskip: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [roles]
            scan = ["QH", "EN"]
            counter = "CNTS"
            monitor = "M1"
            pol_channels = 2
            strict = true

            [trajectory]
            frameskip = 100
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.roles.scan, vec!["QH", "EN"]);
        assert_eq!(config.roles.counter.as_deref(), Some("CNTS"));
        assert_eq!(config.roles.monitor.as_deref(), Some("M1"));
        assert_eq!(config.roles.pol_channels, Some(2));
        assert!(config.roles.strict);
        assert_eq!(config.trajectory.frameskip, Some(100));
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [roles]
            counter = "DET"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.roles.counter.as_deref(), Some("DET"));
        assert!(config.roles.scan.is_empty());
        assert!(!config.roles.strict);
        assert_eq!(config.trajectory.frameskip, None);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.roles, RoleConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::from_str("[roles]\nstrict = \"maybe\"").is_err());
    }
}
