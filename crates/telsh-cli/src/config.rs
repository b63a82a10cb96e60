//! Client configuration at `~/.telsh/config.toml`.
//!
//! Provides default port and log directory settings. CLI flags always
//! override config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default connection settings.
    #[serde(default)]
    pub default: DefaultConfig,
}

/// Default connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultConfig {
    /// Default destination port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Default transcript log directory.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_port() -> u16 {
    23
}

fn default_log_dir() -> String {
    "./log/".to_string()
}

impl Config {
    /// Load configuration from a TOML file, returning defaults if the file
    /// does not exist.
    pub fn load(path: &str) -> Result<Self> {
        let path = Path::new(path);
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.default.port, 23);
        assert_eq!(cfg.default.log_dir, "./log/");
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[default]
port = 2323
log_dir = "/var/log/telsh/"
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.default.port, 2323);
        assert_eq!(cfg.default.log_dir, "/var/log/telsh/");
    }

    #[test]
    fn parse_partial_toml_config() {
        let toml_str = r#"
[default]
port = 22
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.default.port, 22);
        assert_eq!(cfg.default.log_dir, "./log/"); // default
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = Config::load("/nonexistent/telsh/config.toml").unwrap();
        assert_eq!(cfg.default.port, 23);
    }
}
