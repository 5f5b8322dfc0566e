//! Configuration module for the pseudoc CLI.
//!
//! `spec.md` §6 leaves the host free to expose a config file; this reads an
//! optional `pseudoc.toml` from the current directory and lets CLI flags
//! override whatever it sets.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "pseudoc.toml";

/// Application configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Run the peephole optimiser (`spec.md` §4.5) before executing or
    /// emitting IR. On by default; `--no-optimize` disables it for one run.
    #[serde(default = "default_true")]
    pub optimize: bool,

    /// Seed for `RAND` (`spec.md` §4.6) so a run can be reproduced exactly.
    /// Unset means the VM draws its own seed from entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,

    /// How many VM steps `pseudoc run --interactive` executes between
    /// cooperative yields back to the host loop (`spec.md` §5).
    #[serde(default = "default_yield_every")]
    pub driver_yield_every: u64,

    /// Default `--format` for `pseudoc run`/`pseudoc compile` when the flag
    /// is not given on the command line.
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_true() -> bool {
    true
}

fn default_yield_every() -> u64 {
    1000
}

fn default_format() -> String {
    "text".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            optimize: default_true(),
            rng_seed: None,
            driver_yield_every: default_yield_every(),
            format: default_format(),
        }
    }
}

impl Config {
    /// Load configuration from the current directory, falling back to
    /// defaults if `pseudoc.toml` is not present.
    pub fn load() -> Result<Self> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::Config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| CliError::Config(format!("failed to parse configuration: {e}")))
    }

    /// Save configuration to a specific path, creating parent directories
    /// as needed.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("failed to serialize configuration: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = Config::default();
        assert!(config.optimize);
        assert_eq!(config.rng_seed, None);
        assert_eq!(config.driver_yield_every, 1000);
        assert_eq!(config.format, "text");
    }

    #[test]
    fn config_save_and_load_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("pseudoc.toml");

        let original = Config { optimize: false, rng_seed: Some(42), driver_yield_every: 500, format: "json".to_string() };
        original.save_to_path(&config_path).unwrap();

        let loaded = Config::load_from_path(&config_path).unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    fn load_from_nonexistent_path_is_an_error() {
        let result = Config::load_from_path(Path::new("/nonexistent/pseudoc.toml"));
        assert!(result.is_err());
    }
}
