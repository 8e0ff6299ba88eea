//! Configuration for docstore
//!
//! `ds` reads the `storage` section of the tripplan config file, so both
//! tools open the same store without extra setup. Other sections are
//! ignored. An `output` section controls how documents are printed:
//!
//! ```yaml
//! storage:
//!   store-dir: ~/.local/share/tripplan/store
//! output:
//!   pretty: false
//! ```

use eyre::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The parts of the tripplan config file that `ds` understands
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub output: OutputConfig,
}

/// Where the document store lives
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(rename = "store-dir")]
    pub store_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let store_dir = dirs::data_local_dir()
            .map(|d| d.join("tripplan").join("store"))
            .unwrap_or_else(|| PathBuf::from(".tripplan-store"));
        Self { store_dir }
    }
}

/// How documents are printed
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON bodies
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Config {
    /// Load from `path`, else `.tripplan.yml`, else the user tripplan config, else defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let candidates = [
            Some(PathBuf::from(".tripplan.yml")),
            dirs::config_dir().map(|p| p.join("tripplan").join("tripplan.yml")),
        ];
        for candidate in candidates.iter().flatten() {
            if candidate.exists() {
                match Self::load_from_file(candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => warn!("Failed to load config from {}: {}", candidate.display(), e),
                }
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_storage_from_tripplan_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tripplan.yml");
        std::fs::write(
            &path,
            r#"
directions:
  provider: google
  default-mode: WALKING
storage:
  store-dir: /tmp/shared-store
output:
  pretty: false
"#,
        )
        .unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.storage.store_dir, PathBuf::from("/tmp/shared-store"));
        assert!(!loaded.output.pretty);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = serde_yaml::from_str("directions:\n  timeout-ms: 5\n").unwrap();
        assert!(config.storage.store_dir.ends_with("store"));
        assert!(config.output.pretty);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(Config::load(Some(&temp.path().join("absent.yml"))).is_err());
    }
}
