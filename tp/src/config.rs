//! tripplan configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::TransportMode;

/// Main tripplan configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directions provider configuration
    pub directions: DirectionsConfig,

    /// Storage configuration
    pub storage: StorageConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the directions API key is available. Call this before any
    /// command that needs travel-time estimates.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.directions.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "Directions API key not found. Set the {} environment variable.",
                self.directions.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .tripplan.yml
        let local_config = PathBuf::from(".tripplan.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/tripplan/tripplan.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tripplan").join("tripplan.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Directions provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionsConfig {
    /// Provider name (currently only "google" supported)
    pub provider: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Per-leg request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Mode used for legs that have never been assigned one
    #[serde(rename = "default-mode")]
    pub default_mode: TransportMode,
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            api_key_env: "GOOGLE_MAPS_API_KEY".to_string(),
            base_url: "https://maps.googleapis.com".to_string(),
            timeout_ms: 10_000,
            default_mode: TransportMode::Driving,
        }
    }
}

impl DirectionsConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).context(format!("Environment variable {} is not set", self.api_key_env))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the document store
    #[serde(rename = "store-dir")]
    pub store_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/tripplan on Linux)
        let store_dir = dirs::data_local_dir()
            .map(|d| d.join("tripplan").join("store"))
            .unwrap_or_else(|| PathBuf::from(".tripplan-store"));

        Self { store_dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.directions.provider, "google");
        assert_eq!(config.directions.api_key_env, "GOOGLE_MAPS_API_KEY");
        assert_eq!(config.directions.default_mode, TransportMode::Driving);
        assert_eq!(config.directions.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
directions:
  provider: google
  api-key-env: MY_MAPS_KEY
  base-url: http://localhost:9999
  timeout-ms: 2500
  default-mode: WALKING

storage:
  store-dir: /tmp/tripplan-test
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.directions.api_key_env, "MY_MAPS_KEY");
        assert_eq!(config.directions.base_url, "http://localhost:9999");
        assert_eq!(config.directions.timeout_ms, 2500);
        assert_eq!(config.directions.default_mode, TransportMode::Walking);
        assert_eq!(config.storage.store_dir, PathBuf::from("/tmp/tripplan-test"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
directions:
  default-mode: TRANSIT
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.directions.default_mode, TransportMode::Transit);
        assert_eq!(config.directions.provider, "google");
        assert_eq!(config.directions.timeout_ms, 10_000);
    }

    #[test]
    #[serial]
    fn test_validate_requires_api_key() {
        let mut config = Config::default();
        config.directions.api_key_env = "TRIPPLAN_TEST_MAPS_KEY".to_string();

        // SAFETY: serialized with other env-mutating tests
        unsafe { std::env::remove_var("TRIPPLAN_TEST_MAPS_KEY") };
        assert!(config.validate().is_err());
        assert!(config.directions.get_api_key().is_err());

        unsafe { std::env::set_var("TRIPPLAN_TEST_MAPS_KEY", "test-key") };
        assert!(config.validate().is_ok());
        assert_eq!(config.directions.get_api_key().unwrap(), "test-key");

        unsafe { std::env::remove_var("TRIPPLAN_TEST_MAPS_KEY") };
    }
}
