//! Configuration file support for Lift.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/lift/config.toml`.

use crate::{Error, PlateEntry, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub training: TrainingConfig,

    #[serde(default)]
    pub plates: PlatesConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Defaults applied when creating starter data
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_weight_increment")]
    pub default_weight_increment: f64,

    #[serde(default = "default_rest_seconds")]
    pub default_rest_seconds: u32,

    #[serde(default = "default_barbell_weight")]
    pub default_barbell_weight: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            default_weight_increment: default_weight_increment(),
            default_rest_seconds: default_rest_seconds(),
            default_barbell_weight: default_barbell_weight(),
        }
    }
}

/// Plate calculator configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PlatesConfig {
    /// Overrides the stored inventory when set
    #[serde(default)]
    pub inventory: Option<Vec<PlateEntry>>,
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| home_dir().join(".local/share"))
        .join("lift")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_weight_increment() -> f64 {
    5.0
}

fn default_rest_seconds() -> u32 {
    90
}

fn default_barbell_weight() -> f64 {
    45.0
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| home_dir().join(".config"))
            .join("lift")
            .join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(self.training.default_weight_increment > 0.0) {
            return Err(Error::Config(format!(
                "default_weight_increment must be positive, got {}",
                self.training.default_weight_increment
            )));
        }
        if self.training.default_barbell_weight < 0.0 {
            return Err(Error::Config(format!(
                "default_barbell_weight must not be negative, got {}",
                self.training.default_barbell_weight
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.training.default_weight_increment, 5.0);
        assert_eq!(config.training.default_rest_seconds, 90);
        assert_eq!(config.training.default_barbell_weight, 45.0);
        assert!(config.plates.inventory.is_none());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.plates.inventory = Some(vec![PlateEntry {
            weight: 20.0,
            count: 6,
        }]);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.plates.inventory, config.plates.inventory);
        assert_eq!(loaded.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[training]
default_weight_increment = 2.5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.training.default_weight_increment, 2.5);
        assert_eq!(config.training.default_rest_seconds, 90); // default
    }

    #[test]
    fn test_invalid_increment_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[training]\ndefault_weight_increment = 0.0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
