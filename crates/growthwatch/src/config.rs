//! Configuration management for growthwatch.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::assessment::DEFAULT_HORIZON_YEARS;
use crate::error::{Error, Result};
use crate::estimator::LinearEstimator;
use crate::range::DEFAULT_Z_SCORE;
use crate::reference::MAX_AGE_MONTHS;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "growthwatch";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "reference.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `GROWTHWATCH_`, sections separated
///    by `__`, e.g. `GROWTHWATCH_GROWTH__Z_SCORE=1.88`)
/// 2. TOML config file at `~/.config/growthwatch/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reference data configuration.
    pub reference: ReferenceConfig,
    /// Growth evaluation configuration.
    pub growth: GrowthConfig,
    /// Height estimator coefficients.
    pub estimator: LinearEstimator,
}

/// Reference data configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Path to the reference database file.
    /// Defaults to `~/.local/share/growthwatch/reference.db`
    pub database_path: Option<PathBuf>,
}

/// Growth evaluation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Magnitude of the z-scores bounding the expected range.
    pub z_score: f64,
    /// Years added to the current age before classifying a prediction.
    pub horizon_years: u32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            z_score: DEFAULT_Z_SCORE,
            horizon_years: DEFAULT_HORIZON_YEARS,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("GROWTHWATCH_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.growth.z_score.is_finite() || self.growth.z_score <= 0.0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "z_score must be a positive number, got {}",
                    self.growth.z_score
                ),
            });
        }

        let max_horizon = MAX_AGE_MONTHS / 12;
        if self.growth.horizon_years > max_horizon {
            return Err(Error::ConfigValidation {
                message: format!(
                    "horizon_years ({}) cannot exceed {max_horizon}",
                    self.growth.horizon_years
                ),
            });
        }

        self.estimator.validate()
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.reference
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.reference.database_path.is_none());
        assert!((config.growth.z_score - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.growth.horizon_years, 0);
        assert_eq!(config.estimator, LinearEstimator::default());
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_z_score() {
        let mut config = Config::default();
        config.growth.z_score = 0.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("z_score"));
    }

    #[test]
    fn test_validate_nan_z_score() {
        let mut config = Config::default();
        config.growth.z_score = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_horizon_too_large() {
        let mut config = Config::default();
        config.growth.horizon_years = 20;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("horizon_years"));
    }

    #[test]
    fn test_validate_estimator_coefficients() {
        let mut config = Config::default();
        config.estimator.bmi = f64::INFINITY;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("'bmi'"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("reference.db"));
        assert!(path.to_string_lossy().contains("growthwatch"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.reference.database_path = Some(PathBuf::from("/custom/path/who.db"));

        assert_eq!(config.database_path(), PathBuf::from("/custom/path/who.db"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("growthwatch"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[growth]\nz_score = 1.5\n\n[estimator]\nintercept = 6.0\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert!((config.growth.z_score - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.growth.horizon_years, 0);
        assert!((config.estimator.intercept - 6.0).abs() < f64::EPSILON);
        assert!((config.estimator.height - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[growth]\nz_score = -1.0\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("z_score"));
        assert!(json.contains("horizon_years"));
        assert!(json.contains("intercept"));
    }

    #[test]
    fn test_growth_config_deserialize_partial() {
        let growth: GrowthConfig = serde_json::from_str(r#"{"horizon_years": 2}"#).unwrap();
        assert_eq!(growth.horizon_years, 2);
        assert!((growth.z_score - 2.0).abs() < f64::EPSILON);
    }
}
