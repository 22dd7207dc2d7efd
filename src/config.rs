//! Engine configuration.
//!
//! ```toml
//! model_path = "artifacts/model.json"
//! catalog_path = "artifacts/clusters.json"
//! population_path = "data/welcome_survey_simple_v2.csv"
//! delimiter = ";"
//! strict_validation = true
//! ```
//!
//! Every key is optional; missing keys take the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Default model artifact path.
pub const DEFAULT_MODEL_PATH: &str = "welcome_survey_clustering_pipeline_v2.json";
/// Default catalog path.
pub const DEFAULT_CATALOG_PATH: &str = "welcome_survey_cluster_names_and_descriptions_v2.json";
/// Default reference population path.
pub const DEFAULT_POPULATION_PATH: &str = "welcome_survey_simple_v2.csv";
/// Default population field delimiter.
pub const DEFAULT_DELIMITER: char = ';';

/// Where the engine's artifacts live and how to read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cluster model artifact (JSON).
    pub model_path: PathBuf,
    /// Cluster catalog (JSON).
    pub catalog_path: PathBuf,
    /// Raw reference population (delimited text).
    pub population_path: PathBuf,
    /// Population field delimiter.
    pub delimiter: char,
    /// Reject out-of-domain values instead of encoding them as zero.
    pub strict_validation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            population_path: PathBuf::from(DEFAULT_POPULATION_PATH),
            delimiter: DEFAULT_DELIMITER,
            strict_validation: true,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML config.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| {
            warn!(error = %e, "rejecting engine config");
            Error::InvalidParameter {
                name: "config",
                message: "not a valid engine config TOML document",
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "cannot read engine config");
            Error::InvalidParameter {
                name: "config",
                message: "config file could not be read",
            }
        })?;
        Self::from_toml(&text)
    }

    /// Check parameter values.
    pub fn validate(&self) -> Result<()> {
        if matches!(self.delimiter, '"' | '\n' | '\r') {
            return Err(Error::InvalidParameter {
                name: "delimiter",
                message: "must not be a quote or line break",
            });
        }
        if !self.delimiter.is_ascii() {
            return Err(Error::InvalidParameter {
                name: "delimiter",
                message: "must be a single ASCII character",
            });
        }
        Ok(())
    }

    /// Set the model artifact path.
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    /// Set the catalog path.
    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = path.into();
        self
    }

    /// Set the population path.
    pub fn with_population_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.population_path = path.into();
        self
    }

    /// Set the population delimiter.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Enable or disable strict validation.
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }
}
