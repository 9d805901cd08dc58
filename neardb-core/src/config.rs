//! # Configuration Management
//!
//! Collection and logging configuration, loadable from TOML.
//!
//! ```toml
//! [collection]
//! name = "fruits"
//! dimension = 300
//! metric = "cosine"
//!
//! [collection.index]
//! kind = "vamana"
//! max_degree = 32
//!
//! [logging]
//! level = "debug"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::DistanceMetric;

/// Largest accepted vector dimension
pub const MAX_DIMENSION: usize = 65_536;

/// Accepted range of the certainty reference scale. Keeps every f32
/// distance convertible to a certainty and back without leaving the normal
/// f64 range.
pub const REFERENCE_SCALE_RANGE: std::ops::RangeInclusive<f64> = 1e-30..=1e30;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub collection: CollectionConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Configuration {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        Self::parse_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn parse_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).map_err(|e| Error::Configuration {
            message: format!("Failed to parse config: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.collection.validate()
    }
}

/// Per-collection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub name: String,
    /// Fixed dimensionality of every vector in the collection
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub index: IndexKindConfig,
    pub certainty: CertaintyConfig,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            dimension: 768,
            metric: DistanceMetric::Cosine,
            index: IndexKindConfig::default(),
            certainty: CertaintyConfig::default(),
        }
    }
}

impl CollectionConfig {
    pub fn new(name: impl Into<String>, dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric,
            ..Default::default()
        }
    }

    pub fn with_index(mut self, index: IndexKindConfig) -> Self {
        self.index = index;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(Error::Configuration {
                message: "Dimension cannot be 0".to_string(),
            });
        }
        if self.dimension > MAX_DIMENSION {
            return Err(Error::Configuration {
                message: format!(
                    "Dimension {} exceeds maximum of {}",
                    self.dimension, MAX_DIMENSION
                ),
            });
        }
        if let IndexKindConfig::Vamana(params) = &self.index {
            params.validate()?;
        }
        self.certainty.validate()
    }
}

/// Vector index selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IndexKindConfig {
    /// Brute-force exact search
    Flat,
    /// Vamana graph (approximate for partial result sets)
    Vamana(VamanaParams),
}

impl Default for IndexKindConfig {
    fn default() -> Self {
        IndexKindConfig::Flat
    }
}

/// Vamana graph parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VamanaParams {
    /// Max out-degree per node (R)
    pub max_degree: usize,
    /// Candidate list size during build and search (L)
    pub search_list_size: usize,
    /// RobustPrune diversity factor
    pub alpha: f32,
    /// Seed for the initial random neighborhoods
    pub seed: u64,
}

impl Default for VamanaParams {
    fn default() -> Self {
        Self {
            max_degree: 32,
            search_list_size: 64,
            alpha: 1.2,
            seed: 0x6e65_6172,
        }
    }
}

impl VamanaParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_degree < 2 {
            return Err(Error::Configuration {
                message: "Vamana max_degree must be at least 2".to_string(),
            });
        }
        if self.search_list_size < self.max_degree {
            return Err(Error::Configuration {
                message: format!(
                    "Vamana search_list_size ({}) must be >= max_degree ({})",
                    self.search_list_size, self.max_degree
                ),
            });
        }
        if !self.alpha.is_finite() || self.alpha < 1.0 {
            return Err(Error::Configuration {
                message: format!("Vamana alpha must be >= 1.0, got {}", self.alpha),
            });
        }
        Ok(())
    }
}

/// Certainty conversion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertaintyConfig {
    /// Distance at which an unbounded metric reports certainty 0.5
    pub reference_scale: f64,
}

impl Default for CertaintyConfig {
    fn default() -> Self {
        Self { reference_scale: 1.0 }
    }
}

impl CertaintyConfig {
    pub fn validate(&self) -> Result<()> {
        if !REFERENCE_SCALE_RANGE.contains(&self.reference_scale) {
            return Err(Error::Configuration {
                message: format!(
                    "Certainty reference_scale must be within [{:e}, {:e}], got {}",
                    REFERENCE_SCALE_RANGE.start(),
                    REFERENCE_SCALE_RANGE.end(),
                    self.reference_scale
                ),
            });
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
        }
    }
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_parse_vamana_section() {
        let toml = r#"
            [collection]
            name = "fruits"
            dimension = 4
            metric = "l2-squared"

            [collection.index]
            kind = "vamana"
            max_degree = 8
            search_list_size = 16
        "#;
        let config = Config::parse_str(toml).unwrap();
        assert_eq!(config.collection.dimension, 4);
        assert_eq!(config.collection.metric, DistanceMetric::L2Squared);
        match config.collection.index {
            IndexKindConfig::Vamana(params) => {
                assert_eq!(params.max_degree, 8);
                assert_eq!(params.search_list_size, 16);
                assert!((params.alpha - 1.2).abs() < f32::EPSILON);
            }
            other => panic!("expected vamana, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let toml = r#"
            [collection]
            dimension = 0
        "#;
        assert!(matches!(
            Config::parse_str(toml),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_bad_reference_scale_rejected() {
        let mut config = CollectionConfig::new("c", 3, DistanceMetric::Manhattan);
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e-40, 1e40] {
            config.certainty.reference_scale = scale;
            assert!(config.validate().is_err(), "accepted {}", scale);
        }
        config.certainty.reference_scale = 1e30;
        assert!(config.validate().is_ok());
    }
}
