//! Configuration file support for CSCV runs.
//!
//! Allows loading run parameters from TOML files for reproducibility:
//!
//! ```toml
//! [cscv]
//! n_blocks = 8
//! collect_logits = false
//!
//! [data]
//! path = "data/SPX.txt"
//! max_lookback = 10
//! ```

use crate::cscv::CscvConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Complete CSCV run configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CscvFileConfig {
    /// Engine settings.
    #[serde(default)]
    pub cscv: CscvSettings,
    /// Market data settings.
    #[serde(default)]
    pub data: DataSettings,
}

/// Engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CscvSettings {
    /// Number of blocks to partition the observations into.
    #[serde(default = "default_n_blocks")]
    pub n_blocks: usize,
    /// Whether to record per-combination relative-rank logits.
    #[serde(default)]
    pub collect_logits: bool,
}

fn default_n_blocks() -> usize {
    8
}

impl Default for CscvSettings {
    fn default() -> Self {
        Self {
            n_blocks: 8,
            collect_logits: false,
        }
    }
}

/// Market data settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    /// Path to the market history file (`YYYYMMDD price` records).
    pub path: Option<String>,
    /// Maximum moving-average lookback for the crossover returns matrix.
    #[serde(default = "default_max_lookback")]
    pub max_lookback: usize,
}

fn default_max_lookback() -> usize {
    10
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_lookback: 10,
        }
    }
}

impl CscvFileConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Build the engine configuration from these settings.
    pub fn to_cscv_config(&self) -> CscvConfig {
        CscvConfig {
            n_blocks: self.cscv.n_blocks,
            collect_logits: self.cscv.collect_logits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [cscv]
            n_blocks = 12
            collect_logits = true

            [data]
            path = "data/SPX.txt"
            max_lookback = 20
        "#;

        let config = CscvFileConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.cscv.n_blocks, 12);
        assert!(config.cscv.collect_logits);
        assert_eq!(config.data.path.as_deref(), Some("data/SPX.txt"));
        assert_eq!(config.data.max_lookback, 20);

        let engine = config.to_cscv_config();
        assert_eq!(engine.n_blocks, 12);
        assert!(engine.collect_logits);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = CscvFileConfig::from_toml_str("").unwrap();
        assert_eq!(config.cscv.n_blocks, 8);
        assert!(!config.cscv.collect_logits);
        assert!(config.data.path.is_none());
        assert_eq!(config.data.max_lookback, 10);
    }

    #[test]
    fn test_partial_section() {
        let config = CscvFileConfig::from_toml_str("[cscv]\nn_blocks = 4\n").unwrap();
        assert_eq!(config.cscv.n_blocks, 4);
        assert!(!config.cscv.collect_logits);
    }
}
