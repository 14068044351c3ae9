use crate::error::MetricsError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Default k-sets used when a metric is requested by bare name.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_ks")]
    pub recall_ks: Vec<usize>,
    #[serde(default = "default_ks")]
    pub ndcg_ks: Vec<usize>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            recall_ks: default_ks(),
            ndcg_ks: default_ks(),
        }
    }
}

fn default_ks() -> Vec<usize> {
    vec![5, 10, 20]
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in RECMETRICS_CONFIG environment variable
    /// 2. ./recmetrics.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("RECMETRICS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("recmetrics.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml(&config_str)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("Failed to parse recmetrics.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        check_ks("metrics.recall_ks", &self.metrics.recall_ks)?;
        check_ks("metrics.ndcg_ks", &self.metrics.ndcg_ks)?;
        Ok(())
    }
}

fn check_ks(field: &str, ks: &[usize]) -> crate::error::Result<()> {
    if ks.is_empty() {
        return Err(MetricsError::Config(format!("{} must list at least one k", field)));
    }
    if ks.contains(&0) {
        return Err(MetricsError::Config(format!(
            "{} values must be greater than 0",
            field
        )));
    }
    Ok(())
}
