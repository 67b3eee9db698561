//! Runtime configuration
//!
//! Loaded from an optional TOML file, then overridden by `PORTFOLIO__*`
//! environment variables (a `.env` file is honoured).

use crate::error::{PortfolioError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration; a missing file yields the defaults
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = shellexpand::tilde(path).into_owned();
        let settings = config::Config::builder()
            .add_source(config::File::from(Path::new(&path)).required(false))
            .add_source(
                config::Environment::with_prefix("PORTFOLIO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.optimizer.max_weight > 0.0 && self.optimizer.max_weight <= 1.0) {
            return Err(PortfolioError::InvalidInput(format!(
                "optimizer.max_weight must be in (0, 1], got {}",
                self.optimizer.max_weight
            )));
        }
        if self.analysis.risk_free_rate < 0.0 || !self.analysis.risk_free_rate.is_finite() {
            return Err(PortfolioError::InvalidInput(format!(
                "analysis.risk_free_rate must be a non-negative fraction, got {}",
                self.analysis.risk_free_rate
            )));
        }
        if self.data.max_concurrent_fetches == 0 {
            return Err(PortfolioError::InvalidInput(
                "data.max_concurrent_fetches must be at least 1".into(),
            ));
        }
        if self.data.request_timeout_secs == 0 || self.pipeline.run_timeout_secs == 0 {
            return Err(PortfolioError::InvalidInput("timeouts must be positive".into()));
        }
        Ok(())
    }
}

/// Price source endpoints and fetch behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_yahoo_url")]
    pub yahoo_url: String,
    #[serde(default = "default_binance_url")]
    pub binance_url: String,
    #[serde(default = "default_fred_url")]
    pub fred_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-attempt timeout for a single price request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Retries after the first attempt, transient failures only
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl DataConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            yahoo_url: default_yahoo_url(),
            binance_url: default_binance_url(),
            fred_url: default_fred_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

/// Constrained solver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Upper bound on any single weight in the mean-variance program
    #[serde(default = "default_max_weight")]
    pub max_weight: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_time_limit_secs")]
    pub time_limit_secs: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_weight: default_max_weight(),
            max_iterations: default_max_iterations(),
            time_limit_secs: default_time_limit_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Annual risk-free rate as a fraction (0.02 = 2%)
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: default_risk_free_rate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Wall-clock cap for a full run
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
}

impl PipelineConfig {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            run_timeout_secs: default_run_timeout_secs(),
        }
    }
}

fn default_yahoo_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_binance_url() -> String {
    "https://api.binance.com".to_string()
}

fn default_fred_url() -> String {
    "https://fred.stlouisfed.org".to_string()
}

fn default_user_agent() -> String {
    format!("portfolio-optimizer/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_max_weight() -> f64 {
    0.7
}

fn default_max_iterations() -> u32 {
    200
}

fn default_time_limit_secs() -> f64 {
    10.0
}

fn default_risk_free_rate() -> f64 {
    0.02
}

fn default_run_timeout_secs() -> u64 {
    300
}
