//! Configuration module for marketcast.
//!
//! Structured configuration loading from environment variables, organized by
//! concern: Provider, Model, and Strategy.

mod model_config;
mod provider_config;
mod strategy_config;

pub use model_config::ModelEnvConfig;
pub use provider_config::ProviderEnvConfig;
pub use strategy_config::StrategyEnvConfig;

use crate::application::forecast::ModelParams;
use crate::domain::market::{Interval, Timeframe};
use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Market data source selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Mock,
    Yahoo,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Mode::Mock),
            "yahoo" => Ok(Mode::Yahoo),
            _ => anyhow::bail!("Invalid MODE: {}. Must be 'mock' or 'yahoo'", s),
        }
    }
}

/// Main application configuration, aggregating the per-concern sub-configs.
#[derive(Debug, Clone)]
pub struct Config {
    // Core
    pub mode: Mode,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub interval: Interval,

    // Provider (from ProviderEnvConfig)
    pub provider_base_url: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,

    // Model (from ModelEnvConfig)
    pub n_trees: usize,
    pub max_depth: u16,
    pub seed: u64,

    // Strategy (from StrategyEnvConfig)
    pub short_window: usize,
    pub long_window: usize,
    pub results_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mode = env_or("MODE", "mock").parse()?;
        let provider = ProviderEnvConfig::from_env()?;
        let model = ModelEnvConfig::from_env()?;
        let strategy = StrategyEnvConfig::from_env()?;

        Ok(Self {
            mode,
            symbol: env_or("SYMBOL", "NVDA"),
            timeframe: env_or("TIMEFRAME", "1Y").parse()?,
            interval: env_or("INTERVAL", "day").parse()?,
            provider_base_url: provider.base_url,
            openai_api_key: provider.openai_api_key,
            openai_base_url: provider.openai_base_url,
            openai_model: provider.openai_model,
            n_trees: model.n_trees,
            max_depth: model.max_depth,
            seed: model.seed,
            short_window: strategy.short_window,
            long_window: strategy.long_window,
            results_dir: strategy.results_dir,
        })
    }

    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            seed: self.seed,
        }
    }
}

pub(crate) fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub(crate) fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
