use super::{env_or, parse_env};
use anyhow::Result;
use std::path::PathBuf;

/// Crossover windows and report output location.
#[derive(Debug, Clone)]
pub struct StrategyEnvConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub results_dir: PathBuf,
}

impl StrategyEnvConfig {
    pub fn from_env() -> Result<Self> {
        let short_window = parse_env("SHORT_WINDOW", 5)?;
        let long_window = parse_env("LONG_WINDOW", 20)?;
        if short_window == 0 || short_window >= long_window {
            anyhow::bail!(
                "SHORT_WINDOW ({}) must be positive and less than LONG_WINDOW ({})",
                short_window,
                long_window
            );
        }
        Ok(Self {
            short_window,
            long_window,
            results_dir: PathBuf::from(env_or("RESULTS_DIR", "results")),
        })
    }
}
