use super::parse_env;
use anyhow::Result;

/// Forest hyperparameters. The seed is fixed by default so repeated fits on
/// identical data reproduce bit-identical predictions.
#[derive(Debug, Clone)]
pub struct ModelEnvConfig {
    pub n_trees: usize,
    pub max_depth: u16,
    pub seed: u64,
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            n_trees: parse_env("MODEL_N_TREES", 100)?,
            max_depth: parse_env("MODEL_MAX_DEPTH", 10)?,
            seed: parse_env("MODEL_SEED", 42)?,
        })
    }
}
