use super::env_or;
use crate::infrastructure::narrative;
use crate::infrastructure::yahoo;
use anyhow::Result;

/// External-service endpoints and credentials.
#[derive(Debug, Clone)]
pub struct ProviderEnvConfig {
    pub base_url: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
}

impl ProviderEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env_or("PROVIDER_BASE_URL", yahoo::DEFAULT_BASE_URL),
            openai_api_key: env_or("OPENAI_API_KEY", ""),
            openai_base_url: env_or("OPENAI_BASE_URL", narrative::DEFAULT_BASE_URL),
            openai_model: env_or("OPENAI_MODEL", narrative::DEFAULT_MODEL),
        })
    }
}
