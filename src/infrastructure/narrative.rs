//! Chat-completions narrative generator.
//!
//! Turns aggregate signal statistics into free-text commentary via an
//! OpenAI-compatible endpoint. The reply is presentation-only; callers never
//! branch on it, and any failure surfaces as the port's error.

use crate::domain::ports::{NarrativeGenerator, NarrativeInput};
use crate::infrastructure::core::http_client_factory::HttpClientFactory;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are a professional stock market analyst.";

pub struct OpenAiNarrative {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiNarrative {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            api_key,
            base_url,
            model,
        }
    }

    fn build_prompt(symbol: &str, input: &NarrativeInput) -> String {
        format!(
            "Analyze this trading data for {}:\n\
             - Total number of trades: {}\n\
             - Buy signals: {}\n\
             - Sell signals: {}\n\
             - Price change: {:.2}%\n\
             - Current price trend relative to moving averages:\n\
               Last price: {:.2}\n\
               Short MA: {:.2}\n\
               Long MA: {:.2}\n\n\
             Provide a brief trading analysis and recommendation.",
            symbol,
            input.stats.trade_count,
            input.stats.buy_signals,
            input.stats.sell_signals,
            input.stats.price_change_pct,
            input.last_price,
            input.short_mavg,
            input.long_mavg,
        )
    }
}

#[async_trait]
impl NarrativeGenerator for OpenAiNarrative {
    async fn commentary(&self, symbol: &str, input: &NarrativeInput) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Self::build_prompt(symbol, input),
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("chat completion request failed")?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("chat completion returned HTTP {}", status);
        }

        let payload: ChatResponse = response
            .json()
            .await
            .context("decoding chat completion payload")?;
        payload
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("chat completion carried no choices")
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signals::SignalStats;

    #[test]
    fn test_prompt_carries_every_statistic() {
        let input = NarrativeInput {
            stats: SignalStats {
                trade_count: 7,
                buy_signals: 4,
                sell_signals: 3,
                price_change_pct: 12.345,
            },
            last_price: 104.56,
            short_mavg: 103.2,
            long_mavg: 101.9,
        };
        let prompt = OpenAiNarrative::build_prompt("NVDA", &input);
        assert!(prompt.contains("NVDA"));
        assert!(prompt.contains("Total number of trades: 7"));
        assert!(prompt.contains("Buy signals: 4"));
        assert!(prompt.contains("Sell signals: 3"));
        assert!(prompt.contains("12.35%"));
        assert!(prompt.contains("Last price: 104.56"));
    }
}
