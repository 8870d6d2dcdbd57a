use crate::domain::market::{Interval, PriceSeries, Timeframe};
use crate::domain::signals::{SignalFrame, SignalStats};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Historical price source. Implementations must fail with a descriptive
/// error (`DataError::NoData`) when the symbol/range resolves to nothing,
/// never return an empty series.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        interval: Interval,
    ) -> Result<PriceSeries>;
}

/// Rendered chart handed back to whatever surface asked for it. The core
/// never interprets the bytes.
#[derive(Debug, Clone)]
pub struct ChartArtifact {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(&self, symbol: &str, frame: &SignalFrame) -> Result<ChartArtifact>;
}

/// Everything the narrative generator is given. The reply is commentary
/// only; no core decision depends on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeInput {
    pub stats: SignalStats,
    pub last_price: f64,
    pub short_mavg: f64,
    pub long_mavg: f64,
}

#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn commentary(&self, symbol: &str, input: &NarrativeInput) -> Result<String>;
}
