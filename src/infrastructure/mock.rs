//! Deterministic test doubles for the collaborator ports. Used by the
//! integration tests and by the CLI's mock mode.

use crate::domain::errors::DataError;
use crate::domain::market::{
    Interval, PriceBar, PriceSeries, Timeframe, normalize_crypto_symbol,
};
use crate::domain::ports::{
    ChartArtifact, ChartRenderer, MarketDataProvider, NarrativeGenerator, NarrativeInput,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

/// In-memory market data source. Either serves preset series verbatim, or
/// synthesizes a deterministic history per symbol. Unknown symbols in preset
/// mode fail with `NoData`, mirroring the live provider's contract.
pub struct MockMarketData {
    preset: HashMap<String, PriceSeries>,
    synthesize: bool,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            preset: HashMap::new(),
            synthesize: true,
        }
    }

    /// Preset-only provider: serves exactly the given series and nothing
    /// else.
    pub fn with_series(symbol: &str, series: PriceSeries) -> Self {
        let mut preset = HashMap::new();
        preset.insert(symbol.to_string(), series);
        Self {
            preset,
            synthesize: false,
        }
    }

    pub fn insert(&mut self, symbol: &str, series: PriceSeries) {
        self.preset.insert(symbol.to_string(), series);
    }
}

impl Default for MockMarketData {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        interval: Interval,
    ) -> Result<PriceSeries> {
        let symbol = normalize_crypto_symbol(symbol);
        if let Some(series) = self.preset.get(&symbol) {
            return Ok(series.clone());
        }
        if self.synthesize {
            // Roughly one bar per trading day over the span
            let bars = (timeframe.to_days() * 5 / 7).max(60) as usize;
            return Ok(synthetic_series(&symbol, bars));
        }
        Err(DataError::NoData {
            symbol,
            range: format!("{}/{}", timeframe, interval),
        }
        .into())
    }
}

/// Deterministic OHLCV history: a gentle trend plus two sine components,
/// seeded by the symbol so distinct symbols get distinct but stable shapes.
pub fn synthetic_series(symbol: &str, bars: usize) -> PriceSeries {
    let seed: u32 = symbol.bytes().map(u32::from).sum();
    let phase = f64::from(seed % 17);
    let base = 50.0 + f64::from(seed % 200);

    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let bars = (0..bars)
        .map(|i| {
            let t = i as f64;
            let close = base
                + t * 0.15
                + (t / 9.0 + phase).sin() * base * 0.03
                + (t / 31.0 + phase).cos() * base * 0.05;
            let spread = close * 0.01;
            PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: Some(close - spread * 0.3),
                high: Some(close + spread),
                low: Some(close - spread),
                close: Some(close),
                adj_close: None,
                price: None,
                volume: Some(1_000_000.0 + (t / 5.0 + phase).sin() * 100_000.0),
            }
        })
        .collect();
    PriceSeries::new(bars).expect("synthetic bars are ordered by construction")
}

/// Renderer double: hands back an empty artifact without drawing anything.
pub struct NullChartRenderer;

#[async_trait]
impl ChartRenderer for NullChartRenderer {
    async fn render(&self, _symbol: &str, _frame: &crate::domain::signals::SignalFrame) -> Result<ChartArtifact> {
        Ok(ChartArtifact {
            content_type: "image/png".to_string(),
            bytes: Vec::new(),
        })
    }
}

/// Narrative double: formats the statistics itself instead of calling out.
pub struct CannedNarrative;

#[async_trait]
impl NarrativeGenerator for CannedNarrative {
    async fn commentary(&self, symbol: &str, input: &NarrativeInput) -> Result<String> {
        Ok(format!(
            "{}: {} trades ({} buys, {} sells), price change {:.2}%.",
            symbol,
            input.stats.trade_count,
            input.stats.buy_signals,
            input.stats.sell_signals,
            input.stats.price_change_pct,
        ))
    }
}
