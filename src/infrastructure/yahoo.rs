//! Yahoo-style chart API market data provider.
//!
//! Fetches historical bars over the public chart JSON endpoint and maps them
//! into the domain [`PriceSeries`]. Transient HTTP failures retry through
//! the shared client factory; an empty result is a `DataError::NoData`, not
//! an empty series.

use crate::domain::errors::DataError;
use crate::domain::market::{Interval, PriceBar, PriceSeries, Timeframe, normalize_crypto_symbol};
use crate::domain::ports::MarketDataProvider;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

pub struct YahooMarketData {
    client: ClientWithMiddleware,
    base_url: String,
}

impl YahooMarketData {
    pub fn new(base_url: String) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            base_url,
        }
    }

    fn chart_url(&self, symbol: &str, timeframe: Timeframe, interval: Interval) -> String {
        let period2 = Utc::now().timestamp();
        let period1 = period2 - timeframe.to_days() * 86_400;
        build_url_with_query(
            &format!("{}/v8/finance/chart/{}", self.base_url, symbol),
            &[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", interval.to_provider_string().to_string()),
                ("events", "history".to_string()),
            ],
        )
    }
}

#[async_trait]
impl MarketDataProvider for YahooMarketData {
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        interval: Interval,
    ) -> Result<PriceSeries> {
        let symbol = normalize_crypto_symbol(symbol);
        let range = format!("{}/{}", timeframe, interval);
        let url = self.chart_url(&symbol, timeframe, interval);
        debug!(%symbol, %range, "fetching chart data");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("chart request for {} failed", symbol))?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("chart request for {} returned HTTP {}", symbol, status);
        }

        let payload: ChartResponse = response
            .json()
            .await
            .with_context(|| format!("decoding chart payload for {}", symbol))?;

        let result = payload
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| DataError::NoData {
                symbol: symbol.clone(),
                range: range.clone(),
            })?;

        let timestamps = result.timestamp.unwrap_or_default();
        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .unwrap_or_default();
        let adjclose = result
            .indicators
            .adjclose
            .and_then(|mut a| if a.is_empty() { None } else { Some(a.remove(0)) });

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, ts) in timestamps.iter().enumerate() {
            let date = match DateTime::from_timestamp(*ts, 0) {
                Some(dt) => dt.date_naive(),
                None => continue,
            };
            // Intraday duplicates of the same calendar date collapse onto
            // the first bar seen
            if bars
                .last()
                .is_some_and(|prev: &PriceBar| prev.date >= date)
            {
                continue;
            }
            bars.push(PriceBar {
                date,
                open: pick(&quote.open, i),
                high: pick(&quote.high, i),
                low: pick(&quote.low, i),
                close: pick(&quote.close, i),
                adj_close: adjclose.as_ref().and_then(|a| pick(&a.adjclose, i)),
                price: None,
                volume: pick(&quote.volume, i),
            });
        }

        if bars.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.clone(),
                range,
            }
            .into());
        }

        info!(%symbol, bars = bars.len(), "chart data fetched");
        Ok(PriceSeries::new(bars)?)
    }
}

fn pick(column: &Option<Vec<Option<f64>>>, i: usize) -> Option<f64> {
    column.as_ref().and_then(|c| c.get(i).copied().flatten())
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}
