use crate::application::forecast::{EvaluationMetrics, Predictions, TrainingMetrics};
use crate::application::lifecycle::{ModelService, ResetOutcome};
use crate::application::signal_engine::{
    self, DEFAULT_LONG_WINDOW, DEFAULT_SHORT_WINDOW,
};
use crate::domain::errors::{DataError, ModelError, SignalError};
use crate::domain::market::{Interval, PriceSeries, Timeframe};
use crate::domain::ports::{MarketDataProvider, NarrativeGenerator, NarrativeInput};
use crate::domain::signals::{SignalFrame, SignalStats};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Request body carrying a raw `price_history` payload: one loosely-keyed
/// record per bar, exactly as chart frontends post it.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainRequest {
    pub price_history: Vec<BTreeMap<String, Value>>,
}

/// Training metrics as exposed over the API: everything except the
/// feature-importance ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub train_score: f64,
    pub test_score: f64,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl From<&TrainingMetrics> for TrainingSummary {
    fn from(m: &TrainingMetrics) -> Self {
        Self {
            train_score: m.train_score,
            test_score: m.test_score,
            mse: m.mse,
            rmse: m.rmse,
            mae: m.mae,
            r2: m.r2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainResponse {
    pub status: String,
    pub message: String,
    pub metrics: TrainingSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesPredictResponse {
    pub status: String,
    pub predictions: Predictions,
    pub current_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub symbol: String,
    pub current_price: f64,
    pub predictions: Predictions,
    pub performance: EvaluationMetrics,
}

/// One charting row. Warm-up NaN positions flatten to 0 here; the chart
/// only cares about ±1 markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub short_mavg: f64,
    pub long_mavg: f64,
    pub positions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockDataResponse {
    pub symbol: String,
    pub timeframe: String,
    pub signals: Vec<ChartPoint>,
    pub stats: SignalStats,
    pub last_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartAnalysisResponse {
    pub response: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
}

/// Structured failure payload. `kind` preserves the error taxonomy so
/// callers can branch on it instead of parsing messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub kind: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn from_error(err: &anyhow::Error) -> Self {
        Self {
            status: "error".to_string(),
            kind: classify(err).to_string(),
            message: format!("{:#}", err),
        }
    }
}

fn classify(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(model) = cause.downcast_ref::<ModelError>() {
            return match model {
                ModelError::NotTrained => "not_trained",
                ModelError::Training { .. } | ModelError::InsufficientHistory { .. } => "training",
                ModelError::FeatureSchemaMismatch { .. } => "data_schema",
                ModelError::Data(inner) => classify_data(inner),
                ModelError::Internal { .. } => "internal",
            };
        }
        if let Some(data) = cause.downcast_ref::<DataError>() {
            return classify_data(data);
        }
        if let Some(signal) = cause.downcast_ref::<SignalError>() {
            return match signal {
                SignalError::InvalidWindows { .. } => "invalid_windows",
                SignalError::Data(inner) => classify_data(inner),
            };
        }
    }
    "internal"
}

fn classify_data(err: &DataError) -> &'static str {
    match err {
        DataError::MissingPriceColumn { .. }
        | DataError::UnsortedDates { .. }
        | DataError::MissingDate { .. } => "data_schema",
        DataError::NoData { .. } | DataError::Empty => "no_data",
    }
}

/// The exposed analysis operations, routed however the enclosing surface
/// likes. Holds the collaborator ports and the shared model service;
/// constructed once and injected.
pub struct AnalysisService {
    provider: Arc<dyn MarketDataProvider>,
    narrative: Arc<dyn NarrativeGenerator>,
    models: Arc<ModelService>,
}

impl AnalysisService {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        narrative: Arc<dyn NarrativeGenerator>,
        models: Arc<ModelService>,
    ) -> Self {
        Self {
            provider,
            narrative,
            models,
        }
    }

    pub fn models(&self) -> &ModelService {
        &self.models
    }

    pub fn ping(&self) -> PingResponse {
        PingResponse {
            status: "ok".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Trains the shared model on a posted price history. Always a full
    /// refit.
    pub fn train(&self, request: &TrainRequest) -> Result<TrainResponse> {
        let series = PriceSeries::from_records(&request.price_history)?;
        let metrics = self.models.train(&series)?;
        info!(rows = series.len(), "model trained via api");
        Ok(TrainResponse {
            status: "success".to_string(),
            message: "Model trained successfully".to_string(),
            metrics: TrainingSummary::from(&metrics),
        })
    }

    /// Predicts from a posted price history, lazily training on that same
    /// history when the model has not been fit yet.
    pub fn predict_series(&self, request: &TrainRequest) -> Result<SeriesPredictResponse> {
        let series = PriceSeries::from_records(&request.price_history)?;
        self.models.ensure_trained(&series)?;
        let predictions = self.models.predict(&series)?;
        Ok(SeriesPredictResponse {
            status: "success".to_string(),
            predictions,
            current_price: series.last_price()?,
        })
    }

    /// Fetches history for the symbol, lazily trains, and reports
    /// predictions plus whole-series evaluation metrics.
    pub async fn predict(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        interval: Interval,
    ) -> Result<PredictResponse> {
        let series = self
            .provider
            .fetch(symbol, timeframe, interval)
            .await
            .with_context(|| format!("fetching {} over {}", symbol, timeframe))?;

        self.models.ensure_trained(&series)?;
        let performance = self.models.evaluate(&series)?;
        let predictions = self.models.predict(&series)?;

        Ok(PredictResponse {
            symbol: symbol.to_string(),
            current_price: series.last_price()?,
            predictions,
            performance,
        })
    }

    /// Signal rows formatted for the charting surface, plus aggregate
    /// statistics.
    pub async fn stock_data(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        interval: Interval,
    ) -> Result<StockDataResponse> {
        let series = self
            .provider
            .fetch(symbol, timeframe, interval)
            .await
            .with_context(|| format!("fetching {} over {}", symbol, timeframe))?;

        let frame =
            signal_engine::compute_signals(&series, DEFAULT_SHORT_WINDOW, DEFAULT_LONG_WINDOW)?;
        let stats = SignalStats::from_frame(&frame);
        let last_price = frame.last_row().map(|r| r.price).unwrap_or(f64::NAN);

        let signals = frame
            .rows
            .iter()
            .map(|row| ChartPoint {
                date: row.date,
                price: row.price,
                short_mavg: row.short_mavg,
                long_mavg: row.long_mavg,
                positions: if row.position.is_nan() {
                    0
                } else {
                    row.position as i64
                },
            })
            .collect();

        Ok(StockDataResponse {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            signals,
            stats,
            last_price,
        })
    }

    /// Aggregates signal statistics and hands them to the narrative port.
    /// The commentary is free text; nothing downstream depends on it.
    pub async fn chart_analysis(
        &self,
        symbol: &str,
        frame: &SignalFrame,
    ) -> Result<ChartAnalysisResponse> {
        let last = frame.last_row().context("signal frame is empty")?;
        let input = NarrativeInput {
            stats: SignalStats::from_frame(frame),
            last_price: last.price,
            short_mavg: last.short_mavg,
            long_mavg: last.long_mavg,
        };
        let response = self.narrative.commentary(symbol, &input).await?;
        Ok(ChartAnalysisResponse {
            response,
            symbol: symbol.to_string(),
        })
    }

    pub fn reset_model(&self) -> Result<ResetOutcome> {
        Ok(self.models.reset()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_walks_the_chain() {
        let err = anyhow::Error::from(ModelError::NotTrained).context("predict failed");
        assert_eq!(classify(&err), "not_trained");

        let err = anyhow::Error::from(DataError::NoData {
            symbol: "X".into(),
            range: "1Y".into(),
        });
        assert_eq!(classify(&err), "no_data");

        let err = anyhow::Error::from(ModelError::Data(DataError::MissingPriceColumn {
            available: "open".into(),
        }));
        assert_eq!(classify(&err), "data_schema");

        let err = anyhow::anyhow!("something else");
        assert_eq!(classify(&err), "internal");
    }

    #[test]
    fn test_error_response_names_kind() {
        let err = anyhow::Error::from(ModelError::NotTrained);
        let payload = ErrorResponse::from_error(&err);
        assert_eq!(payload.status, "error");
        assert_eq!(payload.kind, "not_trained");
        assert!(payload.message.contains("train()"));
    }
}
