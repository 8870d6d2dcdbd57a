use crate::application::forecast::{
    EvaluationMetrics, ForecastModel, ModelParams, Predictions, TrainingMetrics,
};
use crate::domain::errors::ModelError;
use crate::domain::market::PriceSeries;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// Payload returned by [`ModelService::reset`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetOutcome {
    pub status: String,
    pub message: String,
}

/// Owner of the single shared [`ForecastModel`] per process.
///
/// Concurrency policy: every operation (train, predict, evaluate, reset)
/// holds the instance mutex for its full duration, so concurrent callers
/// always observe either the state before or after an operation, never a
/// half-swapped model. Training is CPU-bound and slow; callers needing a
/// timeout wrap the call themselves.
///
/// Construct once at process start and inject; there is no global instance.
pub struct ModelService {
    params: ModelParams,
    model: Mutex<ForecastModel>,
}

impl ModelService {
    pub fn new(params: ModelParams) -> Self {
        Self {
            params,
            model: Mutex::new(ForecastModel::new(params)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ForecastModel>, ModelError> {
        self.model.lock().map_err(|e| ModelError::Internal {
            reason: format!("model lock poisoned: {}", e),
        })
    }

    pub fn is_trained(&self) -> Result<bool, ModelError> {
        Ok(self.lock()?.is_trained())
    }

    /// Always refits from scratch, even when already trained.
    pub fn train(&self, series: &PriceSeries) -> Result<TrainingMetrics, ModelError> {
        self.lock()?.train(series)
    }

    /// Centralized lazy training: fits the model on `series` only when it is
    /// still untrained. Returns the metrics when a fit happened. The check
    /// and the fit run under one lock acquisition, so two racing callers
    /// cannot both train.
    pub fn ensure_trained(
        &self,
        series: &PriceSeries,
    ) -> Result<Option<TrainingMetrics>, ModelError> {
        let mut model = self.lock()?;
        if model.is_trained() {
            return Ok(None);
        }
        info!("model untrained, fitting before first use");
        model.train(series).map(Some)
    }

    pub fn predict(&self, series: &PriceSeries) -> Result<Predictions, ModelError> {
        self.lock()?.predict(series)
    }

    pub fn evaluate(&self, series: &PriceSeries) -> Result<EvaluationMetrics, ModelError> {
        self.lock()?.evaluate(series)
    }

    /// Discards the model entirely, swapping in a fresh untrained instance.
    pub fn reset(&self) -> Result<ResetOutcome, ModelError> {
        let mut model = self.lock()?;
        *model = ForecastModel::new(self.params);
        info!("model reset to untrained state");
        Ok(ResetOutcome {
            status: "success".to_string(),
            message: "Model reset to untrained state".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::PriceBar;
    use chrono::NaiveDate;

    fn trend_series(n: usize) -> PriceSeries {
        let bars = (0..n)
            .map(|i| {
                PriceBar::new(
                    NaiveDate::from_num_days_from_ce_opt(738000 + i as i32).unwrap(),
                    100.0 + i as f64,
                )
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn test_ensure_trained_fits_once() {
        let service = ModelService::new(ModelParams::default());
        let series = trend_series(150);

        let first = service.ensure_trained(&series).unwrap();
        assert!(first.is_some());
        let second = service.ensure_trained(&series).unwrap();
        assert!(second.is_none());
        assert!(service.is_trained().unwrap());
    }

    #[test]
    fn test_reset_returns_to_untrained() {
        let service = ModelService::new(ModelParams::default());
        let series = trend_series(150);
        service.train(&series).unwrap();
        assert!(service.is_trained().unwrap());

        let outcome = service.reset().unwrap();
        assert_eq!(outcome.status, "success");
        assert!(!service.is_trained().unwrap());
        assert!(matches!(
            service.predict(&series),
            Err(ModelError::NotTrained)
        ));
    }

    #[test]
    fn test_shared_across_threads() {
        use std::sync::Arc;

        let service = Arc::new(ModelService::new(ModelParams::default()));
        let series = trend_series(150);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = service.clone();
                let series = series.clone();
                std::thread::spawn(move || service.ensure_trained(&series).unwrap())
            })
            .collect();

        // Exactly one racing caller performs the fit
        let fits = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|outcome| outcome.is_some())
            .count();
        assert_eq!(fits, 1);
        assert!(service.is_trained().unwrap());
    }
}
