use crate::application::feature_builder::FeatureBuilder;
use crate::domain::errors::ModelError;
use crate::domain::features::TARGET_1D;
use crate::domain::market::PriceSeries;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::{debug, info};

use super::importance::permutation_importance;
use super::scaler::MinMaxScaler;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Fraction of rows used for the chronological training split. Never
/// shuffled: shuffling a time series leaks the future into training.
const TRAIN_FRACTION: f64 = 0.8;

/// Horizon blend weights as (raw prediction, current price, shorter SMA,
/// longer SMA). 7d blends sma_5/sma_20, 30d and 90d blend sma_20/sma_50.
/// Heuristic extrapolation, not a fitted multi-horizon model; kept exactly.
pub const BLEND_7D: [f64; 4] = [0.4, 0.3, 0.2, 0.1];
pub const BLEND_30D: [f64; 4] = [0.2, 0.1, 0.3, 0.4];
pub const BLEND_90D: [f64; 4] = [0.1, 0.1, 0.2, 0.6];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub seed: u64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub train_score: f64,
    pub test_score: f64,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    /// Feature name -> normalized importance, sorted descending.
    pub feature_importance: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    #[serde(rename = "1d")]
    pub h1d: f64,
    #[serde(rename = "7d")]
    pub h7d: f64,
    #[serde(rename = "30d")]
    pub h30d: f64,
    #[serde(rename = "90d")]
    pub h90d: f64,
}

/// Tree-ensemble next-day regressor with moving-average horizon blending.
///
/// State machine: Untrained -> Trained via [`train`](Self::train) (repeatable,
/// always a from-scratch refit); back to Untrained only by replacing the
/// instance. `predict`/`evaluate` fail in Untrained state rather than train
/// implicitly.
pub struct ForecastModel {
    params: ModelParams,
    feature_columns: Vec<String>,
    forest: Option<Forest>,
    scaler: Option<MinMaxScaler>,
    trained: bool,
}

impl ForecastModel {
    pub fn new(params: ModelParams) -> Self {
        Self {
            params,
            feature_columns: Vec::new(),
            forest: None,
            scaler: None,
            trained: false,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn params(&self) -> ModelParams {
        self.params
    }

    /// Frozen feature schema; empty until trained.
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    pub fn train(&mut self, series: &PriceSeries) -> Result<TrainingMetrics, ModelError> {
        let table = FeatureBuilder::build(series)?;
        let feature_columns = table.feature_columns();
        let x = table
            .matrix(&feature_columns)
            .map_err(|missing| ModelError::Internal {
                reason: format!("feature table lost its own columns: {}", missing.join(", ")),
            })?;
        let y = table.column(TARGET_1D).ok_or(ModelError::Internal {
            reason: "feature table has no target column".to_string(),
        })?;

        let n = x.len();
        let train_size = (n as f64 * TRAIN_FRACTION) as usize;
        if train_size == 0 || train_size >= n {
            return Err(ModelError::Training {
                reason: format!(
                    "insufficient rows for a chronological train/test split: {}",
                    n
                ),
            });
        }

        // A column that never fills its warm-up window survives the fill
        // pass as NaN; the forest must not see it
        ensure_finite(&x, n)?;
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InsufficientHistory { rows: n });
        }

        // Scaler is fit on the full matrix, then frozen for the model's
        // trained lifetime
        let (scaler, x_scaled) = MinMaxScaler::fit_transform(&x);

        let x_train: Vec<Vec<f64>> = x_scaled[..train_size].to_vec();
        let x_test: Vec<Vec<f64>> = x_scaled[train_size..].to_vec();
        let y_train: Vec<f64> = y[..train_size].to_vec();
        let y_test: Vec<f64> = y[train_size..].to_vec();

        let x_train_m = DenseMatrix::from_2d_vec(&x_train).map_err(|e| ModelError::Training {
            reason: format!("matrix creation failed: {}", e),
        })?;
        let x_test_m = DenseMatrix::from_2d_vec(&x_test).map_err(|e| ModelError::Training {
            reason: format!("matrix creation failed: {}", e),
        })?;

        let rf_params = RandomForestRegressorParameters::default()
            .with_n_trees(self.params.n_trees)
            .with_max_depth(self.params.max_depth)
            .with_seed(self.params.seed);

        debug!(
            rows = n,
            train_rows = train_size,
            features = feature_columns.len(),
            "fitting random forest"
        );
        let forest = RandomForestRegressor::fit(&x_train_m, &y_train, rf_params).map_err(|e| {
            ModelError::Training {
                reason: format!("forest fit failed: {}", e),
            }
        })?;

        let train_pred = forest.predict(&x_train_m).map_err(|e| ModelError::Training {
            reason: format!("train-split prediction failed: {}", e),
        })?;
        let test_pred = forest.predict(&x_test_m).map_err(|e| ModelError::Training {
            reason: format!("test-split prediction failed: {}", e),
        })?;

        let mse = mean_squared_error(&test_pred, &y_test);
        let metrics = TrainingMetrics {
            train_score: r_squared(&train_pred, &y_train),
            test_score: r_squared(&test_pred, &y_test),
            mse,
            rmse: mse.sqrt(),
            mae: mean_absolute_error(&test_pred, &y_test),
            r2: r_squared(&test_pred, &y_test),
            feature_importance: permutation_importance(
                &forest,
                &x_test,
                &y_test,
                &feature_columns,
                self.params.seed,
            ),
        };

        self.forest = Some(forest);
        self.scaler = Some(scaler);
        self.feature_columns = feature_columns;
        self.trained = true;

        info!(
            train_score = metrics.train_score,
            test_score = metrics.test_score,
            rmse = metrics.rmse,
            "model trained"
        );
        Ok(metrics)
    }

    /// Predicts the next-day close from the most recent row, then blends it
    /// with moving averages for the longer horizons.
    pub fn predict(&self, series: &PriceSeries) -> Result<Predictions, ModelError> {
        let (forest, scaler) = self.fitted()?;

        let table = FeatureBuilder::build(series)?;
        let x = table
            .matrix(&self.feature_columns)
            .map_err(|missing| ModelError::FeatureSchemaMismatch {
                missing: missing.join(", "),
            })?;
        let latest = x.last().ok_or(ModelError::Internal {
            reason: "feature table is empty".to_string(),
        })?;
        if latest.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InsufficientHistory { rows: x.len() });
        }

        let scaled = scaler.transform(std::slice::from_ref(latest));
        let matrix = DenseMatrix::from_2d_vec(&scaled).map_err(|e| ModelError::Internal {
            reason: format!("matrix creation failed: {}", e),
        })?;
        let raw = *forest
            .predict(&matrix)
            .map_err(|e| ModelError::Internal {
                reason: format!("prediction failed: {}", e),
            })?
            .first()
            .ok_or(ModelError::Internal {
                reason: "no prediction returned".to_string(),
            })?;

        let last = |name: &str| -> Result<f64, ModelError> {
            table
                .column(name)
                .and_then(|c| c.last().copied())
                .ok_or(ModelError::FeatureSchemaMismatch {
                    missing: name.to_string(),
                })
        };
        let current_price = last("close")?;
        let sma_5 = last("sma_5")?;
        let sma_20 = last("sma_20")?;
        let sma_50 = last("sma_50")?;

        Ok(Predictions {
            h1d: raw,
            h7d: BLEND_7D[0] * raw
                + BLEND_7D[1] * current_price
                + BLEND_7D[2] * sma_5
                + BLEND_7D[3] * sma_20,
            h30d: BLEND_30D[0] * raw
                + BLEND_30D[1] * current_price
                + BLEND_30D[2] * sma_20
                + BLEND_30D[3] * sma_50,
            h90d: BLEND_90D[0] * raw
                + BLEND_90D[1] * current_price
                + BLEND_90D[2] * sma_20
                + BLEND_90D[3] * sma_50,
        })
    }

    /// Scores next-day predictions over the whole provided series,
    /// independent of the original train/test split.
    pub fn evaluate(&self, series: &PriceSeries) -> Result<EvaluationMetrics, ModelError> {
        let (forest, scaler) = self.fitted()?;

        let table = FeatureBuilder::build(series)?;
        let x = table
            .matrix(&self.feature_columns)
            .map_err(|missing| ModelError::FeatureSchemaMismatch {
                missing: missing.join(", "),
            })?;
        let y = table.column(TARGET_1D).ok_or(ModelError::Internal {
            reason: "feature table has no target column".to_string(),
        })?;
        ensure_finite(&x, x.len())?;

        let scaled = scaler.transform(&x);
        let matrix = DenseMatrix::from_2d_vec(&scaled).map_err(|e| ModelError::Internal {
            reason: format!("matrix creation failed: {}", e),
        })?;
        let pred = forest.predict(&matrix).map_err(|e| ModelError::Internal {
            reason: format!("prediction failed: {}", e),
        })?;

        let mse = mean_squared_error(&pred, y);
        Ok(EvaluationMetrics {
            mse,
            rmse: mse.sqrt(),
            mae: mean_absolute_error(&pred, y),
            r2: r_squared(&pred, y),
        })
    }

    fn fitted(&self) -> Result<(&Forest, &MinMaxScaler), ModelError> {
        match (&self.forest, &self.scaler) {
            (Some(forest), Some(scaler)) if self.trained => Ok((forest, scaler)),
            _ => Err(ModelError::NotTrained),
        }
    }
}

fn ensure_finite(matrix: &[Vec<f64>], rows: usize) -> Result<(), ModelError> {
    for row in matrix {
        if row.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InsufficientHistory { rows });
        }
    }
    Ok(())
}

pub(crate) fn mean_squared_error(pred: &[f64], actual: &[f64]) -> f64 {
    if pred.is_empty() {
        return 0.0;
    }
    pred.iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum::<f64>()
        / pred.len() as f64
}

pub(crate) fn mean_absolute_error(pred: &[f64], actual: &[f64]) -> f64 {
    if pred.is_empty() {
        return 0.0;
    }
    pred.iter()
        .zip(actual)
        .map(|(p, a)| (p - a).abs())
        .sum::<f64>()
        / pred.len() as f64
}

pub(crate) fn r_squared(pred: &[f64], actual: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let sst: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if sst > 0.0 {
        let sse: f64 = pred
            .iter()
            .zip(actual)
            .map(|(p, a)| (p - a).powi(2))
            .sum();
        1.0 - sse / sst
    } else {
        0.0
    }
}
