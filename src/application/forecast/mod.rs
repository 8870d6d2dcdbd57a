mod importance;
mod model;
mod scaler;

pub use model::{
    BLEND_7D, BLEND_30D, BLEND_90D, EvaluationMetrics, ForecastModel, ModelParams, Predictions,
    TrainingMetrics,
};
pub use scaler::MinMaxScaler;
