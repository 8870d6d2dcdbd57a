use thiserror::Error;

/// Errors related to price-history input validation and schema resolution
#[derive(Debug, Error)]
pub enum DataError {
    #[error("No close-equivalent price column found (looked for Close, Adj Close, Price); available: {available}")]
    MissingPriceColumn { available: String },

    #[error("No data found for symbol {symbol} over {range}")]
    NoData { symbol: String, range: String },

    #[error("Price history is empty")]
    Empty,

    #[error("Bar dates must be strictly increasing: {prev} followed by {next}")]
    UnsortedDates { prev: String, next: String },

    #[error("Record {index} is missing a parseable date")]
    MissingDate { index: usize },
}

/// Errors related to signal computation preconditions
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("Invalid window pair: short={short} must be positive and less than long={long}")]
    InvalidWindows { short: usize, long: usize },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Errors related to the forecast model lifecycle and training
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model not trained yet. Call train() first.")]
    NotTrained,

    #[error("Training failed: {reason}")]
    Training { reason: String },

    #[error("Insufficient history for feature warm-up windows: {rows} rows")]
    InsufficientHistory { rows: usize },

    #[error("Feature schema drifted since training; missing columns: {missing}")]
    FeatureSchemaMismatch { missing: String },

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Model state unavailable: {reason}")]
    Internal { reason: String },
}
