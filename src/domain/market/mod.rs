pub mod series;
pub mod timeframe;

pub use series::{PriceBar, PriceSeries};
pub use timeframe::{Interval, Timeframe};

/// Maps bare crypto tickers onto the provider's USD-quoted pair notation.
/// Equity symbols pass through unchanged.
pub fn normalize_crypto_symbol(symbol: &str) -> String {
    match symbol.to_uppercase().as_str() {
        "BTC" | "ETH" | "DOGE" => format!("{}-USD", symbol.to_uppercase()),
        _ => symbol.to_string(),
    }
}
