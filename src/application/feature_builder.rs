use crate::application::rolling::{pct_change, rolling_mean, rolling_std, shift_ahead};
use crate::domain::errors::DataError;
use crate::domain::features::{FeatureTable, TARGET_1D, TARGET_7D, TARGET_30D};
use crate::domain::market::PriceSeries;
use tracing::debug;

/// Builds the fixed feature table from a price series.
///
/// Pure transform: same input, same table. The column set and order are the
/// schema the forecast model freezes at training time.
pub struct FeatureBuilder;

impl FeatureBuilder {
    pub fn build(series: &PriceSeries) -> Result<FeatureTable, DataError> {
        // Close-equivalent resolution happens first; everything else derives
        // from it.
        let close = series.close_prices()?;

        let mut table = FeatureTable::new(series.dates());

        // Raw columns, canonical order. The resolved close is always written
        // as `close`, copying the substitute column when the input had none.
        if let Some(open) = series.open() {
            table.push_column("open", open);
        }
        if let Some(high) = series.high() {
            table.push_column("high", high);
        }
        if let Some(low) = series.low() {
            table.push_column("low", low);
        }
        table.push_column("close", close.clone());
        if let Some(adj) = series.adj_close() {
            table.push_column("adj_close", adj);
        }
        if let Some(price) = series.raw_price() {
            table.push_column("price", price);
        }
        let volume = series.volume();
        if let Some(ref vol) = volume {
            table.push_column("volume", vol.clone());
        }

        // Price features
        let return_1d = pct_change(&close, 1);
        table.push_column("return_1d", return_1d.clone());
        table.push_column("return_5d", pct_change(&close, 5));
        table.push_column("return_14d", pct_change(&close, 14));

        // Moving averages
        let sma_5 = rolling_mean(&close, 5);
        let sma_10 = rolling_mean(&close, 10);
        let sma_20 = rolling_mean(&close, 20);
        let sma_50 = rolling_mean(&close, 50);

        // Price relative to moving averages
        let price_sma5_ratio: Vec<f64> =
            close.iter().zip(&sma_5).map(|(c, s)| c / s).collect();
        let price_sma20_ratio: Vec<f64> =
            close.iter().zip(&sma_20).map(|(c, s)| c / s).collect();

        table.push_column("sma_5", sma_5);
        table.push_column("sma_10", sma_10);
        table.push_column("sma_20", sma_20);
        table.push_column("sma_50", sma_50);
        table.push_column("price_sma5_ratio", price_sma5_ratio);
        table.push_column("price_sma20_ratio", price_sma20_ratio);

        // Volatility of daily returns
        table.push_column("volatility_14d", rolling_std(&return_1d, 14));
        table.push_column("volatility_30d", rolling_std(&return_1d, 30));

        // Volume features only when the input carries volume
        if let Some(vol) = volume {
            let volume_ma10 = rolling_mean(&vol, 10);
            let volume_ratio: Vec<f64> =
                vol.iter().zip(&volume_ma10).map(|(v, m)| v / m).collect();
            table.push_column("volume_change", pct_change(&vol, 1));
            table.push_column("volume_ma5", rolling_mean(&vol, 5));
            table.push_column("volume_ma10", volume_ma10);
            table.push_column("volume_ratio", volume_ratio);
        }

        // Forward-looking targets; only target_1d is ever fit against
        table.push_column(TARGET_1D, shift_ahead(&close, 1));
        table.push_column(TARGET_7D, shift_ahead(&close, 7));
        table.push_column(TARGET_30D, shift_ahead(&close, 30));

        // The single de-NaN pass over the whole table
        table.fill_missing();

        debug!(
            rows = table.n_rows(),
            columns = table.column_names().len(),
            "feature table built"
        );
        Ok(table)
    }
}
