use crate::application::rolling::rolling_mean;
use crate::domain::errors::SignalError;
use crate::domain::market::PriceSeries;
use crate::domain::signals::{SignalFrame, SignalRow};
use tracing::debug;

/// Window pairs explored by the batch/report path. Each pair is computed and
/// persisted independently; they share no state.
pub const WINDOW_PAIRS: [(usize, usize); 4] = [(5, 20), (10, 50), (20, 100), (50, 200)];

/// Default pair used by the charting surface.
pub const DEFAULT_SHORT_WINDOW: usize = 5;
pub const DEFAULT_LONG_WINDOW: usize = 20;

/// Computes the dual-moving-average crossover signal table.
///
/// Rows before `short_window` carry an undefined (NaN) signal and are never
/// backfilled. Between the short and long warm-up the long average is still
/// NaN, so the comparison is false and the signal reads 0.0; that asymmetry
/// is kept deliberately. `position` is the NaN-propagating first difference of
/// `signal`: +1 is a fresh bullish crossover, -1 a fresh bearish one.
///
/// A `long_window` beyond the series length is the accepted degenerate case
/// (all signals 0/NaN), not an error.
pub fn compute_signals(
    series: &PriceSeries,
    short_window: usize,
    long_window: usize,
) -> Result<SignalFrame, SignalError> {
    if short_window == 0 || short_window >= long_window {
        return Err(SignalError::InvalidWindows {
            short: short_window,
            long: long_window,
        });
    }

    let price = series.close_prices()?;
    let short_mavg = rolling_mean(&price, short_window);
    let long_mavg = rolling_mean(&price, long_window);

    let n = price.len();
    let mut signal = vec![f64::NAN; n];
    for i in short_window..n {
        // NaN long average compares false, yielding 0.0
        signal[i] = if short_mavg[i] > long_mavg[i] { 1.0 } else { 0.0 };
    }

    let dates = series.dates();
    let rows = (0..n)
        .map(|i| {
            let position = if i == 0 {
                f64::NAN
            } else {
                signal[i] - signal[i - 1]
            };
            SignalRow {
                date: dates[i],
                price: price[i],
                short_mavg: short_mavg[i],
                long_mavg: long_mavg[i],
                signal: signal[i],
                position,
            }
        })
        .collect();

    debug!(short_window, long_window, rows = n, "signals computed");
    Ok(SignalFrame {
        short_window,
        long_window,
        rows,
    })
}

/// Runs every default window pair over the same series. Frames are
/// independent; callers persist or render each on its own.
pub fn run_window_sweep(series: &PriceSeries) -> Result<Vec<SignalFrame>, SignalError> {
    WINDOW_PAIRS
        .iter()
        .map(|&(short, long)| compute_signals(series, short, long))
        .collect()
}
