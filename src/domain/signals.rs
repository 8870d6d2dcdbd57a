use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One dated row of the crossover signal table.
///
/// `signal` and `position` use NaN to encode warm-up rows: `signal` is NaN
/// before the short window has filled, and `position` is NaN wherever the
/// first difference touches an undefined signal. Warm-up NaNs are never
/// backfilled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub date: NaiveDate,
    pub price: f64,
    pub short_mavg: f64,
    pub long_mavg: f64,
    pub signal: f64,
    pub position: f64,
}

/// Full output of one signal-engine run for a `(short, long)` window pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalFrame {
    pub short_window: usize,
    pub long_window: usize,
    pub rows: Vec<SignalRow>,
}

impl SignalFrame {
    /// Count of fresh bullish crossovers (position == +1).
    pub fn buy_signals(&self) -> usize {
        self.rows.iter().filter(|r| r.position == 1.0).count()
    }

    /// Count of fresh bearish crossovers (position == -1).
    pub fn sell_signals(&self) -> usize {
        self.rows.iter().filter(|r| r.position == -1.0).count()
    }

    pub fn last_row(&self) -> Option<&SignalRow> {
        self.rows.last()
    }
}

/// Aggregate statistics over a signal frame, the payload handed to chart
/// consumers and the narrative generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalStats {
    pub trade_count: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub price_change_pct: f64,
}

impl SignalStats {
    pub fn from_frame(frame: &SignalFrame) -> Self {
        let buy_signals = frame.buy_signals();
        let sell_signals = frame.sell_signals();
        let price_change_pct = match (frame.rows.first(), frame.rows.last()) {
            (Some(first), Some(last)) if first.price != 0.0 => {
                (last.price - first.price) / first.price * 100.0
            }
            _ => 0.0,
        };
        Self {
            trade_count: buy_signals + sell_signals,
            buy_signals,
            sell_signals,
            price_change_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(day: u32, price: f64, signal: f64, position: f64) -> SignalRow {
        SignalRow {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            price,
            short_mavg: price,
            long_mavg: price,
            signal,
            position,
        }
    }

    #[test]
    fn test_stats_ignore_nan_positions() {
        let frame = SignalFrame {
            short_window: 2,
            long_window: 3,
            rows: vec![
                row(1, 100.0, f64::NAN, f64::NAN),
                row(2, 102.0, 0.0, f64::NAN),
                row(3, 104.0, 1.0, 1.0),
                row(4, 103.0, 1.0, 0.0),
                row(5, 101.0, 0.0, -1.0),
            ],
        };
        let stats = SignalStats::from_frame(&frame);
        assert_eq!(stats.buy_signals, 1);
        assert_eq!(stats.sell_signals, 1);
        assert_eq!(stats.trade_count, 2);
        assert!((stats.price_change_pct - 1.0).abs() < 1e-9);
    }
}
