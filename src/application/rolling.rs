//! Rolling-window primitives shared by the feature builder and the signal
//! engine. All of them reproduce pandas rolling semantics: a window is only
//! defined once fully filled, and undefined entries are NaN.

use statrs::statistics::{Data, Distribution};
use ta::Next;
use ta::indicators::SimpleMovingAverage;

/// Simple moving average with the first `window - 1` entries masked to NaN.
/// The `ta` indicator emits partial means during warm-up, which pandas does
/// not, so those entries are overwritten.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let mut sma = SimpleMovingAverage::new(window).expect("window is validated to be positive");
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let avg = sma.next(v);
            if i + 1 < window { f64::NAN } else { avg }
        })
        .collect()
}

/// Rolling sample standard deviation (ddof = 1). A window containing NaN is
/// NaN, matching pandas' min_periods behavior.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return f64::NAN;
            }
            let slice = &values[i + 1 - window..=i];
            if slice.iter().any(|v| v.is_nan()) {
                return f64::NAN;
            }
            let data = Data::new(slice.to_vec());
            data.std_dev().unwrap_or(f64::NAN)
        })
        .collect()
}

/// Fractional change over `periods` steps; the first `periods` entries are
/// NaN.
pub fn pct_change(values: &[f64], periods: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i < periods {
                f64::NAN
            } else {
                let prev = values[i - periods];
                (values[i] - prev) / prev
            }
        })
        .collect()
}

/// Value `periods` steps ahead; the trailing `periods` entries are NaN.
/// Used to build the forward-looking target columns.
pub fn shift_ahead(values: &[f64], periods: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            values
                .get(i + periods)
                .copied()
                .unwrap_or(f64::NAN)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_mean_warm_up_is_nan() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert!((out[2] - 2.0).abs() < 1e-12);
        assert!((out[3] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_std_is_sample_std() {
        let out = rolling_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8);
        // Sample std of the classic series is ~2.138
        assert!((out[7] - 2.138089935).abs() < 1e-6);
    }

    #[test]
    fn test_rolling_std_nan_window() {
        let out = rolling_std(&[f64::NAN, 1.0, 2.0, 3.0], 2);
        assert!(out[1].is_nan());
        assert!(!out[2].is_nan());
    }

    #[test]
    fn test_pct_change() {
        let out = pct_change(&[100.0, 110.0, 99.0], 1);
        assert!(out[0].is_nan());
        assert!((out[1] - 0.1).abs() < 1e-12);
        assert!((out[2] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_shift_ahead_tail_is_nan() {
        let out = shift_ahead(&[1.0, 2.0, 3.0], 2);
        assert_eq!(out[0], 3.0);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
    }
}
