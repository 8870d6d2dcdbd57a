use chrono::NaiveDate;
use marketcast::application::signal_engine::{WINDOW_PAIRS, compute_signals, run_window_sweep};
use marketcast::domain::market::{PriceBar, PriceSeries};
use marketcast::domain::signals::SignalStats;

fn linear_series(n: usize, start: f64, end: f64) -> PriceSeries {
    let step = (end - start) / (n as f64 - 1.0);
    let bars = (0..n)
        .map(|i| {
            PriceBar::new(
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(i as i64),
                start + step * i as f64,
            )
        })
        .collect();
    PriceSeries::new(bars).unwrap()
}

fn oscillating_series(n: usize) -> PriceSeries {
    let bars = (0..n)
        .map(|i| {
            PriceBar::new(
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(i as i64),
                100.0 + (i as f64 / 11.0).sin() * 15.0,
            )
        })
        .collect();
    PriceSeries::new(bars).unwrap()
}

#[test]
fn linear_uptrend_produces_one_buy_and_no_sells() {
    // 300 daily bars, close rising linearly from 100 to 400
    let series = linear_series(300, 100.0, 400.0);
    let frame = compute_signals(&series, 5, 20).unwrap();
    let stats = SignalStats::from_frame(&frame);

    assert_eq!(stats.buy_signals, 1);
    assert_eq!(stats.sell_signals, 0);

    // The buy event lands where the long window first fills, near day 20
    let buy_idx = frame.rows.iter().position(|r| r.position == 1.0).unwrap();
    assert!((19..=21).contains(&buy_idx));

    // Nearly all post-warm-up rows signal the uptrend
    let post = &frame.rows[21..];
    assert!(post.iter().all(|r| r.signal == 1.0));
}

#[test]
fn position_events_match_signal_transitions() {
    // For any series with short < long < len, +1 events equal 0->1 signal
    // transitions and -1 events equal 1->0 transitions
    for (short, long) in [(3usize, 9usize), (5, 20), (10, 50)] {
        let series = oscillating_series(400);
        let frame = compute_signals(&series, short, long).unwrap();

        let mut up = 0;
        let mut down = 0;
        for pair in frame.rows.windows(2) {
            if pair[0].signal == 0.0 && pair[1].signal == 1.0 {
                up += 1;
            }
            if pair[0].signal == 1.0 && pair[1].signal == 0.0 {
                down += 1;
            }
        }
        assert_eq!(frame.buy_signals(), up, "windows ({}, {})", short, long);
        assert_eq!(frame.sell_signals(), down, "windows ({}, {})", short, long);
    }
}

#[test]
fn short_window_rows_are_never_backfilled() {
    let series = oscillating_series(100);
    let frame = compute_signals(&series, 5, 20).unwrap();
    assert!(frame.rows[..5].iter().all(|r| r.signal.is_nan()));
    assert!(frame.rows[5..].iter().all(|r| !r.signal.is_nan()));
}

#[test]
fn oversized_long_window_degenerates_without_error() {
    let series = linear_series(30, 100.0, 130.0);
    let frame = compute_signals(&series, 5, 200).unwrap();
    let stats = SignalStats::from_frame(&frame);
    assert_eq!(stats.trade_count, 0);
}

#[test]
fn window_sweep_is_independent_per_pair() {
    let series = oscillating_series(400);
    let frames = run_window_sweep(&series).unwrap();
    assert_eq!(frames.len(), WINDOW_PAIRS.len());

    // Recomputing any pair alone yields the same frame: no shared state
    for frame in &frames {
        let alone = compute_signals(&series, frame.short_window, frame.long_window).unwrap();
        assert_eq!(alone.rows.len(), frame.rows.len());
        for (a, b) in alone.rows.iter().zip(&frame.rows) {
            assert_eq!(a.signal.is_nan(), b.signal.is_nan());
            if !a.signal.is_nan() {
                assert_eq!(a.signal, b.signal);
            }
        }
    }
}
