use marketcast::application::api::{AnalysisService, ErrorResponse, TrainRequest};
use marketcast::application::forecast::ModelParams;
use marketcast::application::lifecycle::ModelService;
use marketcast::application::signal_engine::compute_signals;
use marketcast::config::Config;
use marketcast::domain::market::{Interval, Timeframe};
use marketcast::infrastructure::mock::{CannedNarrative, MockMarketData, synthetic_series};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

fn service_with_mock() -> AnalysisService {
    let provider = Arc::new(MockMarketData::with_series(
        "NVDA",
        synthetic_series("NVDA", 300),
    ));
    AnalysisService::new(
        provider,
        Arc::new(CannedNarrative),
        Arc::new(ModelService::new(ModelParams::default())),
    )
}

fn price_history(n: usize) -> Vec<BTreeMap<String, Value>> {
    (0..n)
        .map(|i| {
            let mut record = BTreeMap::new();
            let date = chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
                + chrono::Duration::days(i as i64);
            record.insert("Date".to_string(), Value::from(date.to_string()));
            record.insert(
                "Close".to_string(),
                Value::from(100.0 + i as f64 * 0.6 + (i as f64 / 8.0).sin() * 2.0),
            );
            record.insert("Volume".to_string(), Value::from(1_500_000.0));
            record
        })
        .collect()
}

#[tokio::test]
async fn ping_reports_version() {
    let service = service_with_mock();
    let pong = service.ping();
    assert_eq!(pong.status, "ok");
    assert_eq!(pong.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn predict_lazily_trains_then_reports() -> anyhow::Result<()> {
    let service = service_with_mock();
    assert!(!service.models().is_trained()?);

    let response = service
        .predict("NVDA", Timeframe::OneYear, Interval::Day)
        .await?;

    assert!(service.models().is_trained()?);
    assert_eq!(response.symbol, "NVDA");
    assert!(response.current_price.is_finite());
    assert!(response.predictions.h1d.is_finite());
    assert!(response.predictions.h7d.is_finite());
    assert!(response.predictions.h30d.is_finite());
    assert!(response.predictions.h90d.is_finite());
    assert!(response.performance.rmse >= 0.0);
    Ok(())
}

#[tokio::test]
async fn stock_data_reports_chart_rows_and_stats() -> anyhow::Result<()> {
    let service = service_with_mock();
    let response = service
        .stock_data("NVDA", Timeframe::OneYear, Interval::Day)
        .await?;

    assert_eq!(response.signals.len(), 300);
    assert_eq!(
        response.stats.trade_count,
        response.stats.buy_signals + response.stats.sell_signals
    );
    assert!(response.last_price.is_finite());
    // Chart rows flatten warm-up NaN positions to 0
    assert!(response.signals.iter().all(|p| p.positions.abs() <= 1));
    Ok(())
}

#[tokio::test]
async fn unknown_symbol_surfaces_no_data_kind() {
    let service = service_with_mock();
    let err = service
        .predict("AAPL", Timeframe::OneYear, Interval::Day)
        .await
        .unwrap_err();

    let payload = ErrorResponse::from_error(&err);
    assert_eq!(payload.status, "error");
    assert_eq!(payload.kind, "no_data");
    assert!(payload.message.contains("AAPL"));
}

#[tokio::test]
async fn train_endpoint_reports_metrics_without_importances() -> anyhow::Result<()> {
    let service = service_with_mock();
    let response = service.train(&TrainRequest {
        price_history: price_history(250),
    })?;

    assert_eq!(response.status, "success");
    assert!(response.metrics.rmse >= 0.0);
    // The payload shape excludes the importance ranking
    let json = serde_json::to_value(&response)?;
    assert!(json["metrics"].get("feature_importance").is_none());
    Ok(())
}

#[tokio::test]
async fn predict_series_trains_lazily_and_reset_clears() -> anyhow::Result<()> {
    let service = service_with_mock();
    let request = TrainRequest {
        price_history: price_history(250),
    };

    let response = service.predict_series(&request)?;
    assert_eq!(response.status, "success");
    assert!(response.current_price.is_finite());
    assert!(service.models().is_trained()?);

    let outcome = service.reset_model()?;
    assert_eq!(outcome.status, "success");
    assert!(!service.models().is_trained()?);

    // Prediction works again because the call lazily retrains
    let again = service.predict_series(&request)?;
    assert_eq!(again.status, "success");
    Ok(())
}

#[tokio::test]
async fn chart_renderer_port_receives_signal_rows() -> anyhow::Result<()> {
    use marketcast::domain::ports::ChartRenderer;
    use marketcast::infrastructure::mock::NullChartRenderer;

    let series = synthetic_series("NVDA", 120);
    let frame = compute_signals(&series, 5, 20)?;

    let renderer = NullChartRenderer;
    let artifact = renderer.render("NVDA", &frame).await?;
    assert_eq!(artifact.content_type, "image/png");
    Ok(())
}

#[tokio::test]
async fn chart_analysis_delegates_to_narrative_port() -> anyhow::Result<()> {
    let service = service_with_mock();
    let series = synthetic_series("NVDA", 300);
    let config = Config::from_env()?;
    let frame = compute_signals(&series, config.short_window, config.long_window)?;

    let analysis = service.chart_analysis("NVDA", &frame).await?;
    assert_eq!(analysis.symbol, "NVDA");
    assert!(analysis.response.contains("NVDA"));
    Ok(())
}
