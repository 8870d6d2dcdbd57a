//! marketcast - momentum signal & multi-horizon forecast report
//!
//! Headless one-shot run: fetches history for a symbol, sweeps the default
//! moving-average window pairs (persisting each as CSV), trains the forecast
//! model, and prints predictions with evaluation metrics.
//!
//! # Usage
//! ```sh
//! MODE=yahoo cargo run -- --symbol NVDA --timeframe 1Y
//! ```

use anyhow::Result;
use clap::Parser;
use marketcast::application::api::AnalysisService;
use marketcast::application::lifecycle::ModelService;
use marketcast::application::signal_engine::{compute_signals, run_window_sweep};
use marketcast::config::{Config, Mode};
use marketcast::domain::ports::{MarketDataProvider, NarrativeGenerator};
use marketcast::domain::signals::SignalStats;
use marketcast::infrastructure::mock::{CannedNarrative, MockMarketData};
use marketcast::infrastructure::narrative::OpenAiNarrative;
use marketcast::infrastructure::signal_store::SignalCsvStore;
use marketcast::infrastructure::yahoo::YahooMarketData;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ticker symbol to analyze
    #[arg(long)]
    symbol: Option<String>,

    /// Lookback span: 1M, 3M, 6M, 1Y, 2Y, 5Y
    #[arg(long)]
    timeframe: Option<String>,

    /// Bar interval: day or week
    #[arg(long)]
    interval: Option<String>,

    /// Use the deterministic mock provider regardless of MODE
    #[arg(long)]
    mock: bool,

    /// Directory for window-sweep CSV exports
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Skip the narrative commentary call
    #[arg(long)]
    no_narrative: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("marketcast {} starting...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if args.mock {
        config.mode = Mode::Mock;
    }
    if let Some(symbol) = args.symbol {
        config.symbol = symbol;
    }
    if let Some(timeframe) = &args.timeframe {
        config.timeframe = timeframe.parse()?;
    }
    if let Some(interval) = &args.interval {
        config.interval = interval.parse()?;
    }
    if let Some(dir) = args.results_dir {
        config.results_dir = dir;
    }

    info!(
        "Configuration: mode={:?}, symbol={}, timeframe={}, interval={}",
        config.mode, config.symbol, config.timeframe, config.interval
    );

    let provider: Arc<dyn MarketDataProvider> = match config.mode {
        Mode::Mock => Arc::new(MockMarketData::new()),
        Mode::Yahoo => Arc::new(YahooMarketData::new(config.provider_base_url.clone())),
    };
    let narrative: Arc<dyn NarrativeGenerator> =
        if args.no_narrative || config.openai_api_key.is_empty() {
            Arc::new(CannedNarrative)
        } else {
            Arc::new(OpenAiNarrative::new(
                config.openai_api_key.clone(),
                config.openai_base_url.clone(),
                config.openai_model.clone(),
            ))
        };
    let models = Arc::new(ModelService::new(config.model_params()));
    let service = AnalysisService::new(provider.clone(), narrative, models.clone());

    let series = provider
        .fetch(&config.symbol, config.timeframe, config.interval)
        .await?;
    info!("Fetched {} bars for {}", series.len(), config.symbol);

    // Window sweep: each pair computed and persisted independently
    let store = SignalCsvStore::new(&config.results_dir);
    for frame in run_window_sweep(&series)? {
        let path = store.save(&frame)?;
        info!(
            "Saved ({}, {}) signals to {:?}",
            frame.short_window, frame.long_window, path
        );
    }

    let frame = compute_signals(&series, config.short_window, config.long_window)?;
    let stats = SignalStats::from_frame(&frame);

    if let Some(metrics) = models.ensure_trained(&series)? {
        println!("\nTraining metrics:");
        println!("  Train R²: {:.4}", metrics.train_score);
        println!("  Test  R²: {:.4}", metrics.test_score);
        println!(
            "  MSE: {:.4}  RMSE: {:.4}  MAE: {:.4}",
            metrics.mse, metrics.rmse, metrics.mae
        );
        println!("  Top features:");
        for (name, score) in metrics.feature_importance.iter().take(5) {
            println!("    {:<20} {:.4}", name, score);
        }
    }

    let performance = models.evaluate(&series)?;
    let predictions = models.predict(&series)?;
    let current_price = series.last_price()?;

    println!("\n{} @ {:.2}", config.symbol, current_price);
    println!(
        "  Signals ({}, {}): {} trades, {} buys, {} sells, price change {:+.2}%",
        config.short_window,
        config.long_window,
        stats.trade_count,
        stats.buy_signals,
        stats.sell_signals,
        stats.price_change_pct
    );
    println!("  Predictions:");
    println!("    1d:  {:.2}", predictions.h1d);
    println!("    7d:  {:.2}", predictions.h7d);
    println!("    30d: {:.2}", predictions.h30d);
    println!("    90d: {:.2}", predictions.h90d);
    println!(
        "  Evaluation: MSE={:.4} RMSE={:.4} MAE={:.4} R²={:.4}",
        performance.mse, performance.rmse, performance.mae, performance.r2
    );

    let analysis = service.chart_analysis(&config.symbol, &frame).await?;
    println!("\nAnalysis:\n{}", analysis.response);

    Ok(())
}
