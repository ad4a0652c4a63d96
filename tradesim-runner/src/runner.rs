//! Backtest runner: wires data, strategy, engine and risk gate together.
//!
//! Two entry points:
//! - `run_from_file()`: resolves the data source from the run file, then runs. Used by the CLI.
//! - `run_with_data()`: takes pre-loaded data, no I/O.

use chrono::Utc;
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use thiserror::Error;
use tradesim_core::analytics::PerformanceMetrics;
use tradesim_core::config::ConfigError;
use tradesim_core::engine::{BacktestEngine, EngineError, RunDiagnostics};
use tradesim_core::risk::{ManualClock, RiskManager, RiskStats};

use crate::config::{FileConfigError, RunFile, RunId};
use crate::data_loader::{load_csv, LoadError, LoadedData};
use crate::observer::RiskTrackingObserver;
use crate::synthetic::SyntheticSpec;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] FileConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("risk config error: {0}")]
    Risk(#[from] ConfigError),
}

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub symbol: String,
    pub strategy: String,
    pub dataset_hash: String,
    pub synthetic: bool,
    pub candle_count: usize,
    pub skipped_rows: usize,
    pub initial_capital: Decimal,
    pub final_capital: Decimal,
    pub metrics: PerformanceMetrics,
    pub diagnostics: RunDiagnostics,
    pub risk_stats: RiskStats,
    /// Trades opened while the risk gate would have refused them.
    pub gate_blocked_trades: usize,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Resolve the run file's data source: CSV when `path` is set, else synthetic candles.
pub fn load_data(file: &RunFile) -> Result<LoadedData, RunError> {
    let data = &file.data;
    if let Some(path) = &data.path {
        return Ok(load_csv(path, &data.symbol)?);
    }
    let candles = data
        .synthetic_candles
        .ok_or(FileConfigError::NoDataSource)?;
    let synth = SyntheticSpec::new(data.symbol.clone(), candles, data.seed);
    info!("generating {} synthetic candles for {} (seed {})", candles, data.symbol, data.seed);
    Ok(LoadedData::new(synth.generate(), 0, true))
}

pub fn run_from_file(file: &RunFile) -> Result<BacktestResult, RunError> {
    file.validate()?;
    let loaded = load_data(file)?;
    run_with_data(file, loaded)
}

/// Run with pre-loaded data. The risk manager replays closed trades at their historical times.
pub fn run_with_data(file: &RunFile, loaded: LoadedData) -> Result<BacktestResult, RunError> {
    let strategy = file.ema.build()?;

    let start = loaded.data.first_time().unwrap_or_else(Utc::now);
    let clock = Arc::new(ManualClock::new(start));
    let risk = Arc::new(RiskManager::with_clock(
        file.risk.clone(),
        file.backtest.initial_capital,
        clock.clone(),
    )?);
    let observer = RiskTrackingObserver::replaying(Arc::clone(&risk), clock);
    let blocked = observer.blocked_counter();

    let candle_count = loaded.data.len();
    let data = Arc::new(loaded.data);
    let mut engine =
        BacktestEngine::new(file.backtest.clone(), Arc::clone(&data)).with_observer(Box::new(observer));
    let metrics = engine.run(&strategy, &file.strategy)?;

    let diagnostics = engine.last_diagnostics().copied().unwrap_or_default();
    let final_capital = engine
        .last_final_capital()
        .unwrap_or(file.backtest.initial_capital);
    let run_id = file.run_id(&loaded.dataset_hash);
    info!(
        "run {} on {}: {} trades, return {}%",
        &run_id[..12.min(run_id.len())],
        data.symbol,
        metrics.total_trades,
        metrics.total_return_pct.round_dp(2)
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        symbol: data.symbol.clone(),
        strategy: format!(
            "ema_crossover({}/{}, rsi {})",
            file.ema.fast_period, file.ema.slow_period, file.ema.rsi_period
        ),
        dataset_hash: loaded.dataset_hash,
        synthetic: loaded.synthetic,
        candle_count,
        skipped_rows: loaded.skipped_rows,
        initial_capital: file.backtest.initial_capital,
        final_capital,
        metrics,
        diagnostics,
        risk_stats: risk.stats(),
        gate_blocked_trades: blocked.load(Ordering::Relaxed),
    })
}
