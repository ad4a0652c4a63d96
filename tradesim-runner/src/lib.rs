//! TradeSim Runner: backtest orchestration on top of `tradesim-core`.
//!
//! - TOML run files with per-section defaults and content-addressed run ids
//! - CSV candle loading and seeded synthetic candles
//! - Single-run orchestration with the risk gate replaying closed trades
//! - Markdown reports and JSON/CSV artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod observer;
pub mod report;
pub mod runner;
pub mod synthetic;

pub use config::{DataSection, EmaSection, FileConfigError, RunFile, RunId};
pub use data_loader::{load_csv, LoadError, LoadedData};
pub use export::{load_artifacts, save_artifacts};
pub use observer::RiskTrackingObserver;
pub use report::{render_report, render_summary};
pub use runner::{load_data, run_from_file, run_with_data, BacktestResult, RunError};
pub use synthetic::SyntheticSpec;
