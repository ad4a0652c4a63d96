//! Backtest engine: replay loop, cost model, ledger and observers.

pub mod backtest;
pub mod cost_model;
pub mod ledger;
pub mod observer;
pub mod state;

pub use backtest::{BacktestEngine, EngineError};
pub use cost_model::CostModel;
pub use ledger::Ledger;
pub use observer::{EngineObserver, NoopObserver, ObserverSet, RecordingObserver};
pub use state::{EngineState, RunDiagnostics};
