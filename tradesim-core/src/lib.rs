//! TradeSim Core: domain types, venue contract, candle replay, analytics and risk gate.
//!
//! - Domain types (candles, orders, signals, positions, trades, equity points)
//! - Venue trait and a simulated venue that replays historical candles
//! - Signal generator trait with an EMA crossover strategy
//! - Single-position backtest engine with slippage and commission
//! - Performance metrics as pure functions
//! - Risk manager with daily limits, drawdown guard and loss-streak cooldown

pub mod analytics;
pub mod config;
pub mod domain;
pub mod engine;
pub mod risk;
pub mod signals;
pub mod venue;
