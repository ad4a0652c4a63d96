//! Candle-by-candle replay over a single position slot.
//!
//! Per candle, in order:
//! 1. Advance the venue cursor
//! 2. Exit check against the candle's high/low (stop-loss before take-profit)
//! 3. Once warm, ask the strategy for a signal over the trailing window
//! 4. Route the signal through the open/close logic
//! 5. Record an equity point
//!
//! Any position still open after the last candle is closed at its close.

use super::cost_model::{quantize_amount, quantize_cash, CostModel};
use super::observer::{EngineObserver, ObserverSet};
use super::state::{EngineState, RunDiagnostics};
use crate::analytics::PerformanceMetrics;
use crate::config::{BacktestConfig, ConfigError, StrategyParams};
use crate::domain::{
    Candle, ExitReason, HistoricalData, OrderSide, Position, Signal, SignalKind, Trade,
};
use crate::signals::SignalGenerator;
use crate::venue::{SimulatedVenue, VenueError};
use chrono::{DateTime, Utc};
use log::{debug, info};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("no historical data to backtest")]
    NoData,

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error(transparent)]
    Venue(#[from] VenueError),
}

pub struct BacktestEngine {
    config: BacktestConfig,
    data: Arc<HistoricalData>,
    cost: CostModel,
    observers: ObserverSet,
    last_diagnostics: Option<RunDiagnostics>,
    last_final_capital: Option<Decimal>,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig, data: Arc<HistoricalData>) -> Self {
        let cost = CostModel::from_config(&config);
        Self {
            config,
            data,
            cost,
            observers: ObserverSet::default(),
            last_diagnostics: None,
            last_final_capital: None,
        }
    }

    /// Register an observer. Observers run inline, in registration order.
    pub fn with_observer(mut self, observer: Box<dyn EngineObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn EngineObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Counters from the most recent successful run.
    pub fn last_diagnostics(&self) -> Option<&RunDiagnostics> {
        self.last_diagnostics.as_ref()
    }

    /// Cash capital at the end of the most recent successful run.
    pub fn last_final_capital(&self) -> Option<Decimal> {
        self.last_final_capital
    }

    /// Replay the data set once. Fails before touching any state on empty data or bad config.
    pub fn run(
        &mut self,
        strategy: &dyn SignalGenerator,
        params: &StrategyParams,
    ) -> Result<PerformanceMetrics, EngineError> {
        if self.data.is_empty() {
            return Err(EngineError::NoData);
        }
        self.config.validate()?;
        params.validate()?;

        let data = self.replay_range();
        if data.is_empty() {
            return Err(EngineError::NoData);
        }

        self.observers.reset_faults();
        let mut venue = SimulatedVenue::new(Arc::clone(&data), self.config.initial_capital);
        let mut state = EngineState::new(self.config.initial_capital);

        let first = &data.candles[0];
        self.record_equity(&mut state, first.timestamp, first.close);

        for index in 0..data.len() {
            venue.advance(index);
            state.candle_index = index;
            let candle = venue.current_candle()?.clone();

            self.check_exit(&mut state, &candle);

            if index >= params.min_history_candles {
                let window = venue.windowed_candles(params.window_size)?;
                let prices: Vec<Decimal> = window.iter().map(|c| c.close).collect();
                let volumes: Vec<Decimal> = window.iter().map(|c| c.volume).collect();
                let signal = strategy.generate_signal(&data.symbol, &prices, &volumes, None);
                if let Some(signal) = signal.filter(Signal::is_actionable) {
                    state.diagnostics.signals_seen += 1;
                    self.handle_signal(&mut state, &signal, &candle, params);
                }
            }

            state.diagnostics.candles_processed += 1;
            self.record_equity(&mut state, candle.timestamp, candle.close);
        }

        if state.has_position() {
            if let Some(last) = data.candles.last() {
                self.close_position(&mut state, last, ExitReason::EndOfData);
            }
        }

        state.diagnostics.observer_faults = self.observers.faults();
        let final_capital = state.capital();
        info!(
            "{}: replayed {} candles with '{}', {} trades, capital {} -> {}",
            data.symbol,
            state.diagnostics.candles_processed,
            strategy.name(),
            state.ledger.trades().len(),
            self.config.initial_capital,
            final_capital
        );
        self.last_diagnostics = Some(state.diagnostics);
        self.last_final_capital = Some(final_capital);

        let initial_capital = state.ledger.initial_capital();
        let (trades, equity_curve) = state.ledger.into_parts();
        Ok(PerformanceMetrics::compute(
            trades,
            equity_curve,
            initial_capital,
            final_capital,
            data.time_range(),
        ))
    }

    fn replay_range(&self) -> Arc<HistoricalData> {
        match (self.config.start_time, self.config.end_time) {
            (None, None) => Arc::clone(&self.data),
            (start, end) => Arc::new(self.data.within(start, end)),
        }
    }

    // ── Signal routing ──

    fn handle_signal(
        &mut self,
        state: &mut EngineState,
        signal: &Signal,
        candle: &Candle,
        params: &StrategyParams,
    ) {
        match signal.kind {
            SignalKind::Entry => {
                if state.has_position() {
                    debug!("entry skipped at {}: position already open", candle.timestamp);
                    state.diagnostics.skipped_position_open += 1;
                } else if signal.strength <= params.min_signal_strength {
                    debug!(
                        "entry skipped at {}: strength {:.3} <= {:.3}",
                        candle.timestamp, signal.strength, params.min_signal_strength
                    );
                    state.diagnostics.skipped_weak_signal += 1;
                } else if signal.side == OrderSide::Sell && !self.config.allow_short {
                    debug!("entry skipped at {}: shorting disabled", candle.timestamp);
                    state.diagnostics.skipped_short_disallowed += 1;
                } else {
                    self.open_position(state, signal, candle, params);
                }
            }
            SignalKind::Exit => {
                let same_side = state
                    .position
                    .as_ref()
                    .is_some_and(|p| p.side == signal.side);
                if same_side {
                    self.close_position(state, candle, ExitReason::Signal);
                } else {
                    state.diagnostics.ignored_exit_signals += 1;
                }
            }
            SignalKind::None => {}
        }
    }

    // ── Exits ──

    fn check_exit(&mut self, state: &mut EngineState, candle: &Candle) {
        let Some(position) = &state.position else {
            return;
        };
        let reason = if position.stop_hit(candle.low, candle.high) {
            ExitReason::StopLoss
        } else if position.target_hit(candle.low, candle.high) {
            ExitReason::TakeProfit
        } else {
            return;
        };
        self.close_position(state, candle, reason);
    }

    // ── Open / close ──

    fn open_position(
        &mut self,
        state: &mut EngineState,
        signal: &Signal,
        candle: &Candle,
        params: &StrategyParams,
    ) {
        let price = signal.price;
        let side = signal.side;
        let (stop_loss, take_profit) = match side {
            OrderSide::Buy => (
                price * (Decimal::ONE - params.stop_loss_pct),
                price * (Decimal::ONE + params.take_profit_pct),
            ),
            OrderSide::Sell => (
                price * (Decimal::ONE + params.stop_loss_pct),
                price * (Decimal::ONE - params.take_profit_pct),
            ),
        };

        let amount = if self.config.use_fixed_amount {
            Some(quantize_amount(self.config.fixed_amount))
        } else {
            let distance = (price - stop_loss).abs();
            if distance.is_zero() {
                debug!("entry skipped at {}: zero stop distance", candle.timestamp);
                state.diagnostics.skipped_zero_stop_distance += 1;
                return;
            }
            (state.capital() * self.config.risk_per_trade_fraction)
                .checked_div(distance)
                .map(quantize_amount)
        };

        let entry_price = self.cost.entry_price(price, side);
        let required = amount.and_then(|amount| {
            let notional = entry_price.checked_mul(amount)?;
            let commission = self.cost.compute_commission(entry_price, amount);
            Some((amount, commission, notional.checked_add(commission)?))
        });
        let Some((amount, commission, required)) = required.filter(|(a, _, _)| *a > Decimal::ZERO)
        else {
            debug!("entry skipped at {}: size not representable", candle.timestamp);
            state.diagnostics.skipped_insufficient_capital += 1;
            return;
        };
        if required > state.capital() {
            debug!(
                "entry skipped at {}: needs {} but capital is {}",
                candle.timestamp,
                required,
                state.capital()
            );
            state.diagnostics.skipped_insufficient_capital += 1;
            return;
        }

        info!(
            "open {} {} {} @ {} (stop {}, target {})",
            side, amount, signal.symbol, entry_price, stop_loss, take_profit
        );
        state.ledger.charge_commission(commission);
        state.position = Some(Position {
            symbol: signal.symbol.clone(),
            side,
            entry_price,
            amount,
            entry_time: candle.timestamp,
            stop_loss,
            take_profit,
        });
        state.diagnostics.entries_opened += 1;
    }

    fn close_position(&mut self, state: &mut EngineState, candle: &Candle, reason: ExitReason) {
        let Some(position) = state.position.take() else {
            return;
        };
        let exit_price = self.cost.exit_price(candle.close, position.side);
        let gross = position.unrealized_pnl(exit_price);
        let exit_commission = self.cost.compute_commission(exit_price, position.amount);
        let pnl = quantize_cash(gross - exit_commission);
        let pnl_percent = pnl
            .checked_div(position.notional())
            .map(|r| r * Decimal::ONE_HUNDRED)
            .unwrap_or(Decimal::ZERO);

        let trade = Trade {
            id: state.id_gen.next_trade_id(),
            symbol: position.symbol,
            side: position.side,
            entry_price: position.entry_price,
            exit_price,
            amount: position.amount,
            entry_time: position.entry_time,
            exit_time: candle.timestamp,
            pnl,
            pnl_percent,
            commission: exit_commission * Decimal::TWO,
            stop_loss: position.stop_loss,
            take_profit: position.take_profit,
            exit_reason: reason,
        };
        info!(
            "close {} {} @ {} ({}): pnl {}",
            trade.id, trade.symbol, exit_price, reason, pnl
        );
        let booked = state.ledger.book_trade(trade, exit_commission);
        self.observers.trade(booked);
    }

    fn record_equity(&mut self, state: &mut EngineState, time: DateTime<Utc>, mark: Decimal) {
        let equity = state.ledger.equity(state.position.as_ref(), mark);
        let point = state.ledger.record_equity(time, equity);
        self.observers.equity(&point);
    }
}

impl std::fmt::Debug for BacktestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacktestEngine")
            .field("symbol", &self.data.symbol)
            .field("candles", &self.data.len())
            .field("config", &self.config)
            .field("observers", &self.observers)
            .finish()
    }
}
