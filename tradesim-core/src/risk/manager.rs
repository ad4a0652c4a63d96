//! Risk manager: trade permission, order validation, sizing and session tracking.

use super::clock::{Clock, SystemClock};
use super::stats::RiskStats;
use crate::analytics::metrics::{drawdown_pct, profit_factor, win_rate};
use crate::config::{ConfigError, RiskConfig};
use crate::domain::{OrderRequest, OrderSide, Trade};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Order rejections from [`RiskManager::validate_order`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RiskError {
    #[error("maximum number of positions ({max}) reached")]
    MaxPositionsReached { max: usize },

    #[error("position size {size} exceeds maximum {max}")]
    PositionSizeExceeded { size: Decimal, max: Decimal },

    #[error("position size {size} exceeds leverage limit {limit} ({leverage}x balance)")]
    LeverageExceeded {
        size: Decimal,
        limit: Decimal,
        leverage: Decimal,
    },

    #[error("stop loss is required")]
    MissingStopLoss,
}

/// Why trading is currently blocked.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockReason {
    Cooldown { remaining: Duration },
    DailyLossLimit { daily_pnl: Decimal, limit: Decimal },
    DailyTradeLimit { trades: u32, limit: u32 },
    BalanceBelowMinimum { balance: Decimal, minimum: Decimal },
    MaxDrawdownExceeded { drawdown_pct: Decimal, limit: Decimal },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::Cooldown { remaining } => {
                write!(f, "in cooldown period, {}s remaining", remaining.num_seconds())
            }
            BlockReason::DailyLossLimit { daily_pnl, limit } => {
                write!(f, "daily loss limit reached ({daily_pnl} < -{limit})")
            }
            BlockReason::DailyTradeLimit { trades, limit } => {
                write!(f, "daily trade limit reached ({trades}/{limit})")
            }
            BlockReason::BalanceBelowMinimum { balance, minimum } => {
                write!(f, "account balance {balance} below minimum {minimum}")
            }
            BlockReason::MaxDrawdownExceeded {
                drawdown_pct,
                limit,
            } => write!(
                f,
                "maximum drawdown exceeded: {:.2}% > {limit}%",
                drawdown_pct
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TradePermission {
    Allowed,
    Blocked(BlockReason),
}

impl TradePermission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, TradePermission::Allowed)
    }

    pub fn reason(&self) -> Option<&BlockReason> {
        match self {
            TradePermission::Allowed => None,
            TradePermission::Blocked(reason) => Some(reason),
        }
    }
}

/// Outcome of one closed trade as reported to the risk manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub side: OrderSide,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub amount: Decimal,
    pub pnl: Decimal,
    pub is_win: bool,
}

impl From<&Trade> for TradeResult {
    fn from(trade: &Trade) -> Self {
        Self {
            timestamp: trade.exit_time,
            symbol: trade.symbol.clone(),
            side: trade.side,
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            amount: trade.amount,
            pnl: trade.pnl,
            is_win: trade.is_win(),
        }
    }
}

#[derive(Debug, Clone)]
struct RiskState {
    daily_pnl: Decimal,
    consecutive_losses: u32,
    trades_executed_today: u32,
    cooldown_until: Option<DateTime<Utc>>,
    starting_balance: Decimal,
    current_balance: Decimal,
    peak_balance: Decimal,
    trade_history: Vec<TradeResult>,
    last_reset_date: NaiveDate,
    last_trade_time: Option<DateTime<Utc>>,
}

impl RiskState {
    fn new(balance: Decimal, today: NaiveDate) -> Self {
        Self {
            daily_pnl: Decimal::ZERO,
            consecutive_losses: 0,
            trades_executed_today: 0,
            cooldown_until: None,
            starting_balance: balance,
            current_balance: balance,
            peak_balance: balance,
            trade_history: Vec::new(),
            last_reset_date: today,
            last_trade_time: None,
        }
    }

    /// Daily counters as of `now`. A new UTC calendar date reads as a fresh day.
    fn daily(&self, now: DateTime<Utc>) -> (Decimal, u32) {
        if now.date_naive() != self.last_reset_date {
            (Decimal::ZERO, 0)
        } else {
            (self.daily_pnl, self.trades_executed_today)
        }
    }

    fn roll_day(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if today != self.last_reset_date {
            info!(
                "daily risk counters reset for {} (previous day {}: pnl {}, {} trades)",
                today, self.last_reset_date, self.daily_pnl, self.trades_executed_today
            );
            self.daily_pnl = Decimal::ZERO;
            self.trades_executed_today = 0;
            self.last_reset_date = today;
        }
    }

    fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.cooldown_until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    fn drawdown_pct(&self) -> Decimal {
        drawdown_pct(self.peak_balance, self.current_balance)
    }

    fn observe_balance(&mut self, balance: Decimal) {
        self.current_balance = balance;
        if balance > self.peak_balance {
            self.peak_balance = balance;
        }
    }
}

/// Gatekeeper for live or simulated order flow.
///
/// One instance per trading session. Share it with `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct RiskManager {
    config: RiskConfig,
    clock: Arc<dyn Clock>,
    state: RwLock<RiskState>,
}

impl RiskManager {
    pub fn new(config: RiskConfig, initial_balance: Decimal) -> Result<Self, ConfigError> {
        Self::with_clock(config, initial_balance, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: RiskConfig,
        initial_balance: Decimal,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let today = clock.now().date_naive();
        Ok(Self {
            config,
            clock,
            state: RwLock::new(RiskState::new(initial_balance, today)),
        })
    }

    // A panic while holding the lock leaves plain counters behind, which are still usable.
    fn read(&self) -> RwLockReadGuard<'_, RiskState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RiskState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Gate ──

    /// Checked in order: cooldown, daily loss, daily trade count, minimum balance, drawdown.
    pub fn can_trade(&self) -> TradePermission {
        let now = self.clock.now();
        let state = self.read();

        if let Some(remaining) = state.cooldown_remaining(now) {
            return TradePermission::Blocked(BlockReason::Cooldown { remaining });
        }

        let (daily_pnl, trades_today) = state.daily(now);
        if daily_pnl < -self.config.max_daily_loss {
            return TradePermission::Blocked(BlockReason::DailyLossLimit {
                daily_pnl,
                limit: self.config.max_daily_loss,
            });
        }
        if trades_today >= self.config.daily_trading_limit {
            return TradePermission::Blocked(BlockReason::DailyTradeLimit {
                trades: trades_today,
                limit: self.config.daily_trading_limit,
            });
        }
        if state.current_balance < self.config.min_account_balance {
            return TradePermission::Blocked(BlockReason::BalanceBelowMinimum {
                balance: state.current_balance,
                minimum: self.config.min_account_balance,
            });
        }
        let drawdown = state.drawdown_pct();
        if drawdown > self.config.max_drawdown_pct {
            return TradePermission::Blocked(BlockReason::MaxDrawdownExceeded {
                drawdown_pct: drawdown,
                limit: self.config.max_drawdown_pct,
            });
        }
        TradePermission::Allowed
    }

    /// Reject an order that would breach position count, size, or leverage, or that has no stop.
    ///
    /// Notional is capped at `current_balance × max_leverage`, not at the per-trade risk
    /// fraction of balance. Per-trade risk is bounded by [`Self::calculate_position_size`].
    pub fn validate_order(
        &self,
        request: &OrderRequest,
        open_positions: usize,
    ) -> Result<(), RiskError> {
        let state = self.read();

        if open_positions >= self.config.max_positions {
            return Err(RiskError::MaxPositionsReached {
                max: self.config.max_positions,
            });
        }

        let size = request.notional();
        if size > self.config.max_position_size {
            return Err(RiskError::PositionSizeExceeded {
                size,
                max: self.config.max_position_size,
            });
        }

        let limit = state.current_balance * self.config.max_leverage;
        if size > limit {
            return Err(RiskError::LeverageExceeded {
                size,
                limit,
                leverage: self.config.max_leverage,
            });
        }

        if !request.has_stop_loss() {
            return Err(RiskError::MissingStopLoss);
        }
        Ok(())
    }

    /// Units to trade so that hitting `stop` loses `balance × risk_per_trade_fraction`,
    /// capped at `max_position_size / entry`. Zero for a zero stop distance.
    pub fn calculate_position_size(&self, entry: Decimal, stop: Decimal, balance: Decimal) -> Decimal {
        let distance = (entry - stop).abs();
        if distance.is_zero() || entry <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let risk_amount = balance * self.config.risk_per_trade_fraction;
        let size = risk_amount.checked_div(distance).unwrap_or(Decimal::MAX);
        let cap = self
            .config
            .max_position_size
            .checked_div(entry)
            .unwrap_or(Decimal::MAX);
        size.min(cap)
    }

    // ── Session tracking ──

    /// Book a closed trade. Rolls the daily counters first if the UTC date changed.
    pub fn record_trade(&self, result: TradeResult) {
        let now = self.clock.now();
        let mut state = self.write();
        state.roll_day(now);

        state.daily_pnl += result.pnl;
        let balance = state.current_balance + result.pnl;
        state.observe_balance(balance);

        if result.is_win {
            state.consecutive_losses = 0;
        } else {
            state.consecutive_losses += 1;
            if state.consecutive_losses >= self.config.consecutive_loss_limit {
                let until = now + self.config.cooldown_period();
                warn!(
                    "{} consecutive losses, trading paused until {}",
                    state.consecutive_losses, until
                );
                state.cooldown_until = Some(until);
                state.consecutive_losses = 0;
            }
        }

        state.trades_executed_today += 1;
        state.last_trade_time = Some(now);
        state.trade_history.push(result);
    }

    /// Sync the balance from an external source (e.g. a venue balance query).
    pub fn update_balance(&self, balance: Decimal) {
        self.write().observe_balance(balance);
    }

    // ── Read accessors ──

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn current_balance(&self) -> Decimal {
        self.read().current_balance
    }

    pub fn peak_balance(&self) -> Decimal {
        self.read().peak_balance
    }

    pub fn daily_pnl(&self) -> Decimal {
        self.read().daily(self.clock.now()).0
    }

    pub fn daily_trade_count(&self) -> u32 {
        self.read().daily(self.clock.now()).1
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.read().consecutive_losses
    }

    pub fn is_in_cooldown(&self) -> bool {
        self.read().cooldown_remaining(self.clock.now()).is_some()
    }

    pub fn cooldown_remaining(&self) -> Duration {
        self.read()
            .cooldown_remaining(self.clock.now())
            .unwrap_or_else(Duration::zero)
    }

    pub fn last_trade_time(&self) -> Option<DateTime<Utc>> {
        self.read().last_trade_time
    }

    /// Percent below peak balance.
    pub fn drawdown_pct(&self) -> Decimal {
        self.read().drawdown_pct()
    }

    pub fn trade_history(&self) -> Vec<TradeResult> {
        self.read().trade_history.clone()
    }

    pub fn stats(&self) -> RiskStats {
        let now = self.clock.now();
        let state = self.read();

        let mut stats = RiskStats {
            total_trades: state.trade_history.len(),
            ..RiskStats::default()
        };
        for trade in &state.trade_history {
            if trade.is_win {
                stats.winning_trades += 1;
                stats.total_profit += trade.pnl;
            } else {
                stats.losing_trades += 1;
                stats.total_loss += trade.pnl.abs();
            }
        }
        stats.win_rate = win_rate(stats.winning_trades, stats.total_trades);
        stats.profit_factor = profit_factor(stats.total_profit, stats.total_loss);
        stats.net_pnl = stats.total_profit - stats.total_loss;

        let (daily_pnl, trades_today) = state.daily(now);
        stats.current_drawdown = state.drawdown_pct();
        stats.consecutive_losses = state.consecutive_losses;
        stats.daily_pnl = daily_pnl;
        stats.trades_executed_today = trades_today;
        stats.current_balance = state.current_balance;
        stats.starting_balance = state.starting_balance;
        stats.peak_balance = state.peak_balance;
        stats.in_cooldown = state.cooldown_remaining(now).is_some();
        stats
    }
}
