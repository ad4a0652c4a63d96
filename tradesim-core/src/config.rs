//! Engine, strategy and risk configuration.
//!
//! All three structs deserialize with per-field defaults so a partial TOML
//! table is valid. `validate()` is called by the engine and the risk manager
//! before any state is built.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: String },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: String },

    #[error("{field} must be a fraction in [0, 1), got {value}")]
    NotAFraction { field: &'static str, value: String },

    #[error("{field} must be a percentage in [0, 100], got {value}")]
    NotAPercent { field: &'static str, value: String },

    #[error("{field} must be at least {min}, got {value}")]
    TooSmall {
        field: &'static str,
        min: usize,
        value: usize,
    },

    #[error("start_time {start} is after end_time {end}")]
    InvertedRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("fixed_amount must be positive when use_fixed_amount is set")]
    MissingFixedAmount,
}

fn positive(field: &'static str, value: Decimal) -> Result<(), ConfigError> {
    if value <= Decimal::ZERO {
        return Err(ConfigError::NotPositive {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn non_negative(field: &'static str, value: Decimal) -> Result<(), ConfigError> {
    if value < Decimal::ZERO {
        return Err(ConfigError::Negative {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn fraction(field: &'static str, value: Decimal) -> Result<(), ConfigError> {
    if value < Decimal::ZERO || value >= Decimal::ONE {
        return Err(ConfigError::NotAFraction {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn at_least(field: &'static str, value: usize, min: usize) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::TooSmall { field, min, value });
    }
    Ok(())
}

// ── Backtest ──

/// Capital, cost and sizing settings for one replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub initial_capital: Decimal,
    /// Fraction of notional charged per side.
    pub commission_rate: Decimal,
    /// Adverse price move applied at every fill, as a fraction.
    pub slippage_rate: Decimal,
    pub use_fixed_amount: bool,
    pub fixed_amount: Decimal,
    /// Fraction of capital risked per trade when sizing off the stop distance.
    pub risk_per_trade_fraction: Decimal,
    /// Concurrent position cap. The engine holds one slot; values above 1 are accepted but unused.
    pub max_positions: usize,
    pub allow_short: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(10000),
            commission_rate: dec!(0.001),
            slippage_rate: dec!(0.0005),
            use_fixed_amount: false,
            fixed_amount: Decimal::ZERO,
            risk_per_trade_fraction: dec!(0.01),
            max_positions: 1,
            allow_short: false,
            start_time: None,
            end_time: None,
        }
    }
}

impl BacktestConfig {
    /// Zero commission and zero slippage.
    pub fn frictionless(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            commission_rate: Decimal::ZERO,
            slippage_rate: Decimal::ZERO,
            ..Self::default()
        }
    }

    pub fn with_fixed_amount(mut self, amount: Decimal) -> Self {
        self.use_fixed_amount = true;
        self.fixed_amount = amount;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("initial_capital", self.initial_capital)?;
        fraction("commission_rate", self.commission_rate)?;
        fraction("slippage_rate", self.slippage_rate)?;
        fraction("risk_per_trade_fraction", self.risk_per_trade_fraction)?;
        at_least("max_positions", self.max_positions, 1)?;
        if self.use_fixed_amount && self.fixed_amount <= Decimal::ZERO {
            return Err(ConfigError::MissingFixedAmount);
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start > end {
                return Err(ConfigError::InvertedRange { start, end });
            }
        }
        Ok(())
    }
}

// ── Strategy ──

/// The engine-facing half of a strategy: exit levels, signal filter and window shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    /// Entries need strictly greater strength than this.
    pub min_signal_strength: f64,
    /// Candle index from which the strategy is consulted.
    pub min_history_candles: usize,
    /// Trailing candles handed to the strategy.
    pub window_size: usize,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            stop_loss_pct: dec!(0.005),
            take_profit_pct: dec!(0.01),
            min_signal_strength: 0.1,
            min_history_candles: 25,
            window_size: 50,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        fraction("stop_loss_pct", self.stop_loss_pct)?;
        positive("take_profit_pct", self.take_profit_pct)?;
        if !(0.0..=1.0).contains(&self.min_signal_strength) {
            return Err(ConfigError::NotAFraction {
                field: "min_signal_strength",
                value: self.min_signal_strength.to_string(),
            });
        }
        at_least("window_size", self.window_size, 1)?;
        Ok(())
    }
}

// ── Risk ──

/// Limits enforced by the risk manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Notional cap per order (`amount × price`).
    pub max_position_size: Decimal,
    pub max_positions: usize,
    /// Notional cap as a multiple of current balance.
    pub max_leverage: Decimal,
    /// Absolute daily loss that blocks trading once exceeded.
    pub max_daily_loss: Decimal,
    /// Drawdown from peak, in percent.
    pub max_drawdown_pct: Decimal,
    pub risk_per_trade_fraction: Decimal,
    pub min_account_balance: Decimal,
    pub daily_trading_limit: u32,
    pub cooldown_period_secs: u64,
    pub consecutive_loss_limit: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_size: dec!(1000),
            max_positions: 3,
            max_leverage: dec!(5),
            max_daily_loss: dec!(100),
            max_drawdown_pct: dec!(10),
            risk_per_trade_fraction: dec!(0.01),
            min_account_balance: dec!(100),
            daily_trading_limit: 50,
            cooldown_period_secs: 15 * 60,
            consecutive_loss_limit: 3,
        }
    }
}

impl RiskConfig {
    pub fn cooldown_period(&self) -> Duration {
        // chrono caps durations at i64::MAX milliseconds
        let secs = self.cooldown_period_secs.min(i64::MAX as u64 / 1000);
        Duration::seconds(secs as i64)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_position_size", self.max_position_size)?;
        at_least("max_positions", self.max_positions, 1)?;
        positive("max_leverage", self.max_leverage)?;
        non_negative("max_daily_loss", self.max_daily_loss)?;
        if self.max_drawdown_pct < Decimal::ZERO || self.max_drawdown_pct > Decimal::ONE_HUNDRED {
            return Err(ConfigError::NotAPercent {
                field: "max_drawdown_pct",
                value: self.max_drawdown_pct.to_string(),
            });
        }
        fraction("risk_per_trade_fraction", self.risk_per_trade_fraction)?;
        non_negative("min_account_balance", self.min_account_balance)?;
        at_least(
            "consecutive_loss_limit",
            self.consecutive_loss_limit as usize,
            1,
        )?;
        Ok(())
    }
}
