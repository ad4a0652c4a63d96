//! Closed-position records.

use super::ids::TradeId;
use super::order::OrderSide;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Signal,
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Signal => "signal",
            ExitReason::EndOfData => "end_of_data",
        };
        f.write_str(s)
    }
}

/// A completed round trip. Created exactly once per position close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Identification ──
    pub id: TradeId,
    pub symbol: String,
    pub side: OrderSide,

    // ── Prices ──
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub amount: Decimal,

    // ── Timing ──
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,

    // ── PnL ──
    /// Net of the exit commission only; the entry commission was charged to capital at open.
    pub pnl: Decimal,
    pub pnl_percent: Decimal,
    /// Exit commission doubled, an estimate of the round-trip cost.
    pub commission: Decimal,

    // ── Levels ──
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn duration(&self) -> Duration {
        self.exit_time - self.entry_time
    }

    /// Strictly positive PnL. A flat trade counts as a loss.
    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }
}
