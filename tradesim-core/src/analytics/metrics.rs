//! Performance metrics: pure functions over the trade ledger and equity curve.
//!
//! Every metric is a pure function with no dependency on the engine. The risk
//! manager reuses the same functions for its session statistics.

use crate::domain::{EquityPoint, TimeRange, Trade};
use chrono::Duration as ChronoDuration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Seconds in a 365.25-day year.
const SECONDS_PER_YEAR: Decimal = dec!(31557600);

/// Aggregate performance of one run. Percentages are in percent, not fractions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    // ── Returns ──
    pub total_return: Decimal,
    pub total_return_pct: Decimal,
    pub annualized_return: Decimal,

    // ── Trade counts ──
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: Decimal,

    // ── Profit / loss ──
    pub total_profit: Decimal,
    /// Magnitude of losing PnL, always non-negative.
    pub total_loss: Decimal,
    pub avg_profit_win: Decimal,
    pub avg_loss_lose: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    pub profit_factor: Decimal,

    // ── Risk ──
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: Decimal,
    /// Not computed; always zero.
    pub sharpe_ratio: Decimal,

    // ── Time ──
    pub avg_trade_duration: Duration,
    pub total_duration: Duration,

    // ── Raw series ──
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl PerformanceMetrics {
    /// Derive all metrics. With no trades, every scalar stays zero and only the series are attached.
    pub fn compute(
        trades: Vec<Trade>,
        equity_curve: Vec<EquityPoint>,
        initial_capital: Decimal,
        final_capital: Decimal,
        time_range: Option<TimeRange>,
    ) -> Self {
        let mut metrics = Self {
            total_trades: trades.len(),
            ..Self::default()
        };
        if trades.is_empty() {
            metrics.trades = trades;
            metrics.equity_curve = equity_curve;
            return metrics;
        }

        metrics.total_return = final_capital - initial_capital;
        metrics.total_return_pct = percent_of(metrics.total_return, initial_capital);

        let pnls: Vec<Decimal> = trades.iter().map(|t| t.pnl).collect();
        let summary = PnlSummary::from_pnls(&pnls);
        metrics.winning_trades = summary.wins;
        metrics.losing_trades = summary.losses;
        metrics.total_profit = summary.total_profit;
        metrics.total_loss = summary.total_loss;
        metrics.largest_win = summary.largest_win;
        metrics.largest_loss = summary.largest_loss;
        metrics.win_rate = win_rate(summary.wins, trades.len());
        metrics.avg_profit_win = average(summary.total_profit, summary.wins);
        metrics.avg_loss_lose = average(summary.total_loss, summary.losses);
        metrics.profit_factor = profit_factor(summary.total_profit, summary.total_loss);

        let (dd, dd_pct) = max_drawdown(equity_curve.iter().map(|p| p.equity), initial_capital);
        metrics.max_drawdown = dd;
        metrics.max_drawdown_pct = dd_pct;

        metrics.avg_trade_duration =
            to_std(average_duration(trades.iter().map(Trade::duration)));
        if let Some(range) = time_range {
            metrics.annualized_return = annualized_return(metrics.total_return_pct, range.duration());
            metrics.total_duration = to_std(range.duration());
        }

        metrics.trades = trades;
        metrics.equity_curve = equity_curve;
        metrics
    }

    pub fn final_equity(&self) -> Option<Decimal> {
        self.equity_curve.last().map(|p| p.equity)
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Win/loss split of a PnL series. A zero PnL is a loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PnlSummary {
    pub wins: usize,
    pub losses: usize,
    pub total_profit: Decimal,
    pub total_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
}

impl PnlSummary {
    pub fn from_pnls(pnls: &[Decimal]) -> Self {
        let mut s = Self::default();
        for &pnl in pnls {
            if pnl > Decimal::ZERO {
                s.wins += 1;
                s.total_profit += pnl;
                s.largest_win = s.largest_win.max(pnl);
            } else {
                let loss = pnl.abs();
                s.losses += 1;
                s.total_loss += loss;
                s.largest_loss = s.largest_loss.max(loss);
            }
        }
        s
    }

    pub fn net_pnl(&self) -> Decimal {
        self.total_profit - self.total_loss
    }
}

/// `wins / total × 100`, zero when there are no trades.
pub fn win_rate(wins: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(wins) / Decimal::from(total) * Decimal::ONE_HUNDRED
}

/// `total_profit / total_loss`, defined as zero when there is no loss.
pub fn profit_factor(total_profit: Decimal, total_loss: Decimal) -> Decimal {
    if total_loss.is_zero() {
        return Decimal::ZERO;
    }
    total_profit.checked_div(total_loss).unwrap_or(Decimal::ZERO)
}

/// Largest absolute peak-to-trough decline, with its percentage relative to the
/// peak at that instant. The peak starts at `seed_peak`.
///
/// The percentage is the one paired with the largest absolute drawdown, which
/// need not be the largest percentage drawdown. It is capped at 100.
pub fn max_drawdown(
    equity: impl IntoIterator<Item = Decimal>,
    seed_peak: Decimal,
) -> (Decimal, Decimal) {
    let mut peak = seed_peak;
    let mut max_dd = Decimal::ZERO;
    let mut max_dd_pct = Decimal::ZERO;
    for value in equity {
        if value > peak {
            peak = value;
        }
        let dd = peak - value;
        if dd > max_dd {
            max_dd = dd;
            if peak > Decimal::ZERO {
                max_dd_pct = percent_of(dd, peak).min(Decimal::ONE_HUNDRED);
            }
        }
    }
    (max_dd, max_dd_pct)
}

/// Drawdown of `current` below `peak`, in percent. Zero when at or above peak.
pub fn drawdown_pct(peak: Decimal, current: Decimal) -> Decimal {
    if peak <= Decimal::ZERO || current >= peak {
        return Decimal::ZERO;
    }
    percent_of(peak - current, peak)
}

/// `total_return_pct / years`, with years measured in 365.25-day units. Zero for a non-positive span.
pub fn annualized_return(total_return_pct: Decimal, span: ChronoDuration) -> Decimal {
    let secs = span.num_seconds();
    if secs <= 0 {
        return Decimal::ZERO;
    }
    let years = Decimal::from(secs) / SECONDS_PER_YEAR;
    total_return_pct.checked_div(years).unwrap_or(Decimal::ZERO)
}

/// Mean of `durations`, zero when empty.
pub fn average_duration(durations: impl IntoIterator<Item = ChronoDuration>) -> ChronoDuration {
    let (sum, count) = durations
        .into_iter()
        .fold((ChronoDuration::zero(), 0i32), |(sum, n), d| (sum + d, n + 1));
    if count == 0 {
        return ChronoDuration::zero();
    }
    sum / count
}

fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    part.checked_div(whole)
        .map(|r| r * Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::ZERO)
}

fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    total / Decimal::from(count)
}

fn to_std(d: ChronoDuration) -> Duration {
    d.to_std().unwrap_or_default()
}
