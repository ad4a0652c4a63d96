//! Human-readable reports for a single run.

use std::time::Duration;

use rust_decimal::Decimal;

use crate::runner::BacktestResult;

/// Trades listed at the bottom of the report.
const RECENT_TRADES: usize = 10;

/// One-line summary for terminal output.
pub fn render_summary(result: &BacktestResult) -> String {
    let m = &result.metrics;
    format!(
        "Return: {:.2}% | Trades: {} | Win Rate: {:.2}% | Max DD: {:.2}% | Profit Factor: {:.2}",
        m.total_return_pct, m.total_trades, m.win_rate, m.max_drawdown_pct, m.profit_factor
    )
}

/// Markdown report: performance, trade statistics, P/L, risk session, diagnostics, recent trades.
pub fn render_report(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Run\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Run | {} |\n", short_id(&result.run_id)));
    md.push_str(&format!("| Symbol | {} |\n", result.symbol));
    md.push_str(&format!("| Strategy | {} |\n", result.strategy));
    md.push_str(&format!("| Candles | {} |\n", result.candle_count));
    if result.skipped_rows > 0 {
        md.push_str(&format!("| Skipped Rows | {} |\n", result.skipped_rows));
    }
    md.push_str(&format!("| Dataset Hash | {} |\n", short_id(&result.dataset_hash)));
    if result.synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Overall Performance\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Capital | {} -> {} |\n",
        money(result.initial_capital),
        money(result.final_capital)
    ));
    md.push_str(&format!(
        "| Total Return | {} ({:.2}%) |\n",
        money(m.total_return),
        m.total_return_pct
    ));
    md.push_str(&format!("| Annualized Return | {:.2}% |\n", m.annualized_return));
    md.push_str(&format!(
        "| Max Drawdown | {} ({:.2}%) |\n",
        money(m.max_drawdown),
        m.max_drawdown_pct
    ));
    if !m.sharpe_ratio.is_zero() {
        md.push_str(&format!("| Sharpe | {:.2} |\n", m.sharpe_ratio));
    }
    md.push_str(&format!(
        "| Total Duration | {} |\n",
        format_duration(m.total_duration)
    ));
    md.push('\n');

    md.push_str("## Trade Statistics\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Trades | {} |\n", m.total_trades));
    md.push_str(&format!("| Winning | {} |\n", m.winning_trades));
    md.push_str(&format!("| Losing | {} |\n", m.losing_trades));
    md.push_str(&format!("| Win Rate | {:.2}% |\n", m.win_rate));
    md.push_str(&format!(
        "| Avg Trade Duration | {} |\n",
        format_duration(m.avg_trade_duration)
    ));
    md.push('\n');

    md.push_str("## Profit / Loss\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Total Profit | {} |\n", money(m.total_profit)));
    md.push_str(&format!("| Total Loss | {} |\n", money(m.total_loss)));
    md.push_str(&format!("| Profit Factor | {:.2} |\n", m.profit_factor));
    md.push_str(&format!("| Avg Win | {} |\n", money(m.avg_profit_win)));
    md.push_str(&format!("| Avg Loss | {} |\n", money(m.avg_loss_lose)));
    md.push_str(&format!("| Largest Win | {} |\n", money(m.largest_win)));
    md.push_str(&format!("| Largest Loss | {} |\n", money(m.largest_loss)));
    md.push('\n');

    let r = &result.risk_stats;
    md.push_str("## Risk Session\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Net PnL | {} |\n", money(r.net_pnl)));
    md.push_str(&format!("| Peak Balance | {} |\n", money(r.peak_balance)));
    md.push_str(&format!("| Current Drawdown | {:.2}% |\n", r.current_drawdown));
    md.push_str(&format!("| Loss Streak | {} |\n", r.consecutive_losses));
    md.push_str(&format!("| In Cooldown | {} |\n", r.in_cooldown));
    md.push_str(&format!(
        "| Trades Gate Would Block | {} |\n",
        result.gate_blocked_trades
    ));
    md.push('\n');

    let d = &result.diagnostics;
    if d.skipped_entries() > 0 || d.ignored_exit_signals > 0 || d.observer_faults > 0 {
        md.push_str("## Diagnostics\n\n");
        md.push_str("| Counter | Value |\n");
        md.push_str("| --- | --- |\n");
        md.push_str(&format!("| Signals | {} |\n", d.signals_seen));
        md.push_str(&format!("| Entries | {} |\n", d.entries_opened));
        md.push_str(&format!("| Skipped: position open | {} |\n", d.skipped_position_open));
        md.push_str(&format!("| Skipped: short disabled | {} |\n", d.skipped_short_disallowed));
        md.push_str(&format!("| Skipped: weak signal | {} |\n", d.skipped_weak_signal));
        md.push_str(&format!("| Skipped: zero stop distance | {} |\n", d.skipped_zero_stop_distance));
        md.push_str(&format!(
            "| Skipped: insufficient capital | {} |\n",
            d.skipped_insufficient_capital
        ));
        md.push_str(&format!("| Ignored exits | {} |\n", d.ignored_exit_signals));
        md.push_str(&format!("| Observer faults | {} |\n", d.observer_faults));
        md.push('\n');
    }

    if !m.trades.is_empty() {
        md.push_str(&format!("## Recent Trades (last {RECENT_TRADES})\n\n"));
        md.push_str("| Entry | Side | Entry Price | Exit Price | PnL | PnL % | Exit |\n");
        md.push_str("| --- | --- | --- | --- | --- | --- | --- |\n");
        let start = m.trades.len().saturating_sub(RECENT_TRADES);
        for t in &m.trades[start..] {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {:.2}% | {} |\n",
                t.entry_time.format("%m-%d %H:%M"),
                t.side,
                t.entry_price.round_dp(2),
                t.exit_price.round_dp(2),
                money(t.pnl),
                t.pnl_percent,
                t.exit_reason
            ));
        }
        md.push('\n');
    }

    md
}

fn money(value: Decimal) -> String {
    format!("${:.2}", value)
}

fn short_id(id: &str) -> &str {
    &id[..id.len().min(12)]
}

/// `45s`, `12m`, `3h5m`, `2d4h`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3_600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h{}m", s / 3_600, (s % 3_600) / 60),
        s => format!("{}d{}h", s / 86_400, (s % 86_400) / 3_600),
    }
}
