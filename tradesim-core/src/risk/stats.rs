use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Snapshot of the risk manager's session, derived from its trade history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskStats {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percent.
    pub win_rate: Decimal,
    pub total_profit: Decimal,
    pub total_loss: Decimal,
    /// `total_profit − total_loss`
    pub net_pnl: Decimal,
    pub profit_factor: Decimal,
    /// Percent below peak balance.
    pub current_drawdown: Decimal,
    pub consecutive_losses: u32,
    pub daily_pnl: Decimal,
    pub trades_executed_today: u32,
    pub current_balance: Decimal,
    pub starting_balance: Decimal,
    pub peak_balance: Decimal,
    pub in_cooldown: bool,
}
