//! Trade ledger and equity curve for a single run.

use crate::domain::{EquityPoint, Position, Trade};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Cash capital, the closed-trade ledger and the sampled equity curve.
///
/// Capital moves only on entry commission and on realized trade PnL; the
/// position's notional is never debited.
#[derive(Debug, Clone)]
pub struct Ledger {
    initial_capital: Decimal,
    capital: Decimal,
    commission_paid: Decimal,
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
}

impl Ledger {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            capital: initial_capital,
            commission_paid: Decimal::ZERO,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn charge_commission(&mut self, commission: Decimal) {
        self.capital -= commission;
        self.commission_paid += commission;
    }

    /// Append a closed trade and realize its PnL.
    pub fn book_trade(&mut self, trade: Trade, exit_commission: Decimal) -> &Trade {
        self.capital += trade.pnl;
        self.commission_paid += exit_commission;
        self.trades.push(trade);
        &self.trades[self.trades.len() - 1]
    }

    /// Capital plus the open position's unrealized PnL at `mark`.
    pub fn equity(&self, position: Option<&Position>, mark: Decimal) -> Decimal {
        self.capital + position.map_or(Decimal::ZERO, |p| p.unrealized_pnl(mark))
    }

    pub fn record_equity(&mut self, time: DateTime<Utc>, equity: Decimal) -> EquityPoint {
        let point = EquityPoint::new(time, equity);
        self.equity_curve.push(point);
        point
    }

    pub fn initial_capital(&self) -> Decimal {
        self.initial_capital
    }

    pub fn capital(&self) -> Decimal {
        self.capital
    }

    pub fn commission_paid(&self) -> Decimal {
        self.commission_paid
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn total_pnl(&self) -> Decimal {
        self.capital - self.initial_capital
    }

    pub fn into_parts(self) -> (Vec<Trade>, Vec<EquityPoint>) {
        (self.trades, self.equity_curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitReason, OrderSide, TradeId};
    use rust_decimal_macros::dec;

    fn trade(pnl: Decimal) -> Trade {
        let now = Utc::now();
        Trade {
            id: TradeId::new("T-000001"),
            symbol: "BTC-USD".into(),
            side: OrderSide::Buy,
            entry_price: dec!(100),
            exit_price: dec!(101),
            amount: dec!(1),
            entry_time: now,
            exit_time: now,
            pnl,
            pnl_percent: Decimal::ZERO,
            commission: Decimal::ZERO,
            stop_loss: dec!(99),
            take_profit: dec!(102),
            exit_reason: ExitReason::Signal,
        }
    }

    #[test]
    fn commission_and_pnl_move_capital() {
        let mut ledger = Ledger::new(dec!(1000));
        ledger.charge_commission(dec!(2));
        ledger.book_trade(trade(dec!(10)), dec!(2));
        assert_eq!(ledger.capital(), dec!(1008));
        assert_eq!(ledger.commission_paid(), dec!(4));
        assert_eq!(ledger.total_pnl(), dec!(8));
        assert_eq!(ledger.trades().len(), 1);
    }

    #[test]
    fn equity_marks_open_position() {
        let ledger = Ledger::new(dec!(1000));
        let pos = Position {
            symbol: "BTC-USD".into(),
            side: OrderSide::Buy,
            entry_price: dec!(100),
            amount: dec!(2),
            entry_time: Utc::now(),
            stop_loss: dec!(90),
            take_profit: dec!(120),
        };
        assert_eq!(ledger.equity(Some(&pos), dec!(105)), dec!(1010));
        assert_eq!(ledger.equity(None, dec!(105)), dec!(1000));
    }
}
