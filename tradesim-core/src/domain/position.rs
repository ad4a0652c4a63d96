use super::order::OrderSide;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The engine's single open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: OrderSide,
    /// Booked entry price, slippage included.
    pub entry_price: Decimal,
    pub amount: Decimal,
    pub entry_time: DateTime<Utc>,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.side.is_long()
    }

    pub fn is_short(&self) -> bool {
        !self.is_long()
    }

    pub fn notional(&self) -> Decimal {
        self.entry_price * self.amount
    }

    /// Mark-to-market PnL at `price`, before exit costs.
    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        match self.side {
            OrderSide::Buy => (price - self.entry_price) * self.amount,
            OrderSide::Sell => (self.entry_price - price) * self.amount,
        }
    }

    /// Stop-loss hit within `[low, high]`.
    pub fn stop_hit(&self, low: Decimal, high: Decimal) -> bool {
        match self.side {
            OrderSide::Buy => low <= self.stop_loss,
            OrderSide::Sell => high >= self.stop_loss,
        }
    }

    /// Take-profit hit within `[low, high]`.
    pub fn target_hit(&self, low: Decimal, high: Decimal) -> bool {
        match self.side {
            OrderSide::Buy => high >= self.take_profit,
            OrderSide::Sell => low <= self.take_profit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn position(side: OrderSide) -> Position {
        let (stop_loss, take_profit) = match side {
            OrderSide::Buy => (dec!(95), dec!(110)),
            OrderSide::Sell => (dec!(105), dec!(90)),
        };
        Position {
            symbol: "BTC-USD".into(),
            side,
            entry_price: dec!(100),
            amount: dec!(2),
            entry_time: Utc::now(),
            stop_loss,
            take_profit,
        }
    }

    #[test]
    fn long_unrealized_pnl() {
        let pos = position(OrderSide::Buy);
        assert_eq!(pos.unrealized_pnl(dec!(103)), dec!(6));
        assert_eq!(pos.unrealized_pnl(dec!(97)), dec!(-6));
    }

    #[test]
    fn short_unrealized_pnl() {
        let pos = position(OrderSide::Sell);
        assert_eq!(pos.unrealized_pnl(dec!(97)), dec!(6));
        assert!(pos.is_short());
    }

    #[test]
    fn exit_levels_mirror_for_short() {
        let long = position(OrderSide::Buy);
        assert!(long.stop_hit(dec!(95), dec!(101)));
        assert!(long.target_hit(dec!(99), dec!(110)));
        assert!(!long.stop_hit(dec!(96), dec!(109)));

        let short = position(OrderSide::Sell);
        assert!(short.stop_hit(dec!(99), dec!(105)));
        assert!(short.target_hit(dec!(90), dec!(101)));
        assert!(!short.target_hit(dec!(91), dec!(104)));
    }
}
