//! Cost model for slippage and commission.
//!
//! Slippage is directional and always adverse: the side that is buying pays
//! more, the side that is selling receives less. Commission is a flat fraction
//! of notional per side.
//!
//! Sizes and cash amounts are quantized to a fixed scale so that capital,
//! which accumulates every realized PnL, never needs to round.

use crate::config::BacktestConfig;
use crate::domain::OrderSide;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for position sizes.
pub const AMOUNT_DP: u32 = 8;

/// Decimal places kept for commission and realized PnL.
pub const CASH_DP: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostModel {
    pub slippage_rate: Decimal,
    pub commission_rate: Decimal,
}

impl CostModel {
    pub fn new(slippage_rate: Decimal, commission_rate: Decimal) -> Self {
        Self {
            slippage_rate,
            commission_rate,
        }
    }

    pub fn from_config(config: &BacktestConfig) -> Self {
        Self::new(config.slippage_rate, config.commission_rate)
    }

    pub fn frictionless() -> Self {
        Self::new(Decimal::ZERO, Decimal::ZERO)
    }

    /// Price after slippage for an order on `side`.
    pub fn apply_slippage(&self, raw_price: Decimal, side: OrderSide) -> Decimal {
        if self.slippage_rate.is_zero() {
            return raw_price;
        }
        match side {
            OrderSide::Buy => raw_price * (Decimal::ONE + self.slippage_rate),
            OrderSide::Sell => raw_price * (Decimal::ONE - self.slippage_rate),
        }
    }

    /// Entry fill price for a position on `position_side`.
    pub fn entry_price(&self, signal_price: Decimal, position_side: OrderSide) -> Decimal {
        self.apply_slippage(signal_price, position_side)
    }

    /// Exit fill price for a position on `position_side`. Closing trades the opposite side.
    pub fn exit_price(&self, close: Decimal, position_side: OrderSide) -> Decimal {
        self.apply_slippage(close, position_side.opposite())
    }

    /// `commission = price × amount × commission_rate`, at [`CASH_DP`] places.
    pub fn compute_commission(&self, price: Decimal, amount: Decimal) -> Decimal {
        (price * amount * self.commission_rate).round_dp(CASH_DP)
    }
}

/// Truncate a size to [`AMOUNT_DP`] places. Never rounds up, so a sized entry
/// never risks more than asked.
pub fn quantize_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_DP, RoundingStrategy::ToZero)
}

/// Round a cash amount to [`CASH_DP`] places.
pub fn quantize_cash(value: Decimal) -> Decimal {
    value.round_dp(CASH_DP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn frictionless_returns_raw_price() {
        let cost = CostModel::frictionless();
        assert_eq!(cost.apply_slippage(dec!(100), OrderSide::Buy), dec!(100));
        assert_eq!(cost.compute_commission(dec!(100), dec!(50)), Decimal::ZERO);
    }

    #[test]
    fn long_pays_up_on_entry_and_gives_up_on_exit() {
        let cost = CostModel::new(dec!(0.001), Decimal::ZERO);
        assert_eq!(cost.entry_price(dec!(100), OrderSide::Buy), dec!(100.1));
        assert_eq!(cost.exit_price(dec!(100), OrderSide::Buy), dec!(99.9));
    }

    #[test]
    fn short_is_mirrored() {
        let cost = CostModel::new(dec!(0.001), Decimal::ZERO);
        assert_eq!(cost.entry_price(dec!(100), OrderSide::Sell), dec!(99.9));
        assert_eq!(cost.exit_price(dec!(100), OrderSide::Sell), dec!(100.1));
    }

    #[test]
    fn commission_on_notional() {
        let cost = CostModel::new(Decimal::ZERO, dec!(0.001));
        assert_eq!(cost.compute_commission(dec!(50000), dec!(0.1)), dec!(5));
    }

    #[test]
    fn commission_is_quantized() {
        let cost = CostModel::new(Decimal::ZERO, dec!(0.001));
        assert_eq!(
            cost.compute_commission(dec!(100.05), dec!(0.123456789)),
            dec!(0.01235185)
        );
    }

    #[test]
    fn amounts_truncate_toward_zero() {
        assert_eq!(quantize_amount(dec!(0.333333333333)), dec!(0.33333333));
        assert_eq!(quantize_amount(dec!(1.999999999)), dec!(1.99999999));
        assert_eq!(quantize_cash(dec!(2.000000005)), dec!(2.00000000));
    }
}
