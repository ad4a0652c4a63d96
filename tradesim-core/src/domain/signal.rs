//! Signals are produced by strategies and consumed by the engine.

use super::order::OrderSide;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Entry,
    Exit,
    None,
}

/// A trading signal produced by a strategy. The engine never constructs these itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub side: OrderSide,
    pub symbol: String,
    pub price: Decimal,
    /// Conviction in `[0, 1]`.
    pub strength: f64,
    pub reason: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Signal {
    pub fn entry(symbol: impl Into<String>, side: OrderSide, price: Decimal, strength: f64) -> Self {
        Self {
            kind: SignalKind::Entry,
            side,
            symbol: symbol.into(),
            price,
            strength: strength.clamp(0.0, 1.0),
            reason: String::new(),
            timestamp: None,
        }
    }

    pub fn exit(symbol: impl Into<String>, side: OrderSide, price: Decimal) -> Self {
        Self {
            kind: SignalKind::Exit,
            side,
            symbol: symbol.into(),
            price,
            strength: 1.0,
            reason: String::new(),
            timestamp: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn is_actionable(&self) -> bool {
        self.kind != SignalKind::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn entry_clamps_strength() {
        let signal = Signal::entry("BTC-USD", OrderSide::Buy, dec!(100), 1.7);
        assert_eq!(signal.strength, 1.0);
        assert!(signal.is_actionable());
    }

    #[test]
    fn none_signal_is_not_actionable() {
        let mut signal = Signal::exit("BTC-USD", OrderSide::Buy, dec!(100));
        signal.kind = SignalKind::None;
        assert!(!signal.is_actionable());
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&SignalKind::Entry).unwrap();
        assert_eq!(json, "\"entry\"");
    }
}
