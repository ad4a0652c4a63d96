use serde::{Deserialize, Serialize};
use std::fmt;

/// Order ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade ID. Deterministic within a run so that replays are byte-for-byte comparable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeId(pub String);

impl TradeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic ID source, one per engine run.
#[derive(Debug, Default, Clone)]
pub struct IdGen {
    next_trade: u64,
}

impl IdGen {
    pub fn next_trade_id(&mut self) -> TradeId {
        self.next_trade += 1;
        TradeId(format!("T-{:06}", self.next_trade))
    }
}
