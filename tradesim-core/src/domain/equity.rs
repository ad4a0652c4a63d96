use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account value sampled at one point in time: capital plus unrealized PnL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub time: DateTime<Utc>,
    pub equity: Decimal,
}

impl EquityPoint {
    pub fn new(time: DateTime<Utc>, equity: Decimal) -> Self {
        Self { time, equity }
    }
}
