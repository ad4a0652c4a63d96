//! Risk gate and position sizing.
//!
//! [`RiskManager`] is shared between event sources behind an `Arc`. Every
//! mutation goes through its own methods under a write lock; reads take the
//! read lock. Time comes from an injected [`Clock`].

pub mod clock;
pub mod manager;
pub mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{BlockReason, RiskError, RiskManager, TradePermission, TradeResult};
pub use stats::RiskStats;
