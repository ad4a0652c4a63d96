//! Engine observer that replays closed trades through a risk manager.

use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tradesim_core::domain::Trade;
use tradesim_core::engine::EngineObserver;
use tradesim_core::risk::{ManualClock, RiskManager, TradePermission, TradeResult};

/// Feeds every closed trade into a shared [`RiskManager`].
///
/// With a [`ManualClock`] the manager sees historical time: the clock is set to
/// the trade's entry time to ask whether the gate would have allowed it, then to
/// the exit time before the trade is recorded. Trades the gate would have
/// refused are still recorded (the engine already took them) and counted.
pub struct RiskTrackingObserver {
    risk: Arc<RiskManager>,
    clock: Option<Arc<ManualClock>>,
    blocked: Arc<AtomicUsize>,
}

impl RiskTrackingObserver {
    /// Record trades against wall-clock time.
    pub fn live(risk: Arc<RiskManager>) -> Self {
        Self {
            risk,
            clock: None,
            blocked: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Record trades at their historical timestamps. `clock` must be the manager's clock.
    pub fn replaying(risk: Arc<RiskManager>, clock: Arc<ManualClock>) -> Self {
        Self {
            risk,
            clock: Some(clock),
            blocked: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Count of trades opened while the gate would have blocked. Readable after the observer is boxed.
    pub fn blocked_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.blocked)
    }
}

impl EngineObserver for RiskTrackingObserver {
    fn on_trade(&mut self, trade: &Trade) {
        if let Some(clock) = &self.clock {
            clock.set(trade.entry_time);
        }
        if let TradePermission::Blocked(reason) = self.risk.can_trade() {
            info!("{} opened at {} while gate blocked: {}", trade.id, trade.entry_time, reason);
            self.blocked.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(clock) = &self.clock {
            clock.set(trade.exit_time);
        }
        self.risk.record_trade(TradeResult::from(trade));
    }

    fn name(&self) -> &str {
        "risk_tracking"
    }
}

impl std::fmt::Debug for RiskTrackingObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskTrackingObserver")
            .field("replaying", &self.clock.is_some())
            .field("blocked", &self.blocked.load(Ordering::Relaxed))
            .finish()
    }
}
