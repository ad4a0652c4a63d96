//! Run observers and the fault boundary around them.
//!
//! Observers run inline on the replay thread. A panic inside one is caught,
//! logged, and the observer is disabled for the rest of the run.

use crate::domain::{EquityPoint, Trade};
use log::error;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Receives engine events as they happen. Both methods default to no-ops.
pub trait EngineObserver: Send {
    fn on_trade(&mut self, _trade: &Trade) {}

    fn on_equity(&mut self, _point: &EquityPoint) {}

    fn name(&self) -> &str {
        "observer"
    }
}

#[derive(Debug, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

/// Collects every event. Handy for tests and for callers that prefer an event log.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub trades: Vec<Trade>,
    pub equity: Vec<EquityPoint>,
}

impl EngineObserver for RecordingObserver {
    fn on_trade(&mut self, trade: &Trade) {
        self.trades.push(trade.clone());
    }

    fn on_equity(&mut self, point: &EquityPoint) {
        self.equity.push(*point);
    }

    fn name(&self) -> &str {
        "recording"
    }
}

struct Slot {
    observer: Box<dyn EngineObserver>,
    faulted: bool,
}

/// Observer fan-out with per-observer panic isolation.
#[derive(Default)]
pub struct ObserverSet {
    slots: Vec<Slot>,
    faults: usize,
}

impl ObserverSet {
    pub fn push(&mut self, observer: Box<dyn EngineObserver>) {
        self.slots.push(Slot {
            observer,
            faulted: false,
        });
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of observers disabled by a panic so far.
    pub fn faults(&self) -> usize {
        self.faults
    }

    /// Re-enable faulted observers for a new run.
    pub fn reset_faults(&mut self) {
        for slot in &mut self.slots {
            slot.faulted = false;
        }
        self.faults = 0;
    }

    pub fn trade(&mut self, trade: &Trade) {
        self.dispatch("on_trade", |o| o.on_trade(trade));
    }

    pub fn equity(&mut self, point: &EquityPoint) {
        self.dispatch("on_equity", |o| o.on_equity(point));
    }

    fn dispatch(&mut self, event: &str, mut f: impl FnMut(&mut dyn EngineObserver)) {
        for slot in self.slots.iter_mut().filter(|s| !s.faulted) {
            let observer = &mut slot.observer;
            let outcome = catch_unwind(AssertUnwindSafe(|| f(observer.as_mut())));
            if outcome.is_err() {
                error!(
                    "observer '{}' panicked in {event}; disabled for the rest of the run",
                    slot.observer.name()
                );
                slot.faulted = true;
                self.faults += 1;
            }
        }
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.slots.len())
            .field("faults", &self.faults)
            .finish()
    }
}
