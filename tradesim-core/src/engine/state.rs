//! Mutable replay state and per-run diagnostics.

use super::ledger::Ledger;
use crate::domain::{IdGen, Position};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Counters for everything the replay decided not to do.
///
/// Soft rejections never fail a run; these counters are how a caller finds out
/// they happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub candles_processed: usize,
    pub signals_seen: usize,
    pub entries_opened: usize,
    pub skipped_position_open: usize,
    pub skipped_short_disallowed: usize,
    pub skipped_weak_signal: usize,
    pub skipped_zero_stop_distance: usize,
    pub skipped_insufficient_capital: usize,
    pub ignored_exit_signals: usize,
    pub observer_faults: usize,
}

impl RunDiagnostics {
    pub fn skipped_entries(&self) -> usize {
        self.skipped_position_open
            + self.skipped_short_disallowed
            + self.skipped_weak_signal
            + self.skipped_zero_stop_distance
            + self.skipped_insufficient_capital
    }
}

/// State that evolves candle-by-candle during one run.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub ledger: Ledger,
    /// The single position slot.
    pub position: Option<Position>,
    pub id_gen: IdGen,
    pub candle_index: usize,
    pub diagnostics: RunDiagnostics,
}

impl EngineState {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            ledger: Ledger::new(initial_capital),
            position: None,
            id_gen: IdGen::default(),
            candle_index: 0,
            diagnostics: RunDiagnostics::default(),
        }
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    pub fn capital(&self) -> Decimal {
        self.ledger.capital()
    }
}
