//! Strategy seam: signal generators consumed by the backtest engine.
//!
//! A generator sees only a trailing price/volume window. It never sees the
//! engine's capital or open position, so the same generator can drive a
//! replay or a live session unchanged.

pub mod ema_cross;
pub mod indicators;

pub use ema_cross::EmaCrossover;

use crate::domain::Signal;
use crate::venue::OrderBookSnapshot;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Optional precomputed state a caller may hand to a generator alongside the window.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSnapshot {
    pub values: BTreeMap<String, f64>,
    pub order_book: Option<OrderBookSnapshot>,
}

impl IndicatorSnapshot {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }
}

/// Produces at most one signal per call from a trailing window.
///
/// # Invariants
/// - `prices` and `volumes` are oldest-first and equally long; the last element is the current candle.
/// - Must be deterministic for the same inputs.
pub trait SignalGenerator: Send + Sync {
    fn generate_signal(
        &self,
        symbol: &str,
        prices: &[Decimal],
        volumes: &[Decimal],
        indicators: Option<&IndicatorSnapshot>,
    ) -> Option<Signal>;

    fn name(&self) -> &str;
}

/// Never signals. Useful as a baseline and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSignal;

impl SignalGenerator for NullSignal {
    fn generate_signal(
        &self,
        _symbol: &str,
        _prices: &[Decimal],
        _volumes: &[Decimal],
        _indicators: Option<&IndicatorSnapshot>,
    ) -> Option<Signal> {
        None
    }

    fn name(&self) -> &str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The generator contract carries no capital or position parameter.
    #[test]
    fn generator_trait_is_object_safe_and_position_agnostic() {
        fn _check(gen: &dyn SignalGenerator, prices: &[Decimal]) -> Option<Signal> {
            gen.generate_signal("X", prices, prices, None)
        }
        assert!(_check(&NullSignal, &[]).is_none());
    }

    #[test]
    fn snapshot_lookup() {
        let mut snap = IndicatorSnapshot::default();
        snap.insert("rsi_14", 42.0);
        assert_eq!(snap.get("rsi_14"), Some(42.0));
        assert_eq!(snap.get("ema_9"), None);
    }
}
