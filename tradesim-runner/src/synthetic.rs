//! Seeded random-walk candles for demos, benches and tests.
//!
//! Same seed, same series. Results on synthetic data are tagged as such in
//! the run result.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tradesim_core::domain::{Candle, HistoricalData};

#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    pub symbol: String,
    pub candles: usize,
    pub seed: u64,
    pub start_price: f64,
    pub start: DateTime<Utc>,
    pub interval: Duration,
    /// Max absolute per-candle return.
    pub volatility: f64,
}

impl SyntheticSpec {
    pub fn new(symbol: impl Into<String>, candles: usize, seed: u64) -> Self {
        Self {
            symbol: symbol.into(),
            candles,
            seed,
            ..Self::default()
        }
    }

    pub fn generate(&self) -> HistoricalData {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut candles = Vec::with_capacity(self.candles);
        let mut open = to_price(self.start_price);

        for i in 0..self.candles {
            let prev = as_f64(open);
            let ret: f64 = rng.gen_range(-self.volatility..=self.volatility);
            let close = to_price(prev * (1.0 + ret));
            let wick_up: f64 = rng.gen_range(0.0..self.volatility.max(f64::EPSILON));
            let wick_down: f64 = rng.gen_range(0.0..self.volatility.max(f64::EPSILON));
            let body_high = as_f64(open.max(close));
            let body_low = as_f64(open.min(close));
            let high = to_price(body_high * (1.0 + wick_up)).max(open.max(close));
            let low = to_price(body_low * (1.0 - wick_down)).min(open.min(close));
            let volume = Decimal::from(rng.gen_range(1u32..=1_000)) / Decimal::TEN;

            candles.push(Candle::new(
                self.symbol.clone(),
                self.start + self.interval * i as i32,
                open,
                high,
                low,
                close,
                volume,
            ));
            open = close;
        }
        HistoricalData::new(self.symbol.clone(), candles)
    }
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            symbol: "SYNTH".into(),
            candles: 500,
            seed: 42,
            start_price: 100.0,
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default(),
            interval: Duration::minutes(1),
            volatility: 0.004,
        }
    }
}

/// Two-decimal price floored at 0.01.
fn to_price(value: f64) -> Decimal {
    Decimal::from_f64_retain(value)
        .unwrap_or(Decimal::ONE)
        .round_dp(2)
        .max(Decimal::new(1, 2))
}

fn as_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_series() {
        let a = SyntheticSpec::new("BTC-USD", 200, 7).generate();
        let b = SyntheticSpec::new("BTC-USD", 200, 7).generate();
        assert_eq!(a.candles, b.candles);
        let c = SyntheticSpec::new("BTC-USD", 200, 8).generate();
        assert_ne!(a.candles, c.candles);
    }

    #[test]
    fn series_is_valid() {
        let data = SyntheticSpec::new("BTC-USD", 1_000, 1).generate();
        assert_eq!(data.len(), 1_000);
        assert!(data.validate().is_ok());
        for pair in data.candles.windows(2) {
            assert_eq!(pair[1].open, pair[0].close);
        }
    }

    #[test]
    fn zero_candles_is_empty() {
        assert!(SyntheticSpec::new("X", 0, 1).generate().is_empty());
    }
}
