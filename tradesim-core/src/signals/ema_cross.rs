//! EMA crossover with RSI confirmation.
//!
//! On the candle where the fast EMA crosses the slow EMA, the generator emits
//! an Exit for the side the cross goes against. If the cross still holds on
//! the following candle and RSI confirms, it emits an Entry in the direction
//! of the cross. Splitting exit and entry across two candles lets a
//! position-agnostic generator both close the old trade and open the new one.

use super::indicators::{ema_of_series, rsi_of_series};
use super::{IndicatorSnapshot, SignalGenerator};
use crate::config::ConfigError;
use crate::domain::{OrderSide, Signal};
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Share of the strength budget carried by EMA separation.
const EMA_STRENGTH_CAP: f64 = 0.4;
/// Share of the strength budget carried by RSI headroom.
const RSI_STRENGTH_WEIGHT: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cross {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone)]
pub struct EmaCrossover {
    pub fast_period: usize,
    pub slow_period: usize,
    pub rsi_period: usize,
    /// Longs are suppressed at or above this RSI.
    pub rsi_overbought: f64,
    /// Shorts are suppressed at or below this RSI.
    pub rsi_oversold: f64,
}

impl EmaCrossover {
    /// Validated construction for periods that come from configuration.
    pub fn try_new(
        fast_period: usize,
        slow_period: usize,
        rsi_period: usize,
    ) -> Result<Self, ConfigError> {
        if fast_period < 1 {
            return Err(ConfigError::TooSmall {
                field: "fast_period",
                min: 1,
                value: fast_period,
            });
        }
        if slow_period <= fast_period {
            return Err(ConfigError::TooSmall {
                field: "slow_period",
                min: fast_period + 1,
                value: slow_period,
            });
        }
        if rsi_period < 1 {
            return Err(ConfigError::TooSmall {
                field: "rsi_period",
                min: 1,
                value: rsi_period,
            });
        }
        Ok(Self::new(fast_period, slow_period, rsi_period))
    }

    /// # Panics
    /// If `fast_period` is zero, `slow_period <= fast_period`, or `rsi_period` is zero.
    pub fn new(fast_period: usize, slow_period: usize, rsi_period: usize) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(
            slow_period > fast_period,
            "slow_period must be > fast_period"
        );
        assert!(rsi_period >= 1, "rsi_period must be >= 1");
        Self {
            fast_period,
            slow_period,
            rsi_period,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
        }
    }

    pub fn with_rsi_bounds(mut self, oversold: f64, overbought: f64) -> Self {
        self.rsi_oversold = oversold;
        self.rsi_overbought = overbought;
        self
    }

    pub fn default_params() -> Self {
        Self::new(9, 21, 14)
    }

    /// Window length needed to detect a cross one candle back.
    pub fn min_window(&self) -> usize {
        (self.slow_period + 2).max(self.rsi_period + 1)
    }

    fn cross_at(fast: &[f64], slow: &[f64], i: usize) -> Option<Cross> {
        let (fc, sc, fp, sp) = (fast[i], slow[i], fast[i - 1], slow[i - 1]);
        if fc.is_nan() || sc.is_nan() || fp.is_nan() || sp.is_nan() {
            return None;
        }
        if fc > sc && fp <= sp {
            Some(Cross::Bullish)
        } else if fc < sc && fp >= sp {
            Some(Cross::Bearish)
        } else {
            None
        }
    }

    fn strength(&self, fast: f64, slow: f64, rsi: f64, side: OrderSide) -> f64 {
        let separation = if slow != 0.0 {
            ((fast - slow).abs() / slow * 100.0).min(EMA_STRENGTH_CAP)
        } else {
            0.0
        };
        let headroom = match side {
            OrderSide::Buy => (100.0 - rsi) / 100.0,
            OrderSide::Sell => rsi / 100.0,
        };
        (separation + headroom * RSI_STRENGTH_WEIGHT).clamp(0.0, 1.0)
    }
}

impl Default for EmaCrossover {
    fn default() -> Self {
        Self::default_params()
    }
}

impl SignalGenerator for EmaCrossover {
    fn generate_signal(
        &self,
        symbol: &str,
        prices: &[Decimal],
        _volumes: &[Decimal],
        _indicators: Option<&IndicatorSnapshot>,
    ) -> Option<Signal> {
        if prices.len() < self.min_window() {
            return None;
        }
        let closes: Vec<f64> = prices.iter().map(|p| p.to_f64().unwrap_or(f64::NAN)).collect();
        let fast = ema_of_series(&closes, self.fast_period);
        let slow = ema_of_series(&closes, self.slow_period);
        let rsi = rsi_of_series(&closes, self.rsi_period);

        let last = closes.len() - 1;
        let price = prices[last];

        // Fresh cross on this candle: close whatever the cross goes against.
        if let Some(cross) = Self::cross_at(&fast, &slow, last) {
            let against = match cross {
                Cross::Bullish => OrderSide::Sell,
                Cross::Bearish => OrderSide::Buy,
            };
            debug!("{symbol}: {cross:?} EMA cross at {price}, exit {against}");
            return Some(
                Signal::exit(symbol, against, price).with_reason(format!("{cross:?} EMA cross")),
            );
        }

        // Cross confirmed on the following candle: enter with it.
        let cross = Self::cross_at(&fast, &slow, last - 1)?;
        let (fc, sc, r) = (fast[last], slow[last], rsi[last]);
        if r.is_nan() {
            return None;
        }
        let side = match cross {
            Cross::Bullish if fc > sc && r < self.rsi_overbought => OrderSide::Buy,
            Cross::Bearish if fc < sc && r > self.rsi_oversold => OrderSide::Sell,
            _ => return None,
        };
        let strength = self.strength(fc, sc, r, side);
        debug!("{symbol}: entry {side} at {price}, strength {strength:.3}, rsi {r:.1}");
        Some(
            Signal::entry(symbol, side, price, strength)
                .with_reason(format!("EMA {}/{} cross, RSI {r:.1}", self.fast_period, self.slow_period)),
        )
    }

    fn name(&self) -> &str {
        "ema_crossover"
    }
}
