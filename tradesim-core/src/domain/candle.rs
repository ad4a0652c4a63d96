//! Candle and HistoricalData, the market data units the engine replays.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One OHLCV interval for a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    pub fn new(
        symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// OHLC sanity: the high/low envelope contains open and close, prices are positive.
    pub fn is_sane(&self) -> bool {
        self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
            && self.low > Decimal::ZERO
            && self.volume >= Decimal::ZERO
    }

    pub fn range(&self) -> Decimal {
        self.high - self.low
    }
}

/// Errors raised when validating a candle series.
#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("candle {index} ({timestamp}) is not after the previous candle")]
    NotAscending {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("candle {index} ({timestamp}) has an inconsistent OHLC envelope")]
    InsaneCandle {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("candle {index} belongs to '{found}', expected '{expected}'")]
    SymbolMismatch {
        index: usize,
        expected: String,
        found: String,
    },
}

/// Inclusive time span covered by a candle series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Ordered candle series for one symbol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoricalData {
    pub symbol: String,
    pub candles: Vec<Candle>,
}

impl HistoricalData {
    pub fn new(symbol: impl Into<String>, candles: Vec<Candle>) -> Self {
        Self {
            symbol: symbol.into(),
            candles,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.candles.first().map(|c| c.timestamp)
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.candles.last().map(|c| c.timestamp)
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        Some(TimeRange {
            start: self.first_time()?,
            end: self.last_time()?,
        })
    }

    /// Copy of the series restricted to `[start, end]`. Open bounds keep everything on that side.
    pub fn within(&self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        let candles = self
            .candles
            .iter()
            .filter(|c| start.map_or(true, |s| c.timestamp >= s))
            .filter(|c| end.map_or(true, |e| c.timestamp <= e))
            .cloned()
            .collect();
        Self {
            symbol: self.symbol.clone(),
            candles,
        }
    }

    /// Check strict timestamp ordering, OHLC sanity, and symbol consistency.
    pub fn validate(&self) -> Result<(), DataError> {
        for (index, candle) in self.candles.iter().enumerate() {
            if candle.symbol != self.symbol {
                return Err(DataError::SymbolMismatch {
                    index,
                    expected: self.symbol.clone(),
                    found: candle.symbol.clone(),
                });
            }
            if !candle.is_sane() {
                return Err(DataError::InsaneCandle {
                    index,
                    timestamp: candle.timestamp,
                });
            }
            if index > 0 && candle.timestamp <= self.candles[index - 1].timestamp {
                return Err(DataError::NotAscending {
                    index,
                    timestamp: candle.timestamp,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn sample_candle(minute: i64) -> Candle {
        Candle::new(
            "BTC-USD",
            at(minute),
            dec!(100),
            dec!(105),
            dec!(98),
            dec!(103),
            dec!(50),
        )
    }

    #[test]
    fn candle_is_sane() {
        assert!(sample_candle(0).is_sane());
    }

    #[test]
    fn candle_detects_bad_envelope() {
        let mut candle = sample_candle(0);
        candle.high = dec!(101);
        candle.close = dec!(102);
        assert!(!candle.is_sane());
    }

    #[test]
    fn validate_accepts_ascending_series() {
        let data = HistoricalData::new("BTC-USD", (0..5).map(sample_candle).collect());
        assert_eq!(data.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_duplicate_timestamp() {
        let data = HistoricalData::new(
            "BTC-USD",
            vec![sample_candle(0), sample_candle(1), sample_candle(1)],
        );
        assert!(matches!(
            data.validate(),
            Err(DataError::NotAscending { index: 2, .. })
        ));
    }

    #[test]
    fn validate_rejects_foreign_symbol() {
        let mut other = sample_candle(1);
        other.symbol = "ETH-USD".into();
        let data = HistoricalData::new("BTC-USD", vec![sample_candle(0), other]);
        assert!(matches!(
            data.validate(),
            Err(DataError::SymbolMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn within_filters_inclusive_bounds() {
        let data = HistoricalData::new("BTC-USD", (0..10).map(sample_candle).collect());
        let sliced = data.within(Some(at(2)), Some(at(5)));
        assert_eq!(sliced.len(), 4);
        assert_eq!(sliced.first_time(), Some(at(2)));
        assert_eq!(sliced.last_time(), Some(at(5)));

        let open_end = data.within(Some(at(8)), None);
        assert_eq!(open_end.len(), 2);
    }

    #[test]
    fn time_range_of_empty_series_is_none() {
        assert!(HistoricalData::new("BTC-USD", vec![]).time_range().is_none());
    }
}
