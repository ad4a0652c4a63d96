//! Candle loading from CSV files.
//!
//! Expected columns: `timestamp, open, high, low, close, volume`. A header row
//! is detected and skipped. Timestamps may be Unix seconds, Unix milliseconds,
//! RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` (all read as UTC).
//!
//! Rows that fail to parse are skipped with a warning. The surviving candles
//! are sorted by time and then validated as a series; duplicated timestamps
//! or an inconsistent candle fail the load.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::{info, warn};
use rust_decimal::Decimal;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tradesim_core::domain::{Candle, DataError, HistoricalData};

/// Integers above this are read as milliseconds.
const MILLIS_THRESHOLD: i64 = 10_000_000_000;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no valid candles in {0}")]
    Empty(String),

    #[error("invalid candle series: {0}")]
    Invalid(#[from] DataError),
}

/// A loaded series plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub data: HistoricalData,
    /// BLAKE3 over symbol and every OHLCV value.
    pub dataset_hash: String,
    pub skipped_rows: usize,
    pub synthetic: bool,
}

impl LoadedData {
    pub fn new(data: HistoricalData, skipped_rows: usize, synthetic: bool) -> Self {
        let dataset_hash = dataset_hash(&data);
        Self {
            data,
            dataset_hash,
            skipped_rows,
            synthetic,
        }
    }
}

pub fn load_csv(path: &Path, symbol: &str) -> Result<LoadedData, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (candles, skipped) = read_candles(file, symbol)?;
    if candles.is_empty() {
        return Err(LoadError::Empty(path.display().to_string()));
    }
    let data = HistoricalData::new(symbol, candles);
    data.validate()?;
    info!(
        "loaded {} candles for {} from {} ({} rows skipped)",
        data.len(),
        symbol,
        path.display(),
        skipped
    );
    Ok(LoadedData::new(data, skipped, false))
}

/// Parse candles from any CSV reader. Returns the sorted candles and the number of skipped rows.
pub fn read_candles<R: Read>(reader: R, symbol: &str) -> Result<(Vec<Candle>, usize), LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut candles = Vec::new();
    let mut skipped = 0;
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        if row == 0 && is_header(&record) {
            continue;
        }
        match parse_row(&record, symbol) {
            Some(candle) => candles.push(candle),
            None => {
                warn!("skipping malformed row {}: {:?}", row + 1, record);
                skipped += 1;
            }
        }
    }
    candles.sort_by_key(|c| c.timestamp);
    Ok((candles, skipped))
}

fn is_header(record: &csv::StringRecord) -> bool {
    record
        .get(0)
        .is_some_and(|first| parse_timestamp(first).is_none() && first.chars().any(char::is_alphabetic))
}

fn parse_row(record: &csv::StringRecord, symbol: &str) -> Option<Candle> {
    if record.len() < 6 {
        return None;
    }
    let timestamp = parse_timestamp(record.get(0)?)?;
    let mut fields = (1..6).map(|i| record.get(i).and_then(parse_decimal));
    let open = fields.next()??;
    let high = fields.next()??;
    let low = fields.next()??;
    let close = fields.next()??;
    let volume = fields.next()??;
    Some(Candle::new(symbol, timestamp, open, high, low, close, volume))
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Parse the supported timestamp formats, always as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(n) = s.parse::<i64>() {
        return if n > MILLIS_THRESHOLD {
            DateTime::from_timestamp_millis(n)
        } else {
            DateTime::from_timestamp(n, 0)
        };
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Deterministic BLAKE3 hash over the series.
pub fn dataset_hash(data: &HistoricalData) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(data.symbol.as_bytes());
    for c in &data.candles {
        hasher.update(&c.timestamp.timestamp_millis().to_le_bytes());
        for value in [c.open, c.high, c.low, c.close, c.volume] {
            hasher.update(&value.serialize());
        }
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_timestamp("1704164645"), Some(expected));
        assert_eq!(parse_timestamp("1704164645000"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T04:04:05+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02 03:04:05"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-02"),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn header_skipped_and_bad_rows_counted() {
        let csv = "timestamp,open,high,low,close,volume\n\
                   1704067260,101,102,100,101.5,3\n\
                   1704067200,100,101,99,100.5,2\n\
                   oops,1,2,3\n\
                   1704067320,102,x,101,102,1\n";
        let (candles, skipped) = read_candles(csv.as_bytes(), "BTC-USD").unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(skipped, 2);
        assert_eq!(candles[0].close, dec!(100.5));
        assert!(candles[0].timestamp < candles[1].timestamp);
        assert_eq!(candles[1].symbol, "BTC-USD");
    }

    #[test]
    fn headerless_input() {
        let csv = "2024-01-01,100,101,99,100,1e2\n";
        let (candles, skipped) = read_candles(csv.as_bytes(), "ETH-USD").unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(candles[0].volume, dec!(100));
    }

    #[test]
    fn hash_changes_with_data() {
        let csv = "1704067200,100,101,99,100,1\n";
        let (a, _) = read_candles(csv.as_bytes(), "BTC-USD").unwrap();
        let mut b = a.clone();
        b[0].close = dec!(100.01);
        let ha = dataset_hash(&HistoricalData::new("BTC-USD", a.clone()));
        assert_eq!(ha, dataset_hash(&HistoricalData::new("BTC-USD", a)));
        assert_ne!(ha, dataset_hash(&HistoricalData::new("BTC-USD", b)));
    }
}
