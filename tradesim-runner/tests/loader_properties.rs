//! Property tests for CSV candle loading.
//!
//! 1. Every supported timestamp spelling of one instant parses to that instant
//! 2. Rows in any order load sorted, with nothing dropped and prices intact

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::fmt::Write as _;
use tradesim_runner::data_loader::{parse_timestamp, read_candles};

// ── 1. Timestamp spellings ───────────────────────────────────────────

proptest! {
    #[test]
    fn timestamp_spellings_agree(secs in 100_000_000i64..4_000_000_000) {
        let expected = DateTime::from_timestamp(secs, 0).unwrap();
        prop_assert_eq!(parse_timestamp(&secs.to_string()), Some(expected));
        prop_assert_eq!(parse_timestamp(&(secs * 1000).to_string()), Some(expected));
        prop_assert_eq!(parse_timestamp(&expected.to_rfc3339()), Some(expected));
        let plain = expected.format("%Y-%m-%d %H:%M:%S").to_string();
        prop_assert_eq!(parse_timestamp(&plain), Some(expected));
    }
}

// ── 2. Row order ─────────────────────────────────────────────────────

fn arb_rows() -> impl Strategy<Value = Vec<(usize, i64)>> {
    prop::collection::vec(100i64..1_000_000, 1..60)
        .prop_map(|closes| closes.into_iter().enumerate().collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    #[test]
    fn shuffled_rows_load_sorted(rows in arb_rows(), header in any::<bool>()) {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut csv = String::new();
        if header {
            csv.push_str("timestamp,open,high,low,close,volume\n");
        }
        for &(minute, cents) in &rows {
            let ts = (start + Duration::minutes(minute as i64)).timestamp();
            let close = Decimal::new(cents, 2);
            writeln!(csv, "{ts},{close},{close},{close},{close},1").unwrap();
        }

        let (candles, skipped) = read_candles(csv.as_bytes(), "BTC-USD").unwrap();
        prop_assert_eq!(skipped, 0);
        prop_assert_eq!(candles.len(), rows.len());
        for (i, candle) in candles.iter().enumerate() {
            prop_assert_eq!(candle.timestamp, start + Duration::minutes(i as i64));
            let cents = rows.iter().find(|(m, _)| *m == i).map(|(_, c)| *c).unwrap();
            prop_assert_eq!(candle.close, Decimal::new(cents, 2));
        }
    }
}
