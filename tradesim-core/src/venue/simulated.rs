//! Historical replay presented as a live market feed.
//!
//! The venue holds a cursor into the data set. Quotes are taken from the
//! cursored candle's close with a zero-spread ticker and a synthetic two-level
//! book. Orders are echoed back untouched; nothing is ever matched.

use super::{Balance, Level, OrderBookSnapshot, Ticker, Venue, VenueError, VenuePosition};
use crate::domain::{Candle, HistoricalData, Order, OrderId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

const VENUE_NAME: &str = "SimulatedExchange";
const SETTLEMENT_ASSET: &str = "USDC";
/// Half-spread of the synthetic book as a fraction of close (0.01%).
const BOOK_SPREAD_FRACTION: Decimal = dec!(0.0001);
/// Depth quoted at each synthetic level.
const BOOK_LEVEL_AMOUNT: Decimal = dec!(10);

#[derive(Debug, Clone)]
pub struct SimulatedVenue {
    data: Arc<HistoricalData>,
    initial_capital: Decimal,
    cursor: usize,
}

impl SimulatedVenue {
    pub fn new(data: Arc<HistoricalData>, initial_capital: Decimal) -> Self {
        Self {
            data,
            initial_capital,
            cursor: 0,
        }
    }

    /// Move the cursor to `index`. Out-of-range indices are accepted; queries then fail.
    pub fn advance(&mut self, index: usize) {
        self.cursor = index;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn data(&self) -> &HistoricalData {
        &self.data
    }

    fn check_symbol(&self, symbol: &str) -> Result<(), VenueError> {
        if symbol == self.data.symbol {
            Ok(())
        } else {
            Err(VenueError::UnknownSymbol(symbol.to_string()))
        }
    }

    fn current(&self) -> Result<&Candle, VenueError> {
        self.data
            .candles
            .get(self.cursor)
            .ok_or(VenueError::Exhausted {
                cursor: self.cursor,
                len: self.data.len(),
            })
    }

    pub fn current_candle(&self) -> Result<&Candle, VenueError> {
        self.current()
    }

    pub fn current_ticker(&self) -> Result<Ticker, VenueError> {
        let candle = self.current()?;
        Ok(Ticker {
            symbol: self.data.symbol.clone(),
            bid: candle.close,
            ask: candle.close,
            last: candle.close,
            volume_24h: candle.volume,
            timestamp: candle.timestamp,
        })
    }

    pub fn current_order_book(&self) -> Result<OrderBookSnapshot, VenueError> {
        let candle = self.current()?;
        let spread = candle.close * BOOK_SPREAD_FRACTION;
        Ok(OrderBookSnapshot {
            symbol: self.data.symbol.clone(),
            bids: vec![Level {
                price: candle.close - spread,
                amount: BOOK_LEVEL_AMOUNT,
            }],
            asks: vec![Level {
                price: candle.close + spread,
                amount: BOOK_LEVEL_AMOUNT,
            }],
            timestamp: candle.timestamp,
        })
    }

    /// The last `limit` candles ending at the cursor (inclusive), clipped at index 0.
    pub fn windowed_candles(&self, limit: usize) -> Result<&[Candle], VenueError> {
        self.current()?;
        let end = self.cursor + 1;
        let start = end.saturating_sub(limit);
        Ok(&self.data.candles[start..end])
    }
}

impl Venue for SimulatedVenue {
    fn name(&self) -> &str {
        VENUE_NAME
    }

    fn supported_symbols(&self) -> Vec<String> {
        vec![self.data.symbol.clone()]
    }

    fn ticker(&self, symbol: &str) -> Result<Ticker, VenueError> {
        self.check_symbol(symbol)?;
        self.current_ticker()
    }

    fn order_book(&self, symbol: &str, _depth: usize) -> Result<OrderBookSnapshot, VenueError> {
        self.check_symbol(symbol)?;
        self.current_order_book()
    }

    fn candles(
        &self,
        symbol: &str,
        _interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, VenueError> {
        self.check_symbol(symbol)?;
        self.windowed_candles(limit).map(<[Candle]>::to_vec)
    }

    fn place_order(&self, order: Order) -> Result<Order, VenueError> {
        self.check_symbol(&order.symbol)?;
        Ok(order)
    }

    fn cancel_order(&self, _id: &OrderId) -> Result<(), VenueError> {
        Ok(())
    }

    fn order(&self, _id: &OrderId) -> Result<Order, VenueError> {
        Err(VenueError::Unsupported {
            venue: VENUE_NAME,
            operation: "order lookup",
        })
    }

    fn open_orders(&self, _symbol: &str) -> Result<Vec<Order>, VenueError> {
        Ok(Vec::new())
    }

    fn order_history(&self, _symbol: &str, _limit: usize) -> Result<Vec<Order>, VenueError> {
        Ok(Vec::new())
    }

    fn balances(&self) -> Result<Vec<Balance>, VenueError> {
        Ok(vec![Balance {
            asset: SETTLEMENT_ASSET.to_string(),
            free: self.initial_capital,
            locked: Decimal::ZERO,
            total: self.initial_capital,
        }])
    }

    fn positions(&self) -> Result<Vec<VenuePosition>, VenueError> {
        Ok(Vec::new())
    }

    fn position(&self, _symbol: &str) -> Result<Option<VenuePosition>, VenueError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderSide, OrderStatus, OrderType};
    use chrono::{Duration, TimeZone, Utc};

    fn venue(n: usize) -> SimulatedVenue {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let candles = (0..n)
            .map(|i| {
                let close = Decimal::from(100 + i as i64);
                Candle::new(
                    "BTC-USD",
                    base + Duration::minutes(i as i64),
                    close,
                    close + dec!(1),
                    close - dec!(1),
                    close,
                    dec!(7),
                )
            })
            .collect();
        SimulatedVenue::new(
            Arc::new(HistoricalData::new("BTC-USD", candles)),
            dec!(10000),
        )
    }

    #[test]
    fn ticker_has_zero_spread() {
        let mut v = venue(5);
        v.advance(2);
        let t = v.current_ticker().unwrap();
        assert_eq!(t.bid, dec!(102));
        assert_eq!(t.ask, dec!(102));
        assert_eq!(t.last, dec!(102));
        assert_eq!(t.volume_24h, dec!(7));
        assert_eq!(t.mid(), dec!(102));
        assert_eq!(v.ticker("BTC-USD").unwrap(), t);
    }

    #[test]
    fn other_symbols_are_unknown() {
        let v = venue(3);
        assert_eq!(
            v.ticker("ETH-USD"),
            Err(VenueError::UnknownSymbol("ETH-USD".into()))
        );
        assert!(matches!(
            v.order_book("ETH-USD", 5),
            Err(VenueError::UnknownSymbol(_))
        ));
        assert!(matches!(
            v.candles("ETH-USD", "1m", 5),
            Err(VenueError::UnknownSymbol(_))
        ));
        assert_eq!(v.order_book("BTC-USD", 5).unwrap().symbol, "BTC-USD");
    }

    #[test]
    fn order_book_levels_straddle_close() {
        let mut v = venue(3);
        v.advance(0);
        let book = v.current_order_book().unwrap();
        assert_eq!(book.bids[0].price, dec!(99.99));
        assert_eq!(book.asks[0].price, dec!(100.01));
        assert_eq!(book.bids[0].amount, dec!(10));
        assert_eq!(book.spread(), Some(dec!(0.02)));
    }

    #[test]
    fn window_clips_at_start() {
        let mut v = venue(10);
        v.advance(2);
        assert_eq!(v.windowed_candles(50).unwrap().len(), 3);
        v.advance(9);
        let window = v.windowed_candles(4).unwrap();
        assert_eq!(window.len(), 4);
        assert_eq!(window[3].close, dec!(109));
        assert_eq!(window[0].close, dec!(106));
    }

    #[test]
    fn queries_past_end_are_exhausted() {
        let mut v = venue(3);
        v.advance(3);
        assert_eq!(
            v.current_ticker(),
            Err(VenueError::Exhausted { cursor: 3, len: 3 })
        );
        assert!(v.current_order_book().is_err());
        assert!(v.candles("BTC-USD", "1m", 5).is_err());
    }

    #[test]
    fn orders_are_echoed() {
        let v = venue(1);
        let order = Order {
            id: OrderId::new("o-1"),
            symbol: "BTC-USD".into(),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            price: dec!(100),
            amount: dec!(1),
            filled_amount: Decimal::ZERO,
            status: OrderStatus::Open,
            created_at: Utc::now(),
        };
        assert_eq!(v.place_order(order.clone()).unwrap(), order);
        let foreign = Order {
            symbol: "ETH-USD".into(),
            ..order.clone()
        };
        assert!(matches!(
            v.place_order(foreign),
            Err(VenueError::UnknownSymbol(_))
        ));
        assert!(v.cancel_order(&order.id).is_ok());
        assert!(matches!(
            v.order(&order.id),
            Err(VenueError::Unsupported { .. })
        ));
    }

    #[test]
    fn balances_report_initial_capital() {
        let v = venue(1);
        let balances = v.balances().unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].asset, "USDC");
        assert_eq!(balances[0].total, dec!(10000));
        assert_eq!(v.name(), "SimulatedExchange");
        assert_eq!(v.supported_symbols(), vec!["BTC-USD".to_string()]);
        assert!(v.positions().unwrap().is_empty());
        assert_eq!(v.position("BTC-USD").unwrap(), None);
    }
}
