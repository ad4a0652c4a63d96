//! Execution venue contract.
//!
//! Strategy and engine code talk to a market only through [`Venue`], so a
//! historical replay ([`SimulatedVenue`]) and a live exchange client are
//! interchangeable without conditional logic at the call sites.

pub mod simulated;

pub use simulated::SimulatedVenue;

use crate::domain::{Candle, Order, OrderId, OrderSide};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from venue queries and order calls.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VenueError {
    #[error("venue exhausted: cursor {cursor} is past the last candle (len {len})")]
    Exhausted { cursor: usize, len: usize },

    #[error("operation not supported by {venue}: {operation}")]
    Unsupported {
        venue: &'static str,
        operation: &'static str,
    },

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
}

/// Top-of-book quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
    pub volume_24h: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Ticker {
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

/// One price level of an order book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub symbol: String,
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
    pub timestamp: DateTime<Utc>,
}

impl OrderBookSnapshot {
    pub fn best_bid(&self) -> Option<&Level> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&Level> {
        self.asks.first()
    }

    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()?.price - self.best_bid()?.price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
    pub total: Decimal,
}

/// A position as reported by a venue (distinct from the engine's own ledger position).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenuePosition {
    pub symbol: String,
    pub side: OrderSide,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub unrealized_pnl: Decimal,
}

/// Capability set shared by live and simulated markets.
///
/// All calls are synchronous and side-effect free from the caller's point of
/// view except `place_order` / `cancel_order`.
pub trait Venue: Send + Sync {
    fn name(&self) -> &str;

    fn supported_symbols(&self) -> Vec<String>;

    fn ticker(&self, symbol: &str) -> Result<Ticker, VenueError>;

    fn order_book(&self, symbol: &str, depth: usize) -> Result<OrderBookSnapshot, VenueError>;

    /// Up to `limit` most recent candles, oldest first.
    fn candles(&self, symbol: &str, interval: &str, limit: usize)
        -> Result<Vec<Candle>, VenueError>;

    fn place_order(&self, order: Order) -> Result<Order, VenueError>;

    fn cancel_order(&self, id: &OrderId) -> Result<(), VenueError>;

    fn order(&self, id: &OrderId) -> Result<Order, VenueError>;

    fn open_orders(&self, symbol: &str) -> Result<Vec<Order>, VenueError>;

    fn order_history(&self, symbol: &str, limit: usize) -> Result<Vec<Order>, VenueError>;

    fn balances(&self) -> Result<Vec<Balance>, VenueError>;

    fn positions(&self) -> Result<Vec<VenuePosition>, VenueError>;

    fn position(&self, symbol: &str) -> Result<Option<VenuePosition>, VenueError>;
}
