//! Domain types for the trade simulator.

pub mod candle;
pub mod equity;
pub mod ids;
pub mod order;
pub mod position;
pub mod signal;
pub mod trade;

pub use candle::{Candle, DataError, HistoricalData, TimeRange};
pub use equity::EquityPoint;
pub use ids::{IdGen, OrderId, TradeId};
pub use order::{Order, OrderRequest, OrderSide, OrderStatus, OrderType};
pub use position::Position;
pub use signal::{Signal, SignalKind};
pub use trade::{ExitReason, Trade};

/// Symbol type alias
pub type Symbol = String;
