//! Replay Feed Record Types
//!
//! Domain types for the records a replay server delivers: order fills,
//! candlestick bars, and the end-of-feed control record, plus the decoded
//! union every codec produces.
//!
//! # Record Kinds
//!
//! - `OrderFill`: one executed order with price, quantity, and aggressor side
//! - `Candle`: one OHLCV bar for a granularity bucket
//! - `EndOfFeed`: replay-complete marker carrying the originating request id
//!
//! Wire timestamps are epoch milliseconds; the `time()` accessors convert to
//! `chrono` datetimes for display.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Order Fills
// =============================================================================

/// Side of the aggressing order in a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggressor {
    /// Aggressor lifted the ask (buy pressure).
    Ask,
    /// Aggressor hit the bid (sell pressure).
    Bid,
}

/// One executed order from a transaction replay.
///
/// # Wire Format (JSON)
/// ```json
/// {"price": 42.5, "quantity": 3, "aggressor": "ask", "timestamp": 1700000000000}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFill {
    /// Execution price.
    pub price: Decimal,

    /// Filled quantity.
    pub quantity: u64,

    /// Which side initiated the fill.
    pub aggressor: Aggressor,

    /// Execution time, epoch milliseconds.
    pub timestamp: i64,
}

impl OrderFill {
    /// Execution time as a UTC datetime, if representable.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Traded notional (price times quantity).
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

// =============================================================================
// Candles
// =============================================================================

/// One OHLCV bar from a kline replay.
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "timestamp": 1700000000000,
///   "low": 41.0,
///   "high": 43.2,
///   "open": 42.0,
///   "close": 42.9,
///   "volume": 120,
///   "turnover": 5100.3,
///   "granularity": 60
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    /// Bucket start time, epoch milliseconds.
    pub timestamp: i64,

    /// Lowest trade price in the bucket.
    pub low: Decimal,

    /// Highest trade price in the bucket.
    pub high: Decimal,

    /// First trade price in the bucket.
    pub open: Decimal,

    /// Last trade price in the bucket.
    pub close: Decimal,

    /// Units traded in the bucket.
    pub volume: u64,

    /// Quote-currency value traded. Absent in some recordings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turnover: Option<Decimal>,

    /// Bucket width in seconds.
    pub granularity: u32,
}

impl Candle {
    /// Bucket start as a UTC datetime, if representable.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

// =============================================================================
// End of Feed
// =============================================================================

/// Replay-complete control record.
///
/// Sent once per subscription request when the recording is exhausted.
/// Members beyond `request_id` may accompany it and are ignored.
///
/// # Wire Format (JSON)
/// ```json
/// {"request_id": "req-1"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndOfFeed {
    /// Id of the subscription request this feed served.
    pub request_id: String,
}

// =============================================================================
// Decoded Union
// =============================================================================

/// Result of decoding one raw text frame.
///
/// Every codec returns this union. Decoding is total: frames that fail JSON
/// parsing or match no known shape land in `Unrecognized` rather than
/// producing an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedItem<T> {
    /// A domain record the active codec understands.
    Record(T),
    /// Replay-complete marker for one subscription request.
    EndOfFeed(EndOfFeed),
    /// A frame that matched no known shape; carries the raw text.
    Unrecognized(String),
}

impl<T> FeedItem<T> {
    /// Check whether this item is a domain record.
    #[must_use]
    pub const fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    /// Extract the domain record, if this item is one.
    #[must_use]
    pub fn into_record(self) -> Option<T> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
