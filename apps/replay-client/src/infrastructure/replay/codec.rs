//! Frame Decoding
//!
//! Total decoders from raw text frames to [`FeedItem`] values.
//!
//! # Guard Order
//!
//! Each typed codec tries its domain shape first, then the end-of-feed
//! shape (an object carrying `request_id`), and classifies everything else
//! as unrecognized. A frame satisfying both shapes is a domain record: the
//! domain guard has priority. Decoding never fails; malformed JSON lands in
//! `Unrecognized` along with server acknowledgements and any other frame
//! the active codec has no use for.

use serde::de::DeserializeOwned;

use crate::domain::records::{Candle, EndOfFeed, FeedItem, OrderFill};

// =============================================================================
// Codec Trait
// =============================================================================

/// A total decoder keyed to one record type.
pub trait RecordCodec {
    /// The domain record this codec produces.
    type Record: Clone + Send + Sync + 'static;

    /// Decode one raw text frame.
    fn decode(&self, raw: &str) -> FeedItem<Self::Record>;
}

/// Domain guard first, end-of-feed guard second, unrecognized last.
fn decode_typed<T: DeserializeOwned>(raw: &str) -> FeedItem<T> {
    if let Ok(record) = serde_json::from_str::<T>(raw) {
        return FeedItem::Record(record);
    }
    if let Ok(eof) = serde_json::from_str::<EndOfFeed>(raw) {
        return FeedItem::EndOfFeed(eof);
    }
    FeedItem::Unrecognized(raw.to_owned())
}

// =============================================================================
// Codecs
// =============================================================================

/// Codec for order-fill replay topics.
#[derive(Debug, Default, Clone)]
pub struct OrderCodec;

impl OrderCodec {
    /// Create a new order-fill codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RecordCodec for OrderCodec {
    type Record = OrderFill;

    fn decode(&self, raw: &str) -> FeedItem<OrderFill> {
        decode_typed(raw)
    }
}

/// Codec for kline replay topics.
#[derive(Debug, Default, Clone)]
pub struct CandleCodec;

impl CandleCodec {
    /// Create a new candle codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RecordCodec for CandleCodec {
    type Record = Candle;

    fn decode(&self, raw: &str) -> FeedItem<Candle> {
        decode_typed(raw)
    }
}

/// Passthrough codec: every frame is a raw record.
///
/// For consumers that defer shape decisions to merge time. The kline flow
/// buffers raw frames and recomputes the rendered series on demand, so
/// end-of-feed markers pass through here as records and are extracted
/// downstream by [`crate::domain::series::merge`].
#[derive(Debug, Default, Clone)]
pub struct RawCodec;

impl RawCodec {
    /// Create a new passthrough codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RecordCodec for RawCodec {
    type Record = String;

    fn decode(&self, raw: &str) -> FeedItem<String> {
        FeedItem::Record(raw.to_owned())
    }
}

// =============================================================================
// Tests
// =============================================================================
