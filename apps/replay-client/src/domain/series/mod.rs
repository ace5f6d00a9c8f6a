//! Bar Series Merging
//!
//! Pure recomputation of a candle series from decoded feed items.
//!
//! # Design
//!
//! Consumers buffer decoded items and recompute the rendered series on
//! demand. `merge` walks the items once, keeps candles whose timestamps
//! strictly increase, hands end-of-feed markers to a side channel, and
//! skips everything else. No state survives between calls, so merging the
//! same input twice yields the same series.

use crate::domain::records::{Candle, EndOfFeed, FeedItem};

/// Merge decoded items into a strictly time-ascending candle series.
///
/// A candle is appended only when the series is empty or its timestamp is
/// strictly greater than the last appended candle's; duplicates and
/// out-of-order candles are dropped. End-of-feed markers are delivered to
/// `on_end_of_feed` and never appear in the series. Unrecognized items are
/// skipped.
pub fn merge<I>(items: I, mut on_end_of_feed: impl FnMut(&EndOfFeed)) -> Vec<Candle>
where
    I: IntoIterator<Item = FeedItem<Candle>>,
{
    let mut series: Vec<Candle> = Vec::new();

    for item in items {
        match item {
            FeedItem::Record(candle) => {
                let ascending = series
                    .last()
                    .is_none_or(|last| candle.timestamp > last.timestamp);
                if ascending {
                    series.push(candle);
                }
            }
            FeedItem::EndOfFeed(eof) => on_end_of_feed(&eof),
            FeedItem::Unrecognized(_) => {}
        }
    }

    series
}

// =============================================================================
// Tests
// =============================================================================
