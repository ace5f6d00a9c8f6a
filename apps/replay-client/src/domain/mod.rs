//! Domain Layer
//!
//! Record types and pure series logic with no transport dependencies.

/// Feed record types and the decoded union.
pub mod records;

/// Candle series merging.
pub mod series;
