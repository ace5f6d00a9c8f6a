#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Replay Client - Market Data Replay Subscriber
//!
//! A WebSocket client for a market data replay server. It maintains a
//! single supervised connection that reconnects on a fixed interval,
//! decoding typed feed records (order fills and candles) into a buffer
//! the consumer can inspect at any time.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core record types and pure series logic
//!   - `records`: Feed record types (order fills, candles, end-of-feed)
//!   - `series`: Merging candle streams into ordered series
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `replay`: WebSocket supervision, codecs, subscription client, upload
//!   - `config`: Configuration loading from environment variables
//!   - `telemetry`: Tracing subscriber setup
//!
//! # Data Flow
//!
//! ```text
//!                     ┌──────────────┐     ┌──────────────┐
//! Replay Server WS ──►│    Socket    │────►│    Replay    │──► FeedEvent stream
//!                     │  Supervisor  │     │    Client    │──► record buffer
//!                     └──────────────┘     └──────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core record types with no transport dependencies.
pub mod domain;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::records::{Aggressor, Candle, EndOfFeed, FeedItem, OrderFill};
pub use domain::series::merge;

// Infrastructure config
pub use infrastructure::config::{
    FeedSettings, ReplayConfig, ReplayMode, SubscriptionSettings, UploadSettings,
};

// Subscription client (for integration tests)
pub use infrastructure::replay::{
    CandleClient, ClientConfig, ClientState, FeedEvent, OrderClient, RawClient, ReplayClient,
    ReplayClientError,
};

// Codecs and wire messages
pub use infrastructure::replay::{
    CandleCodec, OrderCodec, RawCodec, RecordCodec, SubscriptionAction, SubscriptionRequest,
};

// Connection supervision
pub use infrastructure::replay::{
    DEFAULT_RETRY_INTERVAL, RetryConfig, RetryPolicy, SocketConfig, SocketError, SocketEvent,
    SocketSupervisor,
};

// Recording upload
pub use infrastructure::replay::{UploadClient, UploadError, UploadReceipt};

// Telemetry
pub use infrastructure::telemetry::init as init_telemetry;
