//! Replay Server Adapters
//!
//! Implements the client side of the replay protocol:
//!
//! - **Socket**: supervised WebSocket connection with fixed-interval retry
//! - **Codec**: total frame decoding into typed records
//! - **Client**: subscription façade with state machine and record buffer
//! - **Upload**: HTTP multipart upload of recordings

pub mod client;
pub mod codec;
pub mod messages;
pub mod reconnect;
pub mod socket;
pub mod upload;

pub use client::{
    CandleClient, ClientConfig, ClientState, FeedEvent, OrderClient, RawClient, ReplayClient,
    ReplayClientError,
};
pub use codec::{CandleCodec, OrderCodec, RawCodec, RecordCodec};
pub use messages::{SubscriptionAction, SubscriptionRequest};
pub use reconnect::{DEFAULT_RETRY_INTERVAL, RetryConfig, RetryPolicy};
pub use socket::{SocketConfig, SocketError, SocketEvent, SocketSupervisor};
pub use upload::{UploadClient, UploadError, UploadReceipt};
