//! Replay Subscription Client
//!
//! Consumer-facing façade tying the socket supervisor, a codec, and the
//! record buffer together.
//!
//! # State Machine
//!
//! The client state is driven entirely by supervisor events:
//!
//! ```text
//! Connecting ──open──> Open ──close──> Reconnecting ──open──> Open
//!     │                                     │
//!     └──close (never opened)──> Disconnected <──teardown────┘
//! ```
//!
//! Construction opens the connection implicitly. Domain records append to
//! the buffer and surface as events; end-of-feed markers surface as events
//! only; unrecognized frames are logged and dropped.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::codec::{CandleCodec, OrderCodec, RawCodec, RecordCodec};
use super::messages::SubscriptionRequest;
use super::reconnect::RetryConfig;
use super::socket::{SocketConfig, SocketError, SocketEvent, SocketSupervisor};
use crate::domain::records::{EndOfFeed, FeedItem};

/// Default bound for the feed event channel.
const DEFAULT_EVENT_CAPACITY: usize = 256;

// =============================================================================
// Error Type
// =============================================================================

/// Errors surfaced by the replay client.
#[derive(Debug, thiserror::Error)]
pub enum ReplayClientError {
    /// Send attempted while the connection is not open.
    #[error("send rejected: client is {state:?}, not open")]
    SendRejected {
        /// State at the time of the attempt.
        state: ClientState,
    },

    /// Control request could not be serialized.
    #[error("failed to serialize request: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Send failed at the socket layer.
    #[error("send failed: {0}")]
    Socket(#[from] SocketError),
}

// =============================================================================
// Client State
// =============================================================================

/// Connection state of the replay client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// No connection and no retry pending.
    Disconnected,
    /// First connection attempt in flight.
    Connecting,
    /// Connection open; sends are accepted.
    Open,
    /// Connection lost after having been open; retry pending.
    Reconnecting,
}

impl ClientState {
    /// Whether sends are accepted in this state.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

// =============================================================================
// Feed Events
// =============================================================================

/// Events emitted by the replay client.
#[derive(Debug, Clone)]
pub enum FeedEvent<R> {
    /// Connection reached open.
    Opened,
    /// Connection ended; the supervisor retries unless it never opened.
    Closed {
        /// Human-readable close reason.
        reason: String,
    },
    /// Retry scheduled after the fixed interval.
    Reconnecting {
        /// Retry attempt number, 1-based since the last open connection.
        attempt: u32,
    },
    /// A decoded domain record, also appended to the buffer.
    Record(R),
    /// Replay complete for one subscription request. Never buffered.
    EndOfFeed(EndOfFeed),
    /// Transport-level error; connection handling stays with the supervisor.
    Error {
        /// Description of the failure.
        message: String,
    },
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the replay client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Socket and retry configuration.
    pub socket: SocketConfig,
    /// Bound for the feed and socket event channels.
    pub event_capacity: usize,
}

impl ClientConfig {
    /// Create a configuration with default retry and capacity.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            socket: SocketConfig::new(url),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Override the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.socket.retry = retry;
        self
    }

    /// Override the event channel capacity.
    #[must_use]
    pub const fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

// =============================================================================
// Replay Client
// =============================================================================

/// Subscription client for one replay feed.
///
/// Owns the socket supervisor and a dispatch task that decodes incoming
/// frames with the configured codec. Dropping the client cancels both.
pub struct ReplayClient<C: RecordCodec> {
    socket: Arc<SocketSupervisor>,
    state_rx: watch::Receiver<ClientState>,
    buffer: Arc<parking_lot::RwLock<Vec<C::Record>>>,
    cancel: CancellationToken,
}

/// Client decoding order-fill topics.
pub type OrderClient = ReplayClient<OrderCodec>;

/// Client decoding kline topics.
pub type CandleClient = ReplayClient<CandleCodec>;

/// Client buffering raw frames for merge-time decoding.
pub type RawClient = ReplayClient<RawCodec>;

impl<C> ReplayClient<C>
where
    C: RecordCodec + Send + 'static,
{
    /// Open a client against the replay server.
    ///
    /// Connecting starts immediately; the returned event stream reports
    /// progress, starting with [`FeedEvent::Opened`] or, when the first
    /// connect fails, an error and close with no retry.
    #[must_use]
    pub fn connect(
        config: ClientConfig,
        codec: C,
    ) -> (Self, mpsc::Receiver<FeedEvent<C::Record>>) {
        let cancel = CancellationToken::new();
        let (socket_tx, socket_rx) = mpsc::channel::<SocketEvent>(config.event_capacity);
        let (feed_tx, feed_rx) = mpsc::channel::<FeedEvent<C::Record>>(config.event_capacity);
        let (state_tx, state_rx) = watch::channel(ClientState::Connecting);

        let socket = Arc::new(SocketSupervisor::new(
            config.socket,
            socket_tx,
            cancel.clone(),
        ));

        let supervisor = Arc::clone(&socket);
        tokio::spawn(async move {
            if let Err(e) = supervisor.run().await {
                tracing::error!(error = %e, "replay socket supervisor ended");
            }
        });

        let buffer = Arc::new(parking_lot::RwLock::new(Vec::new()));
        tokio::spawn(dispatch_events(
            socket_rx,
            codec,
            Arc::clone(&buffer),
            feed_tx,
            state_tx,
            cancel.clone(),
        ));

        (
            Self {
                socket,
                state_rx,
                buffer,
                cancel,
            },
            feed_rx,
        )
    }

    /// Serialize a subscription request and forward it on the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayClientError::SendRejected`] when the client is not
    /// open; nothing is written to the network in that case.
    pub fn send(&self, request: &SubscriptionRequest) -> Result<(), ReplayClientError> {
        let state = self.state();
        if !state.is_open() {
            return Err(ReplayClientError::SendRejected { state });
        }

        let json = serde_json::to_string(request)?;
        self.socket.send(json)?;
        Ok(())
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ClientState {
        *self.state_rx.borrow()
    }

    /// Watch channel following state transitions.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ClientState> {
        self.state_rx.clone()
    }

    /// Snapshot of the buffered records.
    #[must_use]
    pub fn records(&self) -> Vec<C::Record> {
        self.buffer.read().clone()
    }

    /// Number of buffered records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.buffer.read().len()
    }

    /// Drop all buffered records.
    pub fn clear(&self) {
        self.buffer.write().clear();
    }

    /// Tear the client down: close the connection and cancel any pending
    /// retry.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl<C: RecordCodec> Drop for ReplayClient<C> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// =============================================================================
// Event Dispatch
// =============================================================================

/// Translate socket events into feed events, one at a time, in order.
///
/// Ends on cancellation or when the supervisor's event channel closes; the
/// state watch settles to [`ClientState::Disconnected`] either way.
async fn dispatch_events<C>(
    mut events: mpsc::Receiver<SocketEvent>,
    codec: C,
    buffer: Arc<parking_lot::RwLock<Vec<C::Record>>>,
    feed_tx: mpsc::Sender<FeedEvent<C::Record>>,
    state_tx: watch::Sender<ClientState>,
    cancel: CancellationToken,
) where
    C: RecordCodec,
{
    let mut ever_opened = false;

    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            SocketEvent::Opened => {
                ever_opened = true;
                let _ = state_tx.send(ClientState::Open);
                if feed_tx.send(FeedEvent::Opened).await.is_err() {
                    return;
                }
            }
            SocketEvent::Frame(raw) => match codec.decode(&raw) {
                FeedItem::Record(record) => {
                    buffer.write().push(record.clone());
                    if feed_tx.send(FeedEvent::Record(record)).await.is_err() {
                        return;
                    }
                }
                FeedItem::EndOfFeed(eof) => {
                    tracing::debug!(request_id = %eof.request_id, "replay complete");
                    if feed_tx.send(FeedEvent::EndOfFeed(eof)).await.is_err() {
                        return;
                    }
                }
                FeedItem::Unrecognized(frame) => {
                    tracing::warn!(%frame, "dropping unrecognized frame");
                }
            },
            SocketEvent::Closed { reason } => {
                let next = if ever_opened {
                    ClientState::Reconnecting
                } else {
                    ClientState::Disconnected
                };
                let _ = state_tx.send(next);
                if feed_tx.send(FeedEvent::Closed { reason }).await.is_err() {
                    return;
                }
            }
            SocketEvent::Error { message } => {
                if feed_tx.send(FeedEvent::Error { message }).await.is_err() {
                    return;
                }
            }
            SocketEvent::Retrying { attempt } => {
                let _ = state_tx.send(ClientState::Reconnecting);
                if feed_tx
                    .send(FeedEvent::Reconnecting { attempt })
                    .await
                    .is_err()
                {
                    return;
                }
            }
        }
    }

    let _ = state_tx.send(ClientState::Disconnected);
}

// =============================================================================
// Tests
// =============================================================================
