//! Replay Socket Supervisor
//!
//! Owns the WebSocket connection to the replay server and the retry loop
//! around it.
//!
//! # Lifecycle
//!
//! One connection lives at a time. When a connection that reached open ends
//! for any reason, the supervisor retries at a fixed interval until a
//! connect succeeds or the supervisor is cancelled. When the very first
//! connect fails the supervisor stops instead: retrying arms only after one
//! successful open.
//!
//! Consumers receive [`SocketEvent`]s over a bounded channel and push raw
//! frames back through [`SocketSupervisor::send`], which fails closed when
//! no connection is open. Outbound frames never queue across connections.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::reconnect::{RetryConfig, RetryPolicy};

/// Outbound frames buffered per connection before sends start failing.
const OUTBOUND_QUEUE_CAPACITY: usize = 32;

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur in the socket supervisor.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// WebSocket connect attempt failed.
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// WebSocket error on an open connection.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection closed by the server or the stream ended.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// No open connection to send on.
    #[error("no open connection")]
    NotOpen,

    /// Outbound queue for the current connection is full.
    #[error("outbound queue full")]
    QueueFull,
}

impl SocketError {
    /// Whether this failure is transport-level and fires the error event
    /// before the close event.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::ConnectFailed(_) | Self::WebSocket(_))
    }
}

// =============================================================================
// Socket Events
// =============================================================================

/// Events emitted by the socket supervisor.
#[derive(Debug, Clone)]
pub enum SocketEvent {
    /// Connection reached open.
    Opened,
    /// A raw text frame arrived.
    Frame(String),
    /// Connection ended or a connect attempt concluded without opening.
    Closed {
        /// Human-readable close reason.
        reason: String,
    },
    /// Transport-level error.
    Error {
        /// Description of the failure.
        message: String,
    },
    /// Retry scheduled after the fixed interval.
    Retrying {
        /// Retry attempt number, 1-based since the last open connection.
        attempt: u32,
    },
}

// =============================================================================
// Socket Configuration
// =============================================================================

/// Configuration for the socket supervisor.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// WebSocket URL of the replay server.
    pub url: String,
    /// Retry configuration.
    pub retry: RetryConfig,
}

impl SocketConfig {
    /// Create a new configuration with the default retry policy.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            retry: RetryConfig::default(),
        }
    }

    /// Override the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

// =============================================================================
// Socket Supervisor
// =============================================================================

/// WebSocket supervisor for the replay feed.
///
/// Manages the connection lifecycle:
/// - single live connection, opened on `run`
/// - fixed-interval retry once a connection has been open
/// - per-connection outbound queue, cleared on every exit path
pub struct SocketSupervisor {
    config: SocketConfig,
    event_tx: mpsc::Sender<SocketEvent>,
    cancel: CancellationToken,
    outbound: parking_lot::RwLock<Option<mpsc::Sender<String>>>,
}

impl SocketSupervisor {
    /// Create a new supervisor.
    #[must_use]
    pub fn new(
        config: SocketConfig,
        event_tx: mpsc::Sender<SocketEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            event_tx,
            cancel,
            outbound: parking_lot::RwLock::new(None),
        }
    }

    /// Whether a connection is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.outbound.read().is_some()
    }

    /// Queue a raw text frame on the open connection.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::NotOpen`] when no connection is open and
    /// [`SocketError::QueueFull`] when the connection's outbound queue is
    /// exhausted. Nothing touches the network in either case.
    pub fn send(&self, raw: String) -> Result<(), SocketError> {
        let guard = self.outbound.read();
        match guard.as_ref() {
            Some(tx) => tx.try_send(raw).map_err(|e| match e {
                TrySendError::Full(_) => SocketError::QueueFull,
                TrySendError::Closed(_) => SocketError::NotOpen,
            }),
            None => Err(SocketError::NotOpen),
        }
    }

    /// Run the supervisor connection loop.
    ///
    /// Connects to the configured URL and processes frames until cancelled.
    /// A connection that has been open retries at the fixed interval after
    /// every failure; a first connect that never opens ends the loop with
    /// the connect error instead.
    pub async fn run(self: Arc<Self>) -> Result<(), SocketError> {
        let mut retry = RetryPolicy::new(self.config.retry.clone());
        let mut ever_opened = false;

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("replay socket supervisor cancelled");
                return Ok(());
            }
            if self.event_tx.is_closed() {
                tracing::info!("event receiver dropped, stopping supervisor");
                return Ok(());
            }

            let result = self.connect_and_run(&mut retry, &mut ever_opened).await;

            // The outbound queue never survives a connection.
            *self.outbound.write() = None;

            match result {
                Ok(()) => {
                    tracing::info!("replay connection closed gracefully");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "replay connection ended");

                    if e.is_transport() {
                        let _ = self
                            .event_tx
                            .send(SocketEvent::Error {
                                message: e.to_string(),
                            })
                            .await;
                    }
                    let _ = self
                        .event_tx
                        .send(SocketEvent::Closed {
                            reason: e.to_string(),
                        })
                        .await;

                    if !ever_opened {
                        tracing::error!(error = %e, "initial connect failed, not retrying");
                        return Err(e);
                    }

                    let attempt = retry.record_attempt();
                    tracing::info!(
                        attempt,
                        interval_ms = retry.interval().as_millis(),
                        "retrying replay connection"
                    );

                    let _ = self.event_tx.send(SocketEvent::Retrying { attempt }).await;

                    tokio::select! {
                        () = self.cancel.cancelled() => {
                            tracing::info!("replay socket cancelled during retry wait");
                            return Ok(());
                        }
                        () = tokio::time::sleep(retry.interval()) => {}
                    }
                }
            }
        }
    }

    /// Connect once and pump frames until the connection ends.
    async fn connect_and_run(
        &self,
        retry: &mut RetryPolicy,
        ever_opened: &mut bool,
    ) -> Result<(), SocketError> {
        tracing::info!(url = %self.config.url, "connecting to replay server");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.config.url)
            .await
            .map_err(|e| SocketError::ConnectFailed(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        *ever_opened = true;
        retry.reset();

        let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_CAPACITY);
        *self.outbound.write() = Some(out_tx);

        tracing::info!("replay connection open");
        if self.event_tx.send(SocketEvent::Opened).await.is_err() {
            return Ok(());
        }

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                outbound = out_rx.recv() => {
                    if let Some(raw) = outbound {
                        write.send(Message::Text(raw.into())).await?;
                    }
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let frame = SocketEvent::Frame(text.as_str().to_owned());
                            if self.event_tx.send(frame).await.is_err() {
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let reason = frame.map_or_else(
                                || "server closed connection".to_string(),
                                |f| format!("server closed connection: {}", f.reason),
                            );
                            tracing::info!(%reason, "server sent close frame");
                            return Err(SocketError::ConnectionClosed(reason));
                        }
                        Some(Ok(_)) => {
                            // Ignore binary and pong frames
                        }
                        Some(Err(e)) => {
                            return Err(e.into());
                        }
                        None => {
                            return Err(SocketError::ConnectionClosed(
                                "stream ended".to_string(),
                            ));
                        }
                    }
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
