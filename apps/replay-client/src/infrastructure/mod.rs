//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete integrations with the replay server:
//! the WebSocket subscription client, codecs, and the recording uploader.

/// Replay server WebSocket client, codecs, and upload adapter.
pub mod replay;

/// Configuration loading.
pub mod config;

/// Tracing subscriber setup.
pub mod telemetry;
