//! Replay Server Control Frames
//!
//! Wire format types for the client-to-server control channel. The server
//! accepts subscribe and unsubscribe requests; everything it sends back is
//! handled by the codecs in [`super::codec`].

use serde::{Deserialize, Serialize};

// =============================================================================
// Subscription Requests
// =============================================================================

/// Control action carried in the `type` member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionAction {
    /// Start a replay subscription.
    #[default]
    Subscribe,
    /// Stop a replay subscription.
    Unsubscribe,
}

/// Subscription request for replay feeds.
///
/// Optional members are omitted from the wire entirely when unset.
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "type": "subscribe",
///   "name": "transaction/*/*",
///   "id": "req-1",
///   "filename": "fills.ndjson",
///   "replay_rate": 100,
///   "granularity": 60
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    /// Action: "subscribe" or "unsubscribe".
    #[serde(rename = "type")]
    pub action: SubscriptionAction,

    /// Topic to subscribe to, e.g. `transaction/*/*`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Caller-chosen request id, echoed in the end-of-feed record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Server-side recording to replay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Replay speed multiplier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_rate: Option<u64>,

    /// Bar bucket width in seconds, for kline topics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granularity: Option<u32>,
}

impl SubscriptionRequest {
    /// Create a subscribe request.
    #[must_use]
    pub fn subscribe() -> Self {
        Self {
            action: SubscriptionAction::Subscribe,
            ..Default::default()
        }
    }

    /// Create an unsubscribe request.
    #[must_use]
    pub fn unsubscribe() -> Self {
        Self {
            action: SubscriptionAction::Unsubscribe,
            ..Default::default()
        }
    }

    /// Set the topic name.
    #[must_use]
    pub fn with_topic(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the request id.
    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the recording filename.
    #[must_use]
    pub fn with_file(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the replay speed multiplier.
    #[must_use]
    pub const fn with_replay_rate(mut self, rate: u64) -> Self {
        self.replay_rate = Some(rate);
        self
    }

    /// Set the bar granularity in seconds.
    #[must_use]
    pub const fn with_granularity(mut self, granularity: u32) -> Self {
        self.granularity = Some(granularity);
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
