//! Replay Client Configuration Settings
//!
//! Configuration types for the replay client, loaded from environment variables.

use std::time::Duration;

use crate::infrastructure::replay::{
    ClientConfig, RetryConfig, SubscriptionRequest,
};

/// Feed mode selecting which record type the client decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayMode {
    /// Order fill stream (per-trade records).
    #[default]
    Orders,
    /// Candle stream merged into an in-memory series.
    Candles,
}

impl ReplayMode {
    /// Parse mode from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "candles" | "kline" => Self::Candles,
            _ => Self::Orders,
        }
    }

    /// Get the mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Candles => "candles",
        }
    }
}

/// Feed connection settings.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// WebSocket endpoint of the replay server.
    pub url: String,
    /// Delay between reconnection attempts.
    pub retry_interval: Duration,
    /// Capacity of the feed event channel.
    pub event_capacity: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/v1/ws".to_string(),
            retry_interval: Duration::from_secs(3),
            event_capacity: 256,
        }
    }
}

/// Recording upload settings.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// HTTP endpoint accepting multipart recording uploads.
    pub url: String,
    /// Request timeout for a single upload.
    pub timeout: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/v1/upload".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Subscription parameters for the replay session.
#[derive(Debug, Clone)]
pub struct SubscriptionSettings {
    /// Topic pattern to subscribe to.
    pub topic: String,
    /// Server-side recording to replay (None replays the default feed).
    pub filename: Option<String>,
    /// Replay rate multiplier.
    pub replay_rate: Option<u64>,
    /// Candle granularity in seconds.
    pub granularity: Option<u32>,
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            topic: "transaction/*/*".to_string(),
            filename: None,
            replay_rate: None,
            granularity: None,
        }
    }
}

/// Complete replay client configuration.
#[derive(Debug, Clone, Default)]
pub struct ReplayConfig {
    /// Feed mode.
    pub mode: ReplayMode,
    /// Feed connection settings.
    pub feed: FeedSettings,
    /// Recording upload settings.
    pub upload: UploadSettings,
    /// Subscription parameters.
    pub subscription: SubscriptionSettings,
    /// Local recording to upload before subscribing, if any.
    pub upload_file: Option<String>,
}

impl ReplayConfig {
    /// Create configuration from environment variables.
    ///
    /// Every variable is optional. Missing or unparseable values fall back
    /// to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mode = std::env::var("REPLAY_MODE")
            .map(|s| ReplayMode::from_str_case_insensitive(&s))
            .unwrap_or_default();

        let feed = FeedSettings {
            url: parse_env_string("REPLAY_FEED_URL", FeedSettings::default().url),
            retry_interval: parse_env_duration_secs(
                "REPLAY_RETRY_INTERVAL_SECS",
                FeedSettings::default().retry_interval,
            ),
            event_capacity: parse_env_usize(
                "REPLAY_EVENT_CAPACITY",
                FeedSettings::default().event_capacity,
            ),
        };

        let upload = UploadSettings {
            url: parse_env_string("REPLAY_UPLOAD_URL", UploadSettings::default().url),
            timeout: parse_env_duration_secs(
                "REPLAY_UPLOAD_TIMEOUT_SECS",
                UploadSettings::default().timeout,
            ),
        };

        let subscription = SubscriptionSettings {
            topic: parse_env_string("REPLAY_TOPIC", SubscriptionSettings::default().topic),
            filename: parse_env_optional("REPLAY_FILENAME"),
            replay_rate: std::env::var("REPLAY_RATE")
                .ok()
                .and_then(|v| v.parse().ok()),
            granularity: std::env::var("REPLAY_GRANULARITY")
                .ok()
                .and_then(|v| v.parse().ok()),
        };

        let upload_file = parse_env_optional("REPLAY_UPLOAD_FILE");

        Self {
            mode,
            feed,
            upload,
            subscription,
            upload_file,
        }
    }

    /// Build the client configuration for the feed connection.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.feed.url.clone())
            .with_retry(RetryConfig::new(self.feed.retry_interval))
            .with_event_capacity(self.feed.event_capacity)
    }

    /// Build the subscribe request for the configured session.
    #[must_use]
    pub fn subscribe_request(&self, request_id: impl Into<String>) -> SubscriptionRequest {
        let mut request = SubscriptionRequest::subscribe()
            .with_topic(self.subscription.topic.clone())
            .with_request_id(request_id);

        if let Some(filename) = &self.subscription.filename {
            request = request.with_file(filename.clone());
        }
        if let Some(rate) = self.subscription.replay_rate {
            request = request.with_replay_rate(rate);
        }
        if let Some(granularity) = self.subscription.granularity {
            request = request.with_granularity(granularity);
        }

        request
    }

    /// Build the matching unsubscribe request for the configured session.
    #[must_use]
    pub fn unsubscribe_request(&self, request_id: impl Into<String>) -> SubscriptionRequest {
        SubscriptionRequest::unsubscribe()
            .with_topic(self.subscription.topic.clone())
            .with_request_id(request_id)
    }
}

fn parse_env_string(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

fn parse_env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}
