//! Replay Client Binary
//!
//! Connects to a market data replay server, subscribes to a topic, and
//! streams the replayed records until the feed completes.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin replay-client
//! ```
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `REPLAY_FEED_URL`: WebSocket endpoint (default: <ws://127.0.0.1:8080/v1/ws>)
//! - `REPLAY_UPLOAD_URL`: Upload endpoint (default: <http://127.0.0.1:8080/v1/upload>)
//! - `REPLAY_MODE`: "orders" | "candles" (default: orders)
//! - `REPLAY_TOPIC`: Topic pattern to subscribe to (default: transaction/*/*)
//! - `REPLAY_FILENAME`: Server-side recording to replay
//! - `REPLAY_RATE`: Replay rate multiplier
//! - `REPLAY_GRANULARITY`: Candle granularity in seconds
//! - `REPLAY_UPLOAD_FILE`: Local recording to upload and replay
//! - `REPLAY_RETRY_INTERVAL_SECS`: Delay between reconnect attempts (default: 3)
//! - `REPLAY_EVENT_CAPACITY`: Feed event channel capacity (default: 256)
//! - `REPLAY_UPLOAD_TIMEOUT_SECS`: Upload request timeout (default: 30)
//! - `RUST_LOG`: Log level (default: info)

use std::path::Path;
use std::time::Duration;

use replay_client::domain::records::Candle;
use replay_client::domain::series::merge;
use replay_client::infrastructure::config::{ReplayConfig, ReplayMode};
use replay_client::infrastructure::replay::{
    CandleCodec, FeedEvent, OrderClient, OrderCodec, RawClient, RawCodec, RecordCodec,
    UploadClient,
};
use replay_client::infrastructure::telemetry;
use rust_decimal::Decimal;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    load_dotenv();
    telemetry::init();

    tracing::info!("Starting replay client");

    let mut config = ReplayConfig::from_env();
    log_config(&config);

    // A freshly uploaded recording replaces any configured filename
    if let Some(path) = config.upload_file.clone() {
        let stored = upload_recording(&config, Path::new(&path)).await?;
        config.subscription.filename = Some(stored);
    }

    tokio::select! {
        result = run_session(config) => result?,
        () = await_shutdown() => {}
    }

    tracing::info!("Replay client stopped");
    Ok(())
}

/// Run the configured replay session to completion.
async fn run_session(config: ReplayConfig) -> Result<(), Box<dyn std::error::Error>> {
    match config.mode {
        ReplayMode::Orders => run_orders(config).await,
        ReplayMode::Candles => run_candles(config).await,
    }
}

/// Stream order fills until the feed completes.
async fn run_orders(config: ReplayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let request_id = next_request_id();
    let subscribe = config.subscribe_request(request_id.clone());

    let (client, mut events) = OrderClient::connect(config.client_config(), OrderCodec::new());

    let mut notional = Decimal::ZERO;

    while let Some(event) = events.recv().await {
        match event {
            FeedEvent::Opened => {
                tracing::info!(topic = %config.subscription.topic, "Feed connected, subscribing");
                client.clear();
                notional = Decimal::ZERO;
                if let Err(e) = client.send(&subscribe) {
                    tracing::warn!(error = %e, "Subscribe failed, will retry after reconnect");
                }
            }
            FeedEvent::Record(fill) => {
                notional += fill.notional();
                tracing::info!(
                    price = %fill.price,
                    quantity = fill.quantity,
                    aggressor = ?fill.aggressor,
                    timestamp = fill.timestamp,
                    "Fill"
                );
            }
            FeedEvent::EndOfFeed(eof) => {
                tracing::info!(
                    request_id = %eof.request_id,
                    fills = client.record_count(),
                    notional = %notional,
                    "Feed complete"
                );
                if let Err(e) = client.send(&config.unsubscribe_request(request_id.as_str())) {
                    tracing::warn!(error = %e, "Unsubscribe failed");
                }
                break;
            }
            FeedEvent::Closed { reason } => {
                tracing::warn!(reason = %reason, "Feed disconnected");
            }
            FeedEvent::Reconnecting { attempt } => {
                tracing::info!(attempt, "Feed reconnecting");
            }
            FeedEvent::Error { message } => {
                tracing::error!(error = %message, "Feed error");
            }
        }
    }

    client.shutdown();
    Ok(())
}

/// Stream raw frames and recompute the merged candle series from the
/// buffer on a fixed render tick.
async fn run_candles(config: ReplayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let request_id = next_request_id();
    let subscribe = config.subscribe_request(request_id.clone());

    let (client, mut events) = RawClient::connect(config.client_config(), RawCodec::new());

    let decoder = CandleCodec::new();
    let mut render = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    FeedEvent::Opened => {
                        tracing::info!(topic = %config.subscription.topic, "Feed connected, subscribing");
                        client.clear();
                        if let Err(e) = client.send(&subscribe) {
                            tracing::warn!(error = %e, "Subscribe failed, will retry after reconnect");
                        }
                    }
                    FeedEvent::Record(raw) => {
                        tracing::debug!(bytes = raw.len(), "Frame buffered");
                    }
                    FeedEvent::EndOfFeed(eof) => {
                        tracing::info!(request_id = %eof.request_id, "Feed complete");
                        break;
                    }
                    FeedEvent::Closed { reason } => {
                        tracing::warn!(reason = %reason, "Feed disconnected");
                    }
                    FeedEvent::Reconnecting { attempt } => {
                        tracing::info!(attempt, "Feed reconnecting");
                    }
                    FeedEvent::Error { message } => {
                        tracing::error!(error = %message, "Feed error");
                    }
                }
            }
            _ = render.tick() => {
                let mut completed = None;
                let series = merge(
                    client.records().iter().map(|raw| decoder.decode(raw)),
                    |eof| completed = Some(eof.request_id.clone()),
                );
                if let Some(finished) = completed {
                    tracing::info!(request_id = %finished, "Feed complete");
                    log_series(&series);
                    if let Err(e) = client.send(&config.unsubscribe_request(request_id.as_str())) {
                        tracing::warn!(error = %e, "Unsubscribe failed");
                    }
                    break;
                }
                log_series_tail(&series);
            }
        }
    }

    client.shutdown();
    Ok(())
}

/// Upload a local recording and return the server-side path to replay.
async fn upload_recording(
    config: &ReplayConfig,
    path: &Path,
) -> Result<String, Box<dyn std::error::Error>> {
    let uploader = UploadClient::new(config.upload.url.clone(), config.upload.timeout)?;
    let receipt = uploader.upload_path(path).await?;
    Ok(receipt.filepath)
}

/// Generate a unique request id for this session.
fn next_request_id() -> String {
    format!("req-{}", chrono::Utc::now().timestamp_millis())
}

/// Log the merged candle series.
fn log_series(series: &[Candle]) {
    tracing::info!(
        candles = series.len(),
        first = series.first().map_or(0, |c| c.timestamp),
        last = series.last().map_or(0, |c| c.timestamp),
        "Series merged"
    );
}

/// Log the newest candle of the merged series.
fn log_series_tail(series: &[Candle]) {
    if let Some(last) = series.last() {
        tracing::info!(
            candles = series.len(),
            timestamp = last.timestamp,
            close = %last.close,
            "Series updated"
        );
    }
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Log the parsed configuration.
fn log_config(config: &ReplayConfig) {
    tracing::info!(
        mode = config.mode.as_str(),
        feed_url = %config.feed.url,
        topic = %config.subscription.topic,
        retry_interval_secs = config.feed.retry_interval.as_secs(),
        "Configuration loaded"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv_from_ancestors() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
