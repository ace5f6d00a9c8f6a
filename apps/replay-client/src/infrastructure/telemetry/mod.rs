//! Tracing Setup
//!
//! Configures the `tracing` subscriber for the replay client. Log levels come
//! from `RUST_LOG`, with sane defaults for the crate and its noisier
//! dependencies.
//!
//! # Usage
//!
//! ```ignore
//! use replay_client::infrastructure::telemetry;
//!
//! // Initialize once at startup
//! telemetry::init();
//!
//! tracing::info!("ready");
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the tracing subscriber.
///
/// Call once at startup. Subsequent calls panic because the global
/// subscriber is already set.
#[allow(clippy::expect_used)]
pub fn init() {
    let env_filter = EnvFilter::from_default_env()
        .add_directive(
            "replay_client=info"
                .parse()
                .expect("static directive 'replay_client=info' is valid"),
        )
        .add_directive(
            "tungstenite=warn"
                .parse()
                .expect("static directive 'tungstenite=warn' is valid"),
        )
        .add_directive(
            "hyper=warn"
                .parse()
                .expect("static directive 'hyper=warn' is valid"),
        )
        .add_directive(
            "reqwest=warn"
                .parse()
                .expect("static directive 'reqwest=warn' is valid"),
        );

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
