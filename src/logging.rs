//! Logging setup for the leasehold binary.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a stderr `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (from the config's
/// `log_filter`) is used.
pub fn init(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(env_filter(default_filter))
        .try_init();
}

fn env_filter(default_filter: &str) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::builder().from_env_lossy()
    } else {
        EnvFilter::builder().parse_lossy(default_filter)
    }
}
