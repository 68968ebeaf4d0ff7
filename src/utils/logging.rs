//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Map a configured level name onto a `tracing` level. Unknown names fall
/// back to `INFO`.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" | "warning" => tracing::Level::WARN,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    }
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins when it is set; otherwise everything at `default_level`
/// and above is emitted. Safe to call repeatedly: only the first call installs.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(parse_level(default_level).as_str()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
