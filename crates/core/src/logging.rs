use tracing_subscriber::{fmt, EnvFilter};

/// Install a stderr `fmt` subscriber. `RUST_LOG` wins over `default_level`.
/// Calling this twice is harmless.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
