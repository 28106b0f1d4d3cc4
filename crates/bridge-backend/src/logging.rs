//! Logging initialization for host applications.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber, filtered by the configured log
/// level. A `RUST_LOG` environment variable takes precedence when set.
/// Calling this more than once leaves the first subscriber in place.
pub fn init_logging(log_level: &str) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
