//! Logging setup for the monitor.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing.
///
/// `RUST_LOG` wins over `default_filter` when set. Safe to call more than
/// once; later calls are ignored.
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false))
        .try_init();
}

/// Log line prefixes.
pub mod prefix {
    /// Startup
    pub const OPEN: &str = "✿";
    /// Shutdown
    pub const CLOSE: &str = "❀";
}
