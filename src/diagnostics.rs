//! Internal diagnostics via tracing
//!
//! The library reports its own trouble (failed rotations, failed writes,
//! registry lifecycle) as `tracing` events. Applications that already run a
//! subscriber get these for free; [`init`] installs a plain stderr one.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the diagnostics filter
pub const FILTER_ENV: &str = "LOGWHEEL_LOG";

/// Filter used when the environment variable is unset or invalid
pub const DEFAULT_FILTER: &str = "logwheel=warn";

/// Install a stderr subscriber for logwheel's own diagnostics
///
/// Returns false if another global subscriber was already installed.
pub fn init() -> bool {
    let env_filter = tracing_subscriber::EnvFilter::try_from_env(FILTER_ENV)
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .is_ok()
}
