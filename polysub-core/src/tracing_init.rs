//! Structured logging bootstrap, shared by every `polysub-cli` subcommand.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber. Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if json {
        fmt().with_env_filter(filter).json().try_init()
    } else {
        fmt().with_env_filter(filter).try_init()
    };

    if let Err(err) = result {
        tracing::debug!("tracing subscriber already initialized: {err}");
    }
}
