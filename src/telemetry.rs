//! Tracing setup for hosts embedding morphbus.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize a tracing subscriber with an environment filter.
///
/// `RUST_LOG` selects the level, `info` otherwise. Returns `false` when a
/// global subscriber was already installed; that one is kept.
pub fn init_tracing() -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
