//! Structured logging setup

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise the crate logs at `default_level` and
/// `tower_http` request spans at debug. Only the first call has any effect.
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("devil_router={},tower_http=debug", default_level))
        });

        // try_init: an embedding application may already own the global subscriber
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init();
    });
}
