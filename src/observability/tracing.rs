use tracing::Span;
use tracing_subscriber::EnvFilter;

use crate::api::stream::StreamScope;

/// Install the global subscriber. `RUST_LOG` wins; `info` otherwise.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

pub fn stream_session_span(scope: &StreamScope) -> Span {
    tracing::info_span!(
        "stream_session",
        scope = %scope,
    )
}
