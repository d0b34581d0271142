use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::stream;
use crate::config::StreamConfig;
use crate::interfaces::asset_source::AssetSource;

/// Shared, read-only state: safe for any number of concurrent stream
/// sessions since nothing here mutates after startup.
pub struct ApiState {
    pub source: Arc<dyn AssetSource>,
    pub stream: StreamConfig,
}

pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/prices", get(stream::list_stream))
        .route("/api/prices/:id", get(stream::detail_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
