use std::sync::Arc;

use coinpulse::api::rest::{ApiState, create_router};
use coinpulse::config::AppConfig;
use coinpulse::observability::tracing::init_tracing;
use coinpulse::upstream::coincap::CoinCapClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load()?;
    if config.upstream.api_key.is_none() {
        // Not fatal: every request classifies the missing credential on its
        // own, but say so up front instead of letting the first stream fail
        // mysteriously.
        tracing::warn!("no upstream API credential configured (COINPULSE__UPSTREAM__API_KEY)");
    }

    let source = Arc::new(CoinCapClient::new(&config.upstream));
    let state = Arc::new(ApiState {
        source,
        stream: config.stream.clone(),
    });

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr).await?;
    tracing::info!(addr = %config.server.listen_addr, "coinpulse listening");
    axum::serve(listener, app).await?;

    Ok(())
}
