//! End-to-end reconciliation flows: the scenarios a browser session walks
//! through, from first fetch to live patching to failure surfacing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use coinpulse::api::rest::{ApiState, create_router};
use coinpulse::client::reconciler::{DetailReconciler, ListReconciler};
use coinpulse::client::state::Navigation;
use coinpulse::client::subscription::{EventSink, drive};
use coinpulse::config::{StreamConfig, UpstreamConfig};
use coinpulse::error::{ErrorCategory, UpstreamError};
use coinpulse::events::stream::StreamEvent;
use coinpulse::interfaces::asset_source::AssetSource;
use coinpulse::types::asset::Asset;
use coinpulse::upstream::coincap::CoinCapClient;
use tokio::time::Instant;

fn asset(id: &str, rank: &str, price: &str) -> Asset {
    Asset {
        id: id.to_string(),
        rank: rank.to_string(),
        symbol: id.to_uppercase(),
        name: id.to_string(),
        price_usd: price.to_string(),
        change_percent24_hr: "1.25".to_string(),
        market_cap_usd: "1000000000".to_string(),
        volume_usd24_hr: "50000000".to_string(),
        supply: "19000000".to_string(),
        max_supply: Some("21000000".to_string()),
        vwap24_hr: "100.0".to_string(),
    }
}

/// In-memory upstream: serves a fixed catalog, 404s on unknown ids.
struct CatalogSource {
    assets: Vec<Asset>,
}

#[async_trait]
impl AssetSource for CatalogSource {
    async fn top_assets(&self, limit: usize) -> Result<Vec<Asset>, UpstreamError> {
        Ok(self.assets.iter().take(limit).cloned().collect())
    }

    async fn asset_by_id(&self, id: &str) -> Result<Asset, UpstreamError> {
        self.assets
            .iter()
            .find(|asset| asset.id == id)
            .cloned()
            .ok_or(UpstreamError::Status(404))
    }

    async fn assets_by_ids(&self, ids: &[String]) -> Result<Vec<Asset>, UpstreamError> {
        Ok(self
            .assets
            .iter()
            .filter(|asset| ids.contains(&asset.id))
            .cloned()
            .collect())
    }
}

fn three_asset_source() -> Arc<CatalogSource> {
    Arc::new(CatalogSource {
        assets: vec![
            asset("bitcoin", "1", "100.0"),
            asset("ethereum", "2", "50.0"),
            asset("tether", "3", "1.0"),
        ],
    })
}

/// Scenario A: a streaming event patches one asset's price and nothing else.
#[tokio::test(start_paused = true)]
async fn list_patch_changes_exactly_one_price() {
    let mut reconciler = ListReconciler::new(three_asset_source());
    assert!(reconciler.mount().await);
    let before: Vec<Asset> = reconciler.view().assets.clone();

    reconciler.apply_event(StreamEvent::Assets {
        assets: vec![asset("ethereum", "2", "55.5")],
    });

    let after = &reconciler.view().assets;
    assert_eq!(after.len(), 3);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    assert_eq!(after[1].price_usd, "55.5");
    // The patch touches the price and only the price.
    assert_eq!(after[1].rank, before[1].rank);
    assert_eq!(after[1].market_cap_usd, before[1].market_cap_usd);
}

/// Scenario B: a 404 on the initial detail fetch navigates to not-found and
/// never shows the page shell.
#[tokio::test(start_paused = true)]
async fn detail_404_navigates_instead_of_rendering() {
    let mut reconciler = DetailReconciler::new(three_asset_source(), "dogecoin");
    assert!(!reconciler.mount().await);

    assert_eq!(reconciler.view().status.navigation, Navigation::NotFound);
    assert!(reconciler.view().asset.is_none());
    assert!(!reconciler.can_subscribe());
}

/// Scenario C: an in-band rate-limit event shows a non-blocking toast that
/// auto-dismisses after exactly five seconds, leaving the data untouched.
#[tokio::test(start_paused = true)]
async fn rate_limit_toast_auto_dismisses_after_five_seconds() {
    let mut reconciler = ListReconciler::new(three_asset_source());
    reconciler.mount().await;
    let before: Vec<Asset> = reconciler.view().assets.clone();

    let armed_at = Instant::now();
    reconciler.apply_event(StreamEvent::error("rate limited", Some(429)));

    let error = reconciler.view().status.error.as_ref().expect("toast shown");
    assert!(!error.is_blocking());
    assert!(error.user_message.contains("high traffic"));
    assert_eq!(&reconciler.view().assets, &before);

    reconciler.expire_toast(armed_at + Duration::from_millis(4_999));
    assert!(reconciler.view().status.error.is_some(), "not yet expired");

    reconciler.expire_toast(armed_at + Duration::from_millis(5_000));
    assert!(reconciler.view().status.error.is_none(), "expired at 5000ms");
    assert_eq!(&reconciler.view().assets, &before);
}

/// Scenario D: a missing credential blocks the view before any network call.
#[tokio::test(start_paused = true)]
async fn missing_credential_blocks_without_touching_the_network() {
    let upstream = wiremock::MockServer::start().await;
    let client = CoinCapClient::new(&UpstreamConfig {
        base_url: upstream.uri(),
        api_key: None,
        request_timeout_ms: 3_000,
    });

    let mut reconciler = ListReconciler::new(Arc::new(client));
    assert!(!reconciler.mount().await);

    let error = reconciler.view().status.error.as_ref().expect("blocking error");
    assert!(error.is_blocking());
    assert_eq!(error.category, ErrorCategory::Api);

    let received = upstream.received_requests().await.unwrap_or_default();
    assert!(received.is_empty(), "no outbound call may be attempted");
}

/// Full loop: server publisher to client reconciler over a live SSE
/// connection, with the drive loop doing the consuming.
#[tokio::test]
async fn live_stream_patches_the_reconciled_view() {
    let source = three_asset_source();
    let state = Arc::new(ApiState {
        source: source.clone(),
        stream: StreamConfig {
            list_interval_ms: 50,
            detail_interval_ms: 50,
            top_limit: 20,
        },
    });
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    let mut reconciler = ListReconciler::new(source);
    assert!(reconciler.mount().await);
    assert!(reconciler.can_subscribe());

    let http = reqwest::Client::new();
    let url = format!("http://{addr}/api/prices");
    // The drive loop never returns on a healthy stream; give it a slice of
    // real time and then inspect the reconciled state.
    let _ = tokio::time::timeout(
        Duration::from_millis(400),
        drive(&mut reconciler, &http, &url),
    )
    .await;

    assert_eq!(reconciler.view().assets.len(), 3);
    assert_eq!(reconciler.view().assets[0].price_usd, "100.0");
    assert!(reconciler.view().status.navigation == Navigation::Stay);
}
