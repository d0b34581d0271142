//! Streaming endpoint behavior against a mocked upstream: header contract,
//! in-band failure semantics, and session survival across upstream errors.

use std::sync::Arc;

use coinpulse::api::rest::{ApiState, create_router};
use coinpulse::client::subscription::{StreamItem, Subscription};
use coinpulse::config::{StreamConfig, UpstreamConfig};
use coinpulse::events::stream::StreamEvent;
use coinpulse::upstream::coincap::CoinCapClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn asset_json(id: &str, rank: &str, price: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "rank": rank,
        "symbol": id.to_uppercase(),
        "name": id,
        "priceUsd": price,
        "changePercent24Hr": "1.25",
        "marketCapUsd": "1000000000",
        "volumeUsd24Hr": "50000000",
        "supply": "19000000",
        "maxSupply": "21000000",
        "vwap24Hr": "100.0"
    })
}

fn fast_stream_config() -> StreamConfig {
    StreamConfig {
        list_interval_ms: 50,
        detail_interval_ms: 50,
        top_limit: 20,
    }
}

async fn spawn_app(upstream: &MockServer, stream: StreamConfig) -> String {
    let source = Arc::new(CoinCapClient::new(&UpstreamConfig {
        base_url: upstream.uri(),
        api_key: Some("test-key".to_string()),
        request_timeout_ms: 3_000,
    }));
    let state = Arc::new(ApiState { source, stream });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn health_endpoint_responds() {
    let upstream = MockServer::start().await;
    let base = spawn_app(&upstream, fast_stream_config()).await;

    let body = reqwest::get(format!("{base}/health"))
        .await
        .expect("health request")
        .text()
        .await
        .expect("health body");
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn list_stream_declares_sse_headers() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [asset_json("bitcoin", "1", "100.0")]
        })))
        .mount(&upstream)
        .await;

    let base = spawn_app(&upstream, fast_stream_config()).await;
    let response = reqwest::get(format!("{base}/api/prices"))
        .await
        .expect("stream request");

    let headers = response.headers();
    assert_eq!(
        headers.get("content-type").map(|v| v.to_str().unwrap()),
        Some("text/event-stream"),
    );
    assert_eq!(
        headers.get("cache-control").map(|v| v.to_str().unwrap()),
        Some("no-cache"),
    );
}

#[tokio::test]
async fn list_stream_emits_a_snapshot_immediately() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                asset_json("bitcoin", "1", "100.0"),
                asset_json("ethereum", "2", "50.0"),
            ]
        })))
        .mount(&upstream)
        .await;

    let base = spawn_app(&upstream, fast_stream_config()).await;
    let http = reqwest::Client::new();
    let mut subscription = Subscription::open(&http, &format!("{base}/api/prices"))
        .await
        .expect("subscription opens");

    match subscription.next_event().await {
        Some(StreamItem::Event(StreamEvent::Assets { assets })) => {
            assert_eq!(assets.len(), 2);
            assert_eq!(assets[0].id, "bitcoin");
        }
        other => panic!("expected an assets snapshot, got {other:?}"),
    }
}

#[tokio::test]
async fn upstream_failure_streams_in_band_and_the_session_recovers() {
    let upstream = MockServer::start().await;
    // First pull fails; every later pull succeeds. The connection must
    // survive the failure and keep ticking.
    Mock::given(method("GET"))
        .and(path("/assets"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/assets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [asset_json("bitcoin", "1", "101.0")]
        })))
        .mount(&upstream)
        .await;

    let base = spawn_app(&upstream, fast_stream_config()).await;
    let http = reqwest::Client::new();
    let mut subscription = Subscription::open(&http, &format!("{base}/api/prices"))
        .await
        .expect("subscription opens");

    match subscription.next_event().await {
        Some(StreamItem::Event(StreamEvent::Error { error, status_code })) => {
            assert!(error.contains("500"));
            // Status codes stay off the list wire contract.
            assert_eq!(status_code, None);
        }
        other => panic!("expected an in-band error first, got {other:?}"),
    }

    match subscription.next_event().await {
        Some(StreamItem::Event(StreamEvent::Assets { assets })) => {
            assert_eq!(assets[0].price_usd, "101.0");
        }
        other => panic!("expected recovery on the next tick, got {other:?}"),
    }
}

#[tokio::test]
async fn detail_stream_keys_on_the_path_segment_and_carries_status_codes() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets/dogecoin"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;

    let base = spawn_app(&upstream, fast_stream_config()).await;
    let http = reqwest::Client::new();
    let mut subscription = Subscription::open(&http, &format!("{base}/api/prices/dogecoin"))
        .await
        .expect("subscription opens");

    match subscription.next_event().await {
        Some(StreamItem::Event(StreamEvent::Error { status_code, .. })) => {
            assert_eq!(status_code, Some(404));
        }
        other => panic!("expected an in-band 404, got {other:?}"),
    }
}

#[tokio::test]
async fn detail_stream_emits_the_single_asset_variant() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets/bitcoin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": asset_json("bitcoin", "1", "64230.18")
        })))
        .mount(&upstream)
        .await;

    let base = spawn_app(&upstream, fast_stream_config()).await;
    let http = reqwest::Client::new();
    let mut subscription = Subscription::open(&http, &format!("{base}/api/prices/bitcoin"))
        .await
        .expect("subscription opens");

    match subscription.next_event().await {
        Some(StreamItem::Event(StreamEvent::Asset { asset })) => {
            assert_eq!(asset.id, "bitcoin");
            assert_eq!(asset.price_usd, "64230.18");
        }
        other => panic!("expected a single-asset event, got {other:?}"),
    }
}

#[tokio::test]
async fn frames_are_newline_delimited_data_lines() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [asset_json("bitcoin", "1", "100.0")]
        })))
        .mount(&upstream)
        .await;

    let base = spawn_app(&upstream, fast_stream_config()).await;
    let mut response = reqwest::get(format!("{base}/api/prices"))
        .await
        .expect("stream request");

    let chunk = response.chunk().await.expect("first chunk").expect("chunk");
    let text = String::from_utf8_lossy(&chunk);
    assert!(text.starts_with("data: {"));
    assert!(text.ends_with("\n\n"));
}
