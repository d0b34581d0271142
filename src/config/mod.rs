use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod loader;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub stream: StreamConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Upstream pricing API. The credential comes from the process environment;
/// a missing key is a per-request classified failure, never a startup crash.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            base_url: "https://rest.coincap.io/v3".to_string(),
            api_key: None,
            request_timeout_ms: 5_000,
        }
    }
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Stream session cadences. The detail view refreshes an order of magnitude
/// slower than the list view.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamConfig {
    pub list_interval_ms: u64,
    pub detail_interval_ms: u64,
    pub top_limit: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            list_interval_ms: 3_000,
            detail_interval_ms: 30_000,
            top_limit: 20,
        }
    }
}

impl StreamConfig {
    pub fn list_interval(&self) -> Duration {
        Duration::from_millis(self.list_interval_ms)
    }

    pub fn detail_interval(&self) -> Duration {
        Duration::from_millis(self.detail_interval_ms)
    }
}
