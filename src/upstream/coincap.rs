use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::config::UpstreamConfig;
use crate::error::UpstreamError;
use crate::interfaces::asset_source::AssetSource;
use crate::types::asset::{Asset, Envelope};

/// CoinCap v3 REST client.
///
/// Each operation performs exactly one HTTPS GET with a bearer credential
/// and unwraps the `{ "data": ... }` envelope. A missing credential fails
/// before any network I/O. Retrying is the caller's concern.
pub struct CoinCapClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinCapClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        CoinCapClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn credential(&self) -> Result<&str, UpstreamError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(UpstreamError::MissingCredential)
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path_and_query: &str,
    ) -> Result<T, UpstreamError> {
        let key = self.credential()?;
        let url = format!("{}{}", self.base_url, path_and_query);

        let response = self
            .http
            .get(&url)
            .bearer_auth(key)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|error| UpstreamError::Decode(error.to_string()))?;
        Ok(envelope.data)
    }
}

fn transport_error(error: reqwest::Error) -> UpstreamError {
    // Keep "timeout" in the text: the classifier branches on it.
    let detail = if error.is_timeout() {
        format!("request timeout: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        format!("request failed: {error}")
    };
    UpstreamError::Transport(detail)
}

#[async_trait]
impl AssetSource for CoinCapClient {
    async fn top_assets(&self, limit: usize) -> Result<Vec<Asset>, UpstreamError> {
        self.get_data(&format!("/assets?limit={limit}")).await
    }

    async fn asset_by_id(&self, id: &str) -> Result<Asset, UpstreamError> {
        self.get_data(&format!("/assets/{id}")).await
    }

    async fn assets_by_ids(&self, ids: &[String]) -> Result<Vec<Asset>, UpstreamError> {
        self.get_data(&format!("/assets?ids={}", ids.join(","))).await
    }
}
