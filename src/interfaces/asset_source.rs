use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::types::asset::Asset;

/// Read-side contract over the upstream pricing source.
///
/// One HTTP request per call, no retries at this seam. Implementations are
/// shared read-only across any number of stream sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Top assets ordered by upstream rank.
    async fn top_assets(&self, limit: usize) -> Result<Vec<Asset>, UpstreamError>;

    /// A single asset by identity key.
    async fn asset_by_id(&self, id: &str) -> Result<Asset, UpstreamError>;

    /// A specific subset of assets, by identity keys.
    async fn assets_by_ids(&self, ids: &[String]) -> Result<Vec<Asset>, UpstreamError>;
}
