use std::sync::Arc;

use tokio::time::Instant;

use crate::client::state::{DetailView, ListView, Navigation};
use crate::client::subscription::EventSink;
use crate::error::{ErrorCategory, ErrorSeverity, UpstreamError, classify, classify_upstream};
use crate::events::stream::StreamEvent;
use crate::interfaces::asset_source::AssetSource;
use crate::utils::retry::{RetryOptions, with_retry};

pub const DEFAULT_TOP_LIMIT: usize = 20;

const DECODE_FAILURE_MESSAGE: &str = "Failed to process price update";
const CONNECTION_LOST_MESSAGE: &str = "Lost connection to price updates";

/// Reconciliation engine for the market-overview list.
///
/// Owns its view state outright; one instance per subscribed view, nothing
/// shared. Mount fetches, streaming events patch, unmount clears — every
/// exit path goes through [`ListReconciler::unmount`] so no subscription
/// outlives its view.
pub struct ListReconciler {
    source: Arc<dyn AssetSource>,
    limit: usize,
    view: ListView,
}

impl ListReconciler {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self::with_limit(source, DEFAULT_TOP_LIMIT)
    }

    pub fn with_limit(source: Arc<dyn AssetSource>, limit: usize) -> Self {
        ListReconciler {
            source,
            limit,
            view: ListView::new(),
        }
    }

    pub fn view(&self) -> &ListView {
        &self.view
    }

    /// Idle → Loading → Ready, or Errored when the initial fetch fails
    /// after its retries. Returns whether the view is ready to subscribe.
    pub async fn mount(&mut self) -> bool {
        self.view.status.set_loading(true);

        let source = self.source.clone();
        let limit = self.limit;
        let mut on_retry = |attempt: u32, error: &UpstreamError| {
            tracing::warn!(attempt, %error, "initial list fetch failed; retrying");
        };
        let result = with_retry(
            || {
                let source = source.clone();
                async move { source.top_assets(limit).await }
            },
            RetryOptions {
                on_retry: Some(&mut on_retry),
                ..RetryOptions::default()
            },
        )
        .await;

        match result {
            Ok(assets) => {
                self.view.set_assets(assets);
                true
            }
            Err(error) => {
                // Nothing on screen yet, so this failure blocks the view.
                self.view
                    .status
                    .set_error(classify_upstream(&error, ErrorSeverity::Major, None));
                false
            }
        }
    }

    /// A blocking error means there is nothing to keep fresh; the caller
    /// must not open a subscription until a retry succeeds.
    pub fn can_subscribe(&self) -> bool {
        !self.view.status.has_blocking_error() && self.view.status.navigation == Navigation::Stay
    }

    /// Retry affordance for a blocked view: clear and refetch.
    pub async fn retry(&mut self) -> bool {
        self.view.status.clear_error();
        self.mount().await
    }

    /// Manual refresh: refetch the current id set and replace wholesale.
    /// Failures are logged, never surfaced as blocking errors.
    pub async fn refresh(&mut self) {
        let ids = self.view.ids();
        if ids.is_empty() {
            return;
        }
        match self.source.assets_by_ids(&ids).await {
            Ok(assets) => self.view.set_assets(assets),
            Err(error) => tracing::warn!(%error, "price refresh failed"),
        }
    }

    pub fn dismiss_error(&mut self) {
        self.view.status.dismiss();
    }

    /// Any state → Idle.
    pub fn unmount(&mut self) {
        self.view.clear();
    }
}

impl EventSink for ListReconciler {
    fn apply_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Assets { assets } => {
                for asset in &assets {
                    self.view.patch_price(&asset.id, &asset.price_usd);
                }
            }
            StreamEvent::Asset { asset } => {
                self.view.patch_price(&asset.id, &asset.price_usd);
            }
            StreamEvent::Error { error, status_code } => {
                // Data already on screen stays usable; this is advisory.
                self.view.status.set_error(classify(
                    error,
                    ErrorCategory::Api,
                    ErrorSeverity::Minor,
                    status_code,
                    None,
                ));
            }
        }
    }

    fn apply_malformed(&mut self) {
        self.view.status.set_error(classify(
            DECODE_FAILURE_MESSAGE,
            ErrorCategory::Api,
            ErrorSeverity::Minor,
            None,
            None,
        ));
    }

    fn on_stream_interrupted(&mut self) {
        self.view.status.set_error(classify(
            CONNECTION_LOST_MESSAGE,
            ErrorCategory::Network,
            ErrorSeverity::Minor,
            None,
            None,
        ));
    }

    fn toast_deadline(&self) -> Option<Instant> {
        self.view.status.toast_deadline()
    }

    fn expire_toast(&mut self, now: Instant) {
        self.view.status.expire_toast(now);
    }

    fn active(&self) -> bool {
        self.view.status.navigation == Navigation::Stay
    }
}

/// Reconciliation engine for a single asset's detail view.
pub struct DetailReconciler {
    source: Arc<dyn AssetSource>,
    id: String,
    view: DetailView,
}

impl DetailReconciler {
    pub fn new(source: Arc<dyn AssetSource>, id: impl Into<String>) -> Self {
        DetailReconciler {
            source,
            id: id.into(),
            view: DetailView::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn view(&self) -> &DetailView {
        &self.view
    }

    pub async fn mount(&mut self) -> bool {
        self.view.status.set_loading(true);

        let source = self.source.clone();
        let id = self.id.clone();
        let mut on_retry = |attempt: u32, error: &UpstreamError| {
            tracing::warn!(attempt, %error, "initial detail fetch failed; retrying");
        };
        let result = with_retry(
            || {
                let source = source.clone();
                let id = id.clone();
                async move { source.asset_by_id(&id).await }
            },
            RetryOptions {
                on_retry: Some(&mut on_retry),
                ..RetryOptions::default()
            },
        )
        .await;

        match result {
            Ok(asset) => {
                self.view.set_asset(asset);
                true
            }
            Err(error) => {
                self.view
                    .status
                    .set_error(classify_upstream(&error, ErrorSeverity::Major, None));
                false
            }
        }
    }

    pub fn can_subscribe(&self) -> bool {
        !self.view.status.has_blocking_error() && self.view.status.navigation == Navigation::Stay
    }

    pub async fn retry(&mut self) -> bool {
        self.view.status.clear_error();
        self.mount().await
    }

    pub fn dismiss_error(&mut self) {
        self.view.status.dismiss();
    }

    /// Unmount, or an identity-key change tearing down before resubscribe.
    pub fn unmount(&mut self) {
        self.view.clear();
    }
}

impl EventSink for DetailReconciler {
    fn apply_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Asset { asset } => {
                // Only the subscribed identity is merged.
                if asset.id == self.id {
                    self.view.patch_price(&asset.price_usd);
                }
            }
            StreamEvent::Assets { .. } => {
                // A list payload has no business on a detail stream.
                tracing::debug!(id = %self.id, "ignoring list payload on detail stream");
            }
            StreamEvent::Error { error, status_code } => {
                self.view.status.set_error(classify(
                    error,
                    ErrorCategory::Api,
                    ErrorSeverity::Minor,
                    status_code,
                    None,
                ));
            }
        }
    }

    fn apply_malformed(&mut self) {
        self.view.status.set_error(classify(
            DECODE_FAILURE_MESSAGE,
            ErrorCategory::Api,
            ErrorSeverity::Minor,
            None,
            None,
        ));
    }

    fn on_stream_interrupted(&mut self) {
        self.view.status.set_error(classify(
            CONNECTION_LOST_MESSAGE,
            ErrorCategory::Network,
            ErrorSeverity::Minor,
            None,
            None,
        ));
    }

    fn toast_deadline(&self) -> Option<Instant> {
        self.view.status.toast_deadline()
    }

    fn expire_toast(&mut self, now: Instant) {
        self.view.status.expire_toast(now);
    }

    fn active(&self) -> bool {
        self.view.status.navigation == Navigation::Stay
    }
}
