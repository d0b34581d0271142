use tokio::time::{Duration, Instant};

use crate::error::AppError;
use crate::types::asset::Asset;
use crate::utils::format::{format_compact, format_percent, format_price};

/// How long a non-blocking notice stays on screen without a manual dismissal.
pub const TOAST_DURATION: Duration = Duration::from_millis(5_000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    /// A 404 sends the user to the not-found view instead of an inline error.
    NotFound,
}

/// Status shared by every subscribed view: the loading flag, the single
/// current error for the scope, and the toast/navigation bookkeeping that
/// hangs off it. Owned by a view, never global.
#[derive(Debug)]
pub struct ViewStatus {
    pub loading: bool,
    pub error: Option<AppError>,
    pub navigation: Navigation,
    toast_deadline: Option<Instant>,
}

impl ViewStatus {
    fn new() -> Self {
        ViewStatus {
            loading: false,
            error: None,
            navigation: Navigation::Stay,
            toast_deadline: None,
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Install `error` as the scope's current error, replacing any prior one.
    /// A 404 flips navigation instead of rendering inline, whatever the
    /// category. Non-blocking errors arm the auto-dismiss deadline.
    pub fn set_error(&mut self, error: AppError) {
        if error.status_code == Some(404) {
            self.navigation = Navigation::NotFound;
        }
        self.toast_deadline = if error.is_blocking() {
            None
        } else {
            Some(Instant::now() + TOAST_DURATION)
        };
        self.error = Some(error);
        self.loading = false;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
        self.toast_deadline = None;
    }

    /// Manual dismissal of the current notice.
    pub fn dismiss(&mut self) {
        self.clear_error();
    }

    pub fn toast_deadline(&self) -> Option<Instant> {
        self.toast_deadline
    }

    /// Auto-dismiss once the deadline has passed. Returns whether it fired.
    pub fn expire_toast(&mut self, now: Instant) -> bool {
        match self.toast_deadline {
            Some(deadline) if now >= deadline => {
                self.clear_error();
                true
            }
            _ => false,
        }
    }

    pub fn has_blocking_error(&self) -> bool {
        self.error.as_ref().is_some_and(AppError::is_blocking)
    }

    fn reset(&mut self) {
        *self = ViewStatus::new();
    }
}

/// The market-overview collection: ordered by upstream rank at fetch time,
/// patched in place by streaming events, replaced wholesale on refetch.
#[derive(Debug)]
pub struct ListView {
    pub assets: Vec<Asset>,
    pub status: ViewStatus,
}

impl ListView {
    pub fn new() -> Self {
        ListView {
            assets: Vec::new(),
            status: ViewStatus::new(),
        }
    }

    /// Full replacement; clears the current error.
    pub fn set_assets(&mut self, assets: Vec<Asset>) {
        self.assets = assets;
        self.status.loading = false;
        self.status.clear_error();
    }

    /// Patch one record's price by identity key. An unmatched key is
    /// dropped, not inserted; the collection never grows from a patch.
    pub fn patch_price(&mut self, id: &str, price_usd: &str) {
        if let Some(asset) = self.assets.iter_mut().find(|asset| asset.id == id) {
            asset.price_usd = price_usd.to_string();
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.assets.iter().map(|asset| asset.id.clone()).collect()
    }

    /// Render-model rows: numeric strings become display text here and
    /// nowhere earlier.
    pub fn rows(&self) -> Vec<ListRow> {
        self.assets
            .iter()
            .map(|asset| ListRow {
                id: asset.id.clone(),
                rank: asset.rank.clone(),
                symbol: asset.symbol.clone(),
                name: asset.name.clone(),
                price: format_price(asset.price()),
                change: format_percent(asset.change_percent()),
                market_cap: format_compact(asset.market_cap()),
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.assets.clear();
        self.status.reset();
    }
}

impl Default for ListView {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListRow {
    pub id: String,
    pub rank: String,
    pub symbol: String,
    pub name: String,
    pub price: String,
    pub change: String,
    pub market_cap: String,
}

/// Single-asset detail view.
#[derive(Debug)]
pub struct DetailView {
    pub asset: Option<Asset>,
    pub status: ViewStatus,
}

impl DetailView {
    pub fn new() -> Self {
        DetailView {
            asset: None,
            status: ViewStatus::new(),
        }
    }

    pub fn set_asset(&mut self, asset: Asset) {
        self.asset = Some(asset);
        self.status.loading = false;
        self.status.clear_error();
    }

    pub fn patch_price(&mut self, price_usd: &str) {
        if let Some(asset) = self.asset.as_mut() {
            asset.price_usd = price_usd.to_string();
        }
    }

    pub fn price_display(&self) -> Option<String> {
        self.asset.as_ref().map(|asset| format_price(asset.price()))
    }

    pub fn change_display(&self) -> Option<String> {
        self.asset
            .as_ref()
            .map(|asset| format_percent(asset.change_percent()))
    }

    pub fn market_cap_display(&self) -> Option<String> {
        self.asset
            .as_ref()
            .map(|asset| format_compact(asset.market_cap()))
    }

    pub fn clear(&mut self) {
        self.asset = None;
        self.status.reset();
    }
}

impl Default for DetailView {
    fn default() -> Self {
        Self::new()
    }
}
