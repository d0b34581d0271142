//! Terminal watcher: the consuming half of the system. Runs the initial
//! fetch against the upstream API, subscribes to a running coinpulse
//! server's price stream, and prints the reconciled view as updates land.
//!
//! Usage: `watch` for the top-list view, `watch <asset-id>` for one asset.

use std::sync::Arc;

use tokio::time::Instant;

use coinpulse::client::reconciler::{DetailReconciler, ListReconciler};
use coinpulse::client::state::Navigation;
use coinpulse::client::subscription::{EventSink, drive};
use coinpulse::config::AppConfig;
use coinpulse::events::stream::StreamEvent;
use coinpulse::observability::tracing::init_tracing;
use coinpulse::upstream::coincap::CoinCapClient;

enum WatchSink {
    List(ListReconciler),
    Detail(DetailReconciler),
}

impl WatchSink {
    fn print(&self) {
        match self {
            WatchSink::List(reconciler) => {
                for row in reconciler.view().rows() {
                    println!(
                        "{:>3}  {:<6} {:<24} {:>16} {:>9}",
                        row.rank, row.symbol, row.name, row.price, row.change,
                    );
                }
                println!();
            }
            WatchSink::Detail(reconciler) => {
                let view = reconciler.view();
                if let (Some(price), Some(change)) = (view.price_display(), view.change_display())
                {
                    println!("{}  {price}  ({change})", reconciler.id());
                }
            }
        }
    }

    fn print_notice(&self) {
        let status = match self {
            WatchSink::List(reconciler) => &reconciler.view().status,
            WatchSink::Detail(reconciler) => &reconciler.view().status,
        };
        if let Some(error) = &status.error {
            eprintln!("notice: {}", error.user_message);
        }
    }
}

impl EventSink for WatchSink {
    fn apply_event(&mut self, event: StreamEvent) {
        match self {
            WatchSink::List(reconciler) => reconciler.apply_event(event),
            WatchSink::Detail(reconciler) => reconciler.apply_event(event),
        }
        self.print();
        self.print_notice();
    }

    fn apply_malformed(&mut self) {
        match self {
            WatchSink::List(reconciler) => reconciler.apply_malformed(),
            WatchSink::Detail(reconciler) => reconciler.apply_malformed(),
        }
        self.print_notice();
    }

    fn on_stream_interrupted(&mut self) {
        match self {
            WatchSink::List(reconciler) => reconciler.on_stream_interrupted(),
            WatchSink::Detail(reconciler) => reconciler.on_stream_interrupted(),
        }
        self.print_notice();
    }

    fn toast_deadline(&self) -> Option<Instant> {
        match self {
            WatchSink::List(reconciler) => reconciler.toast_deadline(),
            WatchSink::Detail(reconciler) => reconciler.toast_deadline(),
        }
    }

    fn expire_toast(&mut self, now: Instant) {
        match self {
            WatchSink::List(reconciler) => reconciler.expire_toast(now),
            WatchSink::Detail(reconciler) => reconciler.expire_toast(now),
        }
    }

    fn active(&self) -> bool {
        match self {
            WatchSink::List(reconciler) => reconciler.active(),
            WatchSink::Detail(reconciler) => reconciler.active(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load()?;
    let source = Arc::new(CoinCapClient::new(&config.upstream));
    let server = format!("http://{}", config.server.listen_addr);

    let (mut sink, url) = match std::env::args().nth(1) {
        Some(id) => {
            let mut reconciler = DetailReconciler::new(source, id.clone());
            if !reconciler.mount().await {
                if reconciler.view().status.navigation == Navigation::NotFound {
                    eprintln!("{id}: not found");
                } else if let Some(error) = &reconciler.view().status.error {
                    eprintln!("{}", error.user_message);
                }
                std::process::exit(1);
            }
            (
                WatchSink::Detail(reconciler),
                format!("{server}/api/prices/{id}"),
            )
        }
        None => {
            let mut reconciler = ListReconciler::new(source);
            if !reconciler.mount().await {
                if let Some(error) = &reconciler.view().status.error {
                    eprintln!("{}", error.user_message);
                }
                std::process::exit(1);
            }
            (WatchSink::List(reconciler), format!("{server}/api/prices"))
        }
    };

    sink.print();

    let http = reqwest::Client::new();
    drive(&mut sink, &http, &url).await;

    Ok(())
}
