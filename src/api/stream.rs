use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;

use crate::api::rest::ApiState;
use crate::events::stream::StreamEvent;
use crate::interfaces::asset_source::AssetSource;
use crate::observability::tracing::stream_session_span;

/// What a stream session is subscribed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamScope {
    /// Top-N snapshot per tick.
    List { limit: usize },
    /// One asset per tick, keyed by identity.
    Detail { id: String },
}

impl fmt::Display for StreamScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamScope::List { limit } => write!(f, "list[{limit}]"),
            StreamScope::Detail { id } => write!(f, "detail[{id}]"),
        }
    }
}

/// Server side of one streaming subscription.
///
/// One publisher per open connection. It pulls current prices on a fixed
/// cadence and emits them as discrete events to its single consumer.
/// Upstream failures become in-band error events and never end the session;
/// only consumer disconnect (or a fatal send failure) does.
///
/// Teardown races the timer: a tick may already be in flight when close is
/// requested, so every emission re-checks the `connected` flag immediately
/// before sending instead of trusting timer cancellation.
pub struct StreamPublisher {
    source: Arc<dyn AssetSource>,
    scope: StreamScope,
    cadence: Duration,
    connected: Arc<AtomicBool>,
}

/// Cloneable liveness handle for a publisher's session.
#[derive(Clone)]
pub struct SessionHandle {
    connected: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn close(&self) {
        self.connected.swap(false, Ordering::AcqRel);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl StreamPublisher {
    pub fn new(source: Arc<dyn AssetSource>, scope: StreamScope, cadence: Duration) -> Self {
        StreamPublisher {
            source,
            scope,
            cadence,
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn scope(&self) -> &StreamScope {
        &self.scope
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            connected: self.connected.clone(),
        }
    }

    /// Drive the session until the consumer goes away.
    pub async fn run(self, tx: mpsc::Sender<StreamEvent>) {
        // Connecting: one immediate pull, so the subscriber never stares at
        // a silent connection, even when the first pull fails.
        let first = self.poll_once().await;
        if !self.emit(&tx, first).await {
            return;
        }

        let mut ticker = tokio::time::interval(self.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // An interval's first tick resolves immediately; the initial
        // emission already happened, so consume it.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if !self.is_connected() {
                break;
            }
            let event = self.poll_once().await;
            if !self.emit(&tx, event).await {
                break;
            }
        }
    }

    async fn poll_once(&self) -> StreamEvent {
        match &self.scope {
            StreamScope::List { limit } => match self.source.top_assets(*limit).await {
                Ok(assets) => StreamEvent::Assets { assets },
                Err(error) => {
                    tracing::warn!(scope = %self.scope, %error, "price update failed");
                    // The list wire contract carries no status code.
                    StreamEvent::error(error.to_string(), None)
                }
            },
            StreamScope::Detail { id } => match self.source.asset_by_id(id).await {
                Ok(asset) => StreamEvent::Asset { asset },
                Err(error) => {
                    tracing::warn!(scope = %self.scope, %error, "price update failed");
                    StreamEvent::error(error.to_string(), error.status_code())
                }
            },
        }
    }

    /// Returns false once the session is over. The liveness check happens
    /// immediately before the send; a tick that was already scheduled when
    /// teardown began emits nothing.
    async fn emit(&self, tx: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> bool {
        if !self.is_connected() {
            return false;
        }
        if tx.send(event).await.is_err() {
            self.close();
            return false;
        }
        true
    }

    /// Idempotent: the flag flips exactly once, duplicate calls are no-ops.
    pub fn close(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            tracing::debug!(scope = %self.scope, "stream session closed");
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// `GET /api/prices` — top-N list stream, fast cadence.
pub async fn list_stream(State(state): State<Arc<ApiState>>) -> Response {
    let publisher = StreamPublisher::new(
        state.source.clone(),
        StreamScope::List {
            limit: state.stream.top_limit,
        },
        state.stream.list_interval(),
    );
    sse_response(publisher)
}

/// `GET /api/prices/:id` — single-asset detail stream, slow cadence.
pub async fn detail_stream(
    Path(id): Path<String>,
    State(state): State<Arc<ApiState>>,
) -> Response {
    let publisher = StreamPublisher::new(
        state.source.clone(),
        StreamScope::Detail { id },
        state.stream.detail_interval(),
    );
    sse_response(publisher)
}

/// Guard that flips the session's liveness flag as soon as the transport
/// drops the response body. The publisher also notices via send failure,
/// but a slow cadence would leave it asleep until the next tick.
struct SessionGuard {
    handle: SessionHandle,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.handle.close();
    }
}

fn sse_response(publisher: StreamPublisher) -> Response {
    let span = stream_session_span(publisher.scope());
    let guard = SessionGuard {
        handle: publisher.handle(),
    };

    let (tx, rx) = mpsc::channel::<StreamEvent>(16);
    tokio::spawn(publisher.run(tx).instrument(span));

    let frames = ReceiverStream::new(rx).map(move |event| {
        let _ = &guard;
        Ok::<_, Infallible>(event.sse_frame())
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(frames))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
