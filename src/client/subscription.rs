use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::time::Instant;

use crate::error::UpstreamError;
use crate::events::stream::StreamEvent;
use crate::utils::retry::backoff_delay;

const RECONNECT_BASE_DELAY: Duration = Duration::from_millis(1_000);
// Caps the reconnect backoff around half a minute.
const RECONNECT_MAX_EXPONENT: u32 = 5;

/// Incremental decoder for `text/event-stream` framing: frames are blank-line
/// delimited, payload lines carry a `data:` prefix, multi-line payloads join
/// with a newline.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        SseDecoder::default()
    }

    /// Feed one raw transport chunk; returns every completed data payload.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);

        let mut payloads = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let frame: String = self.buffer.drain(..end + 2).collect();
            let data: Vec<&str> = frame
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
                .collect();
            if !data.is_empty() {
                payloads.push(data.join("\n"));
            }
        }
        payloads
    }
}

/// One decoded item off the wire. Malformed payloads are surfaced rather
/// than dropped so the view can show its "failed to process" notice.
#[derive(Debug)]
pub enum StreamItem {
    Event(StreamEvent),
    Malformed,
}

/// An open streaming subscription: the consumer half of one publisher.
pub struct Subscription {
    decoder: SseDecoder,
    pending: VecDeque<StreamItem>,
    body: BoxStream<'static, reqwest::Result<Bytes>>,
}

impl Subscription {
    pub async fn open(http: &reqwest::Client, url: &str) -> Result<Self, UpstreamError> {
        let response = http
            .get(url)
            .send()
            .await
            .map_err(|error| UpstreamError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        Ok(Subscription {
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            body: response.bytes_stream().boxed(),
        })
    }

    /// Next decoded item, or `None` once the transport has closed — any
    /// close, clean or not, means the subscription must be rebuilt.
    pub async fn next_event(&mut self) -> Option<StreamItem> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }

            match self.body.next().await {
                Some(Ok(chunk)) => {
                    let text = String::from_utf8_lossy(&chunk);
                    for payload in self.decoder.feed(&text) {
                        let item = match serde_json::from_str::<StreamEvent>(&payload) {
                            Ok(event) => StreamItem::Event(event),
                            Err(_) => StreamItem::Malformed,
                        };
                        self.pending.push_back(item);
                    }
                }
                Some(Err(error)) => {
                    tracing::debug!(%error, "stream transport error");
                    return None;
                }
                None => return None,
            }
        }
    }
}

/// What the drive loop needs from a subscribed view. Implemented by both
/// reconcilers; the transport stays ignorant of which view it feeds.
pub trait EventSink {
    fn apply_event(&mut self, event: StreamEvent);
    fn apply_malformed(&mut self);
    fn on_stream_interrupted(&mut self);
    fn toast_deadline(&self) -> Option<Instant>;
    fn expire_toast(&mut self, now: Instant);
    /// False once the view navigated away or unmounted.
    fn active(&self) -> bool;
}

/// Consume a subscription for as long as the sink is active, rebuilding it
/// with backoff whenever the connection closes abnormally. Also owns the
/// toast auto-dismiss timer, since the sink is single-threaded and only
/// driven from here.
pub async fn drive<S: EventSink>(sink: &mut S, http: &reqwest::Client, url: &str) {
    let mut reconnect_attempt: u32 = 0;

    while sink.active() {
        match Subscription::open(http, url).await {
            Ok(mut subscription) => {
                reconnect_attempt = 0;
                loop {
                    if !sink.active() {
                        return;
                    }
                    tokio::select! {
                        item = subscription.next_event() => match item {
                            Some(StreamItem::Event(event)) => sink.apply_event(event),
                            Some(StreamItem::Malformed) => sink.apply_malformed(),
                            None => break,
                        },
                        _ = toast_timer(sink.toast_deadline()) => {
                            sink.expire_toast(Instant::now());
                        }
                    }
                }
            }
            Err(error) => {
                tracing::debug!(%error, "failed to open stream subscription");
            }
        }

        if !sink.active() {
            return;
        }
        sink.on_stream_interrupted();
        tokio::time::sleep(backoff_delay(
            RECONNECT_BASE_DELAY,
            reconnect_attempt.min(RECONNECT_MAX_EXPONENT),
        ))
        .await;
        reconnect_attempt += 1;
    }
}

async fn toast_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
