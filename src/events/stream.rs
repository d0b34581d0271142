use serde::{Deserialize, Serialize};

use crate::types::asset::Asset;

/// One streaming update, exactly one variant per event.
///
/// Delivery is best-effort, at-most-current-value: events carry no sequence
/// numbers and are never replayed. A missed event is superseded by the next.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEvent {
    /// Full top-N snapshot, list subscriptions.
    Assets { assets: Vec<Asset> },
    /// Single asset state, detail subscriptions.
    Asset { asset: Asset },
    /// In-band failure. The connection stays open; the next tick may recover.
    Error {
        error: String,
        #[serde(
            rename = "statusCode",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        status_code: Option<u16>,
    },
}

impl StreamEvent {
    pub fn error(message: impl Into<String>, status_code: Option<u16>) -> Self {
        StreamEvent::Error {
            error: message.into(),
            status_code,
        }
    }

    /// Encode as a server-sent-event frame: `data: <json>\n\n`.
    pub fn sse_frame(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => format!("data: {json}\n\n"),
            // Unreachable for these derive-only payloads; emit a well-formed
            // in-band error rather than tearing the connection down.
            Err(_) => "data: {\"error\":\"event serialization failed\"}\n\n".to_string(),
        }
    }
}
