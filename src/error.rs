use chrono::{DateTime, Utc};
use thiserror::Error;

/// How a failure impacts the view: `Major` blocks it (no usable data),
/// `Minor` is advisory (stale-but-usable data, shown as a transient notice).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorSeverity {
    Minor,
    Major,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Upstream rejected or malformed the request: missing credential,
    /// non-2xx status, undecodable payload.
    Api,
    /// Connectivity, offline, or transport-level timeout.
    Network,
    /// Caller-supplied input rejected.
    Validation,
    /// Operation exceeded a deadline.
    Timeout,
    Unknown,
}

/// The normalized failure representation shown to users.
///
/// Constructed exclusively by [`classify`]; the rest of the codebase never
/// assembles one by hand. A view scope holds at most one current `AppError`,
/// replaced or cleared by the next successful operation or a dismissal.
#[derive(Clone, Debug, PartialEq)]
pub struct AppError {
    /// Internal diagnostic, never rendered.
    pub message: String,
    /// Display-ready text.
    pub user_message: String,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub timestamp: DateTime<Utc>,
    pub status_code: Option<u16>,
    pub retry_count: Option<u32>,
}

impl AppError {
    pub fn is_blocking(&self) -> bool {
        self.severity == ErrorSeverity::Major
    }
}

/// Map a raw failure into a classified [`AppError`].
///
/// The user message is a deterministic function of (category, message
/// content, status code). Severity is the caller's call, based on whether
/// usable data is already on screen, with one policy exception: rate-limit
/// (429) and not-found (404) API failures are always `Minor`. Rate limiting
/// is self-correcting and a missing resource is handled by navigation, so
/// neither should black out a view on its own.
pub fn classify(
    message: impl Into<String>,
    category: ErrorCategory,
    severity: ErrorSeverity,
    status_code: Option<u16>,
    retry_count: Option<u32>,
) -> AppError {
    let message = message.into();
    let (user_message, severity) =
        translate(&message, category, severity, status_code, retry_count);

    AppError {
        message,
        user_message,
        category,
        severity,
        timestamp: Utc::now(),
        status_code,
        retry_count,
    }
}

/// Classify a failure coming out of the upstream client. Transport-level
/// failures (offline, refused, timed out) are `Network`; everything the
/// upstream itself produced is `Api`.
pub fn classify_upstream(
    error: &UpstreamError,
    severity: ErrorSeverity,
    retry_count: Option<u32>,
) -> AppError {
    let category = match error {
        UpstreamError::Transport(_) => ErrorCategory::Network,
        _ => ErrorCategory::Api,
    };
    classify(
        error.to_string(),
        category,
        severity,
        error.status_code(),
        retry_count,
    )
}

fn translate(
    message: &str,
    category: ErrorCategory,
    severity: ErrorSeverity,
    status_code: Option<u16>,
    retry_count: Option<u32>,
) -> (String, ErrorSeverity) {
    match category {
        ErrorCategory::Api => {
            if status_code == Some(429) || message.contains("429") {
                return (
                    "We're experiencing high traffic. Please try again in a moment."
                        .to_string(),
                    ErrorSeverity::Minor,
                );
            }
            if status_code == Some(404) || message.contains("404") {
                return (
                    "The requested cryptocurrency information could not be found."
                        .to_string(),
                    ErrorSeverity::Minor,
                );
            }
            if let Some(attempt) = retry_count {
                return (
                    format!("Unable to fetch cryptocurrency data. Retrying... (Attempt {attempt})"),
                    severity,
                );
            }
            (
                "Unable to fetch cryptocurrency data. Please try again later.".to_string(),
                severity,
            )
        }
        ErrorCategory::Network => {
            if message.contains("timeout") {
                return (
                    "The request timed out. Please check your connection and try again."
                        .to_string(),
                    severity,
                );
            }
            if message.contains("offline") {
                return (
                    "You appear to be offline. Please check your internet connection."
                        .to_string(),
                    severity,
                );
            }
            if let Some(attempt) = retry_count {
                return (
                    format!("Connection issues detected. Retrying... (Attempt {attempt})"),
                    severity,
                );
            }
            (
                "Please check your internet connection and try again.".to_string(),
                severity,
            )
        }
        ErrorCategory::Timeout => {
            if let Some(attempt) = retry_count {
                return (
                    format!("Request timed out. Retrying... (Attempt {attempt})"),
                    severity,
                );
            }
            (
                "The request took too long to complete. Please try again.".to_string(),
                severity,
            )
        }
        ErrorCategory::Validation => (
            "The requested operation could not be completed. Please check your input."
                .to_string(),
            severity,
        ),
        ErrorCategory::Unknown => {
            if let Some(attempt) = retry_count {
                return (
                    format!("An error occurred. Retrying... (Attempt {attempt})"),
                    severity,
                );
            }
            (
                "An unexpected error occurred. Please try again later.".to_string(),
                severity,
            )
        }
    }
}

/// Failures produced by the upstream pricing client. No retry logic lives at
/// this layer; callers retry, or the publisher simply tries again next tick.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream API credential is not configured")]
    MissingCredential,

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to decode upstream payload: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            UpstreamError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(pub String);
