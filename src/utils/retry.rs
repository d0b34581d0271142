use std::future::Future;
use std::time::Duration;

/// Options for [`with_retry`]. Defaults mirror the dashboard's fetch policy:
/// three total attempts starting from a one-second backoff.
pub struct RetryOptions<'a, E> {
    /// Total attempts, including the first. Never less than one.
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Invoked before each wait with the upcoming attempt number (1-based)
    /// and the error that caused it.
    pub on_retry: Option<&'a mut (dyn FnMut(u32, &E) + Send)>,
}

impl<E> Default for RetryOptions<'_, E> {
    fn default() -> Self {
        RetryOptions {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            on_retry: None,
        }
    }
}

/// Run `op`, retrying on failure with exponential backoff and full jitter.
///
/// The delay before retry `k` (1-based) is
/// `base_delay * 2^(k-1) * (0.5 + random[0,1))`. The final failure
/// propagates the original error unmodified; nothing is wrapped or
/// swallowed, and the operation never runs more than `max_retries` times.
pub async fn with_retry<T, E, F, Fut>(
    mut op: F,
    mut options: RetryOptions<'_, E>,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = options.max_retries.max(1);
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                attempt += 1;
                if attempt >= attempts {
                    return Err(error);
                }
                if let Some(on_retry) = options.on_retry.as_deref_mut() {
                    on_retry(attempt, &error);
                }
                tokio::time::sleep(backoff_delay(options.base_delay, attempt - 1)).await;
            }
        }
    }
}

/// Exponential backoff with full jitter in the 50-150% band.
pub fn backoff_delay(base: Duration, exponent: u32) -> Duration {
    let scale = 2_f64.powi(exponent.min(31) as i32);
    let jitter = 0.5 + rand::random::<f64>();
    base.mul_f64(scale * jitter)
}
