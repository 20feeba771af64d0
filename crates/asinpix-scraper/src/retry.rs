//! Retry with exponential back-off and jitter for image downloads.
//!
//! Transient conditions (network timeouts, connection failures, HTTP 429,
//! HTTP 5xx) are retried. Everything else, including 404 and local write
//! failures, is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::DownloadError;

/// Upper bound for a single back-off sleep.
const MAX_DELAY_MS: u64 = 30_000;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a back-off delay.
///
/// Retriable:
/// - [`DownloadError::RateLimited`]: HTTP 429.
/// - [`DownloadError::UnexpectedStatus`] with a 5xx status.
/// - [`DownloadError::Http`]: timeout, connect failure, or an interrupted body.
///
/// Not retriable:
/// - [`DownloadError::NotFound`]: retrying would return the same result.
/// - [`DownloadError::UnexpectedStatus`] with a 4xx status.
/// - [`DownloadError::Write`]: local I/O; the network is not the problem.
pub(crate) fn is_retriable(err: &DownloadError) -> bool {
    match err {
        DownloadError::RateLimited { .. } => true,
        DownloadError::UnexpectedStatus { status, .. } => *status >= 500,
        DownloadError::Http(e) => {
            e.is_timeout()
                || e.is_connect()
                || e.is_body()
                || e.status().is_some_and(|s| s.is_server_error())
        }
        DownloadError::NotFound { .. } | DownloadError::Write { .. } => false,
    }
}

/// Executes `operation` with up to `max_retries` additional attempts on
/// transient errors.
///
/// # Backoff schedule (example with `backoff_base_ms = 500`)
///
/// | Attempt | Sleep before next attempt |
/// |---------|---------------------------|
/// | 0 (initial) | none |
/// | 1 (first retry) | 500 ms × 2⁰ ± 25 % |
/// | 2 (second retry) | 500 ms × 2¹ ± 25 % |
///
/// Each sleep is capped at 30 s. If all retries are exhausted the last error
/// is returned.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, DownloadError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DownloadError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let computed = backoff_base_ms.saturating_mul(1u64 << attempt.min(16));
        let capped = computed.min(MAX_DELAY_MS);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %err,
            "transient download error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited() -> DownloadError {
        DownloadError::RateLimited {
            url: "https://images.example.com/a.jpg".to_owned(),
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, DownloadError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_on_rate_limited_then_succeeds() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(rate_limited())
                } else {
                    Ok::<u32, DownloadError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(1, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, DownloadError>(DownloadError::UnexpectedStatus {
                    status: 503,
                    url: "https://images.example.com/a.jpg".to_owned(),
                })
            }
        })
        .await;
        // max_retries=1 → 2 total attempts
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
        assert!(matches!(
            result,
            Err(DownloadError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn propagates_last_error_after_exhausting_retries() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(2, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, DownloadError>(rate_limited())
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(DownloadError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_not_found() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, DownloadError>(DownloadError::NotFound {
                    url: "https://images.example.com/a.jpg".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(DownloadError::NotFound { .. })));
    }

    #[test]
    fn client_errors_and_write_failures_are_not_retriable() {
        assert!(!is_retriable(&DownloadError::UnexpectedStatus {
            status: 403,
            url: String::new(),
        }));
        assert!(!is_retriable(&DownloadError::Write {
            path: "/tmp/x.jpg".to_owned(),
            source: std::io::Error::other("disk full"),
        }));
    }
}
