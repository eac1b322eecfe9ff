//! Transient-failure retries for calls to the search backend.
//!
//! Timeouts, refused connections, 5xx and 429 are retried with exponential
//! back-off and jitter. A 4xx or a body that does not decode fails at once.

use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;

/// Upper bound on a single back-off sleep, before jitter.
const MAX_BACKOFF_MS: u64 = 10_000;

/// Whether `err` may go away if the same request is sent again.
pub(crate) fn is_retriable(err: &ClientError) -> bool {
    match err {
        ClientError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ClientError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        ClientError::Deserialize { .. } | ClientError::InvalidBaseUrl { .. } => false,
    }
}

/// Sleep before retry number `retry` (1-based), without jitter:
/// `base_ms * 2^(retry - 1)`, capped at [`MAX_BACKOFF_MS`].
fn backoff_ms(retry: u32, base_ms: u64) -> u64 {
    let exponent = retry.saturating_sub(1).min(16);
    base_ms.saturating_mul(1u64 << exponent).min(MAX_BACKOFF_MS)
}

/// Scales `ms` by a random factor in `[0.75, 1.25)`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn jittered(ms: u64) -> u64 {
    let factor = 0.75 + rand::random::<f64>() * 0.5;
    (ms as f64 * factor) as u64
}

/// Runs `request`, retrying retriable failures up to `max_retries` extra times.
///
/// With `base_ms = 500` the sleeps are roughly 500 ms, 1 s, 2 s, ... (±25 %),
/// never more than 12.5 s. The last error is returned once retries run out.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    base_ms: u64,
    mut request: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut retries = 0u32;
    loop {
        let err = match request().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if retries >= max_retries || !is_retriable(&err) {
            return Err(err);
        }
        retries += 1;

        let delay_ms = jittered(backoff_ms(retries, base_ms));
        tracing::warn!(
            retry = retries,
            max_retries,
            delay_ms,
            error = %err,
            "search backend unavailable, retrying"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use super::*;

    fn status(code: u16) -> ClientError {
        ClientError::UnexpectedStatus {
            status: code,
            url: "http://127.0.0.1:8000/api/search?q=lamp&ctry=CA".to_owned(),
        }
    }

    fn bad_body() -> ClientError {
        ClientError::Deserialize {
            context: "search(q=lamp, ctry=CA)".to_owned(),
            source: serde_json::from_str::<Vec<u8>>("{").unwrap_err(),
        }
    }

    /// Replays `script` one entry per call and counts the calls.
    async fn replay(
        max_retries: u32,
        script: Vec<Result<&'static str, ClientError>>,
    ) -> (Result<&'static str, ClientError>, u32) {
        let script = RefCell::new(VecDeque::from(script));
        let calls = Cell::new(0u32);
        let result = retry_with_backoff(max_retries, 0, || {
            calls.set(calls.get() + 1);
            let next = script.borrow_mut().pop_front().unwrap_or(Ok("exhausted"));
            async move { next }
        })
        .await;
        (result, calls.get())
    }

    #[test]
    fn server_errors_and_rate_limits_are_retriable() {
        for code in [500, 502, 503, 429] {
            assert!(is_retriable(&status(code)), "{code} should be retriable");
        }
    }

    #[test]
    fn client_errors_and_bad_bodies_are_final() {
        for code in [400, 401, 404, 422] {
            assert!(!is_retriable(&status(code)), "{code} should be final");
        }
        assert!(!is_retriable(&bad_body()));
        assert!(!is_retriable(&ClientError::InvalidBaseUrl {
            base_url: "nope".to_owned(),
            reason: "relative URL without a base".to_owned(),
        }));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_ms(1, 500), 500);
        assert_eq!(backoff_ms(2, 500), 1_000);
        assert_eq!(backoff_ms(3, 500), 2_000);
        assert_eq!(backoff_ms(10, 500), MAX_BACKOFF_MS);
        assert_eq!(backoff_ms(40, u64::MAX), MAX_BACKOFF_MS);
        assert_eq!(backoff_ms(3, 0), 0);
    }

    #[test]
    fn jitter_stays_within_a_quarter() {
        for _ in 0..100 {
            let ms = jittered(1_000);
            assert!((750..1_250).contains(&ms), "jittered delay {ms} out of range");
        }
    }

    #[tokio::test]
    async fn first_success_makes_one_call() {
        let (result, calls) = replay(3, vec![Ok("records")]).await;
        assert_eq!(result.unwrap(), "records");
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let (result, calls) = replay(3, vec![Err(status(503)), Err(status(429)), Ok("records")]).await;
        assert_eq!(result.unwrap(), "records");
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn returns_last_error_when_retries_run_out() {
        let (result, calls) =
            replay(2, vec![Err(status(500)), Err(status(502)), Err(status(503))]).await;
        assert_eq!(calls, 3);
        assert!(matches!(
            result,
            Err(ClientError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn final_errors_are_not_retried() {
        let (result, calls) = replay(3, vec![Err(bad_body()), Ok("records")]).await;
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(ClientError::Deserialize { .. })));

        let (result, calls) = replay(3, vec![Err(status(404)), Ok("records")]).await;
        assert_eq!(calls, 1);
        assert!(matches!(
            result,
            Err(ClientError::UnexpectedStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn zero_retries_means_one_attempt() {
        let (result, calls) = replay(0, vec![Err(status(503)), Ok("records")]).await;
        assert_eq!(calls, 1);
        assert!(result.is_err());
    }
}
