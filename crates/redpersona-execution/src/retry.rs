//! Bounded retry of inference calls with exponential backoff.
//!
//! Every attempt is raced against the per-call timeout and the run's
//! cancellation token. Backoff sleeps are cancellable too, so a cancelled
//! run never waits out a backoff.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use redpersona_core::agent::InferenceError;
use redpersona_core::config::PipelineConfig;

const BACKOFF_MULTIPLIER: u32 = 2;

/// Retry budget and pacing for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub call_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
            call_timeout: config.call_timeout(),
        }
    }

    /// Total attempts allowed, first call included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Sleep before attempt `attempt + 1`, given the error of `attempt`.
    ///
    /// A delay suggested by the capability wins over the exponential
    /// schedule; both are capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32, error: &InferenceError) -> Duration {
        let delay = match error.retry_after() {
            Some(suggested) => suggested,
            None => {
                let exponent = attempt.saturating_sub(1).min(16);
                self.initial_backoff
                    .saturating_mul(BACKOFF_MULTIPLIER.saturating_pow(exponent))
            }
        };
        delay.min(self.max_backoff)
    }
}

/// Why a retried call produced no value.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryFailure {
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, last_error: InferenceError },
    /// The capability refused the request; no further attempts were made
    Rejected { attempts: u32, error: InferenceError },
    /// The cancellation token fired
    Cancelled { attempts: u32 },
}

impl RetryFailure {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryFailure::Exhausted { attempts, .. }
            | RetryFailure::Rejected { attempts, .. }
            | RetryFailure::Cancelled { attempts } => *attempts,
        }
    }
}

/// Runs `operation` until it succeeds, fails permanently, runs out of
/// attempts or is cancelled.
///
/// `operation` receives the 1-based attempt number. On success the value is
/// returned together with the number of attempts made.
pub async fn call_with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<(T, u32), RetryFailure>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, InferenceError>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryFailure::Cancelled { attempts: attempt });
        }

        attempt += 1;
        let call = tokio::time::timeout(policy.call_timeout, operation(attempt));
        let output = tokio::select! {
            _ = cancel.cancelled() => return Err(RetryFailure::Cancelled { attempts: attempt }),
            res = call => res.unwrap_or(Err(InferenceError::Timeout(policy.call_timeout))),
        };

        let error = match output {
            Ok(value) => return Ok((value, attempt)),
            Err(error) => error,
        };

        if !error.is_retryable() {
            return Err(RetryFailure::Rejected {
                attempts: attempt,
                error,
            });
        }

        if attempt >= max_attempts {
            return Err(RetryFailure::Exhausted {
                attempts: attempt,
                last_error: error,
            });
        }

        let delay = policy.backoff(attempt, &error);
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Inference attempt failed, retrying"
        );

        if wait_with_cancel(cancel, delay).await.is_err() {
            return Err(RetryFailure::Cancelled { attempts: attempt });
        }
    }
}

async fn wait_with_cancel(cancel: &CancellationToken, duration: Duration) -> Result<(), ()> {
    if duration.is_zero() {
        return Ok(());
    }

    tokio::select! {
        _ = tokio::time::sleep(duration) => Ok(()),
        _ = cancel.cancelled() => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            call_timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_millis(4_000),
            call_timeout: Duration::from_secs(60),
        };
        let error = InferenceError::transient("503");

        assert_eq!(policy.backoff(1, &error), Duration::from_millis(500));
        assert_eq!(policy.backoff(2, &error), Duration::from_millis(1_000));
        assert_eq!(policy.backoff(3, &error), Duration::from_millis(2_000));
        assert_eq!(policy.backoff(5, &error), Duration::from_millis(4_000));
    }

    #[test]
    fn test_retry_after_is_honoured_but_capped() {
        let policy = RetryPolicy::from_config(&PipelineConfig::default());
        let short = InferenceError::Transient {
            message: "429".into(),
            retry_after: Some(Duration::from_millis(1_500)),
        };
        let long = InferenceError::Transient {
            message: "429".into(),
            retry_after: Some(Duration::from_secs(120)),
        };

        assert_eq!(policy.backoff(1, &short), Duration::from_millis(1_500));
        assert_eq!(policy.backoff(1, &long), Duration::from_millis(4_000));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let cancel = CancellationToken::new();

        let result = call_with_retry(&fast_policy(2), &cancel, |attempt| async move {
            if attempt < 3 {
                Err(InferenceError::transient("busy"))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result, Ok(("done", 3)));
    }

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<((), u32), _> = call_with_retry(&fast_policy(2), &cancel, |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(InferenceError::Malformed("empty".into()))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(RetryFailure::Exhausted { attempts: 3, .. })));
    }

    #[tokio::test]
    async fn test_permanent_error_stops_immediately() {
        let cancel = CancellationToken::new();

        let result: Result<((), u32), _> = call_with_retry(&fast_policy(5), &cancel, |_| async {
            Err(InferenceError::Permanent("invalid api key".into()))
        })
        .await;

        assert!(matches!(result, Err(RetryFailure::Rejected { attempts: 1, .. })));
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let cancel = CancellationToken::new();
        let policy = RetryPolicy {
            call_timeout: Duration::from_millis(20),
            ..fast_policy(1)
        };

        let result: Result<((), u32), _> = call_with_retry(&policy, &cancel, |_| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        match result {
            Err(RetryFailure::Exhausted { attempts, last_error }) => {
                assert_eq!(attempts, 2);
                assert_eq!(last_error, InferenceError::Timeout(Duration::from_millis(20)));
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<((), u32), _> =
            call_with_retry(&fast_policy(2), &cancel, |_| async { Ok(()) }).await;

        assert_eq!(result, Err(RetryFailure::Cancelled { attempts: 0 }));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_inflight_call() {
        let cancel = CancellationToken::new();
        let policy = RetryPolicy {
            call_timeout: Duration::from_secs(30),
            ..fast_policy(0)
        };
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result: Result<((), u32), _> = call_with_retry(&policy, &cancel, |_| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })
        .await;

        assert_eq!(result, Err(RetryFailure::Cancelled { attempts: 1 }));
    }
}
