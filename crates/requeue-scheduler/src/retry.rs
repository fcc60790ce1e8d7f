//! Optimistic-lock retry combinator.

use requeue_config::RetryPolicy;
use requeue_core::Error;
use std::future::Future;
use tracing::debug;

/// Result of running an operation under [`retry_lock`].
#[derive(Debug)]
pub enum LockOutcome<T> {
    /// The operation succeeded on attempt `attempts`.
    Applied { value: T, attempts: u32 },
    /// Every attempt hit a version conflict.
    Exhausted { attempts: u32, last_error: Error },
    /// The operation failed for a reason retrying cannot fix.
    Failed { attempts: u32, error: Error },
}

impl<T> LockOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            LockOutcome::Applied { attempts, .. }
            | LockOutcome::Exhausted { attempts, .. }
            | LockOutcome::Failed { attempts, .. } => *attempts,
        }
    }
}

/// Run `op` until it succeeds, fails with something other than a version
/// conflict, or `policy.max_attempts` is reached. Each attempt must re-read
/// the state it writes, so a retry works on fresh data.
pub async fn retry_lock<T, F, Fut>(policy: &RetryPolicy, name: &str, mut op: F) -> LockOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => {
                return LockOutcome::Applied {
                    value,
                    attempts: attempt,
                };
            }
            Err(e) if e.is_conflict() => {
                if attempt >= max_attempts {
                    return LockOutcome::Exhausted {
                        attempts: attempt,
                        last_error: e,
                    };
                }
                let delay = policy.delay_after(attempt);
                debug!(name, attempt, ?delay, error = %e, "Lock conflict, retrying");
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(e) => {
                return LockOutcome::Failed {
                    attempts: attempt,
                    error: e,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use requeue_core::ResourceId;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{Duration, Instant};

    fn conflict() -> Error {
        Error::StaleVersion {
            job: ResourceId::new(),
            expected: 0,
            actual: 1,
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_conflicts() {
        let calls = &AtomicU32::new(0);
        let outcome = retry_lock(&RetryPolicy::immediate(5), "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(conflict())
            } else {
                Ok("done")
            }
        })
        .await;

        assert!(matches!(
            outcome,
            LockOutcome::Applied {
                value: "done",
                attempts: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::immediate(3);
        let outcome: LockOutcome<()> = retry_lock(&policy, "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(conflict())
        })
        .await;

        assert!(matches!(outcome, LockOutcome::Exhausted { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::immediate(5);
        let outcome: LockOutcome<()> = retry_lock(&policy, "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::NotFound("job".into()))
        })
        .await;

        assert!(matches!(
            outcome,
            LockOutcome::Failed {
                attempts: 1,
                error: Error::NotFound(_)
            }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let outcome = retry_lock(&RetryPolicy::immediate(0), "test", || async { Ok(7) }).await;
        assert_eq!(outcome.attempts(), 1);
    }

    #[tokio::test]
    async fn test_backoff_sleeps_between_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(2),
            max_delay: Duration::from_millis(50),
        };
        let start = Instant::now();
        let outcome: LockOutcome<()> =
            retry_lock(&policy, "test", || async { Err(conflict()) }).await;

        assert!(matches!(outcome, LockOutcome::Exhausted { attempts: 3, .. }));
        // 2ms after the first attempt, 4ms after the second
        assert!(start.elapsed() >= Duration::from_millis(6));
    }
}
