//! Polling until a resource reaches a state.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{trace, warn};
use triton_cloudapi::{Error, Result};

/// Default delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How to wait for an asynchronous server-side action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Delay between polls.
    pub interval: Duration,
    /// Give up after this long. `None` waits indefinitely; zero allows
    /// exactly one poll.
    pub timeout: Option<Duration>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl WaitOptions {
    /// Waits at most `timeout`.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    /// Overrides the poll interval.
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Repeats a fetch until a predicate holds or the deadline passes.
///
/// Polls run one at a time. Transient failures (gateway errors, transport
/// timeouts) are logged and polling continues; any other failure ends the
/// wait.
#[derive(Debug, Clone, Copy)]
pub struct PollWaiter {
    options: WaitOptions,
}

impl PollWaiter {
    /// Creates a waiter.
    #[must_use]
    pub const fn new(options: WaitOptions) -> Self {
        Self { options }
    }

    /// The waiter's options.
    #[must_use]
    pub const fn options(&self) -> WaitOptions {
        self.options
    }

    /// Polls until `done` accepts a value.
    ///
    /// `what` names the awaited condition in logs and in the `Timeout` error.
    pub async fn wait<T, F, Fut, P>(&self, what: &str, mut fetch: F, mut done: P) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: FnMut(&T) -> bool,
    {
        let started = Instant::now();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match fetch().await {
                Ok(value) if done(&value) => {
                    trace!(what, attempt, "wait satisfied");
                    return Ok(value);
                }
                Ok(_) => trace!(what, attempt, "wait not yet satisfied"),
                Err(e) if e.is_transient() => {
                    warn!(what, attempt, error = %e, "transient error while waiting, will retry");
                }
                Err(e) => return Err(e),
            }

            let elapsed = started.elapsed();
            if let Some(timeout) = self.options.timeout {
                if elapsed >= timeout {
                    return Err(Error::Timeout {
                        message: format!("waiting for {what}"),
                        elapsed_secs: elapsed.as_secs_f64(),
                    });
                }
                let remaining = timeout.saturating_sub(elapsed);
                tokio::time::sleep(self.options.interval.min(remaining)).await;
            } else {
                tokio::time::sleep(self.options.interval).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(timeout: Option<Duration>) -> PollWaiter {
        PollWaiter::new(WaitOptions {
            interval: Duration::from_millis(5),
            timeout,
        })
    }

    #[tokio::test]
    async fn test_wait_until_predicate() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let value = fast(Some(Duration::from_secs(5)))
            .wait(
                "three",
                move || async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) },
                |n| *n == 3,
            )
            .await
            .expect("satisfied");
        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_timeout_polls_once() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = fast(Some(Duration::ZERO))
            .wait(
                "never",
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok("running")
                },
                |s| *s == "stopped",
            )
            .await
            .expect_err("timeout");
        assert_eq!(err.name(), "TimeoutError");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_keep_polling() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let value = fast(Some(Duration::from_secs(5)))
            .wait(
                "recovery",
                move || async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(Error::transport("timed out", true))
                    } else {
                        Ok(true)
                    }
                },
                |ok| *ok,
            )
            .await
            .expect("recovered");
        assert!(value);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_errors_end_the_wait() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = fast(None)
            .wait(
                "failure",
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<bool, _>(Error::usage("nope"))
                },
                |ok| *ok,
            )
            .await
            .expect_err("fails");
        assert_eq!(err.name(), "UsageError");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_options() {
        let opts = WaitOptions::with_timeout(Duration::from_secs(60)).interval(Duration::from_millis(1));
        assert_eq!(opts.timeout, Some(Duration::from_secs(60)));
        assert_eq!(opts.interval, Duration::from_millis(1));
        assert_eq!(WaitOptions::default().interval, Duration::from_secs(2));
    }
}
