//! Explicit waits.
//!
//! A [`WaitPolicy`] is a (timeout, poll interval) pair. [`WaitPolicy::until`]
//! polls a probe until it yields a value, the probe fails with a
//! non-transient error, or the timeout elapses. The probe always runs at
//! least once, and a timeout is only reported after the full bound has
//! passed on the wall clock.

use crate::result::{UiError, UiResult};
use std::time::{Duration, Instant};

/// Default timeout for element waits (10 seconds)
pub const DEFAULT_ELEMENT_TIMEOUT_MS: u64 = 10_000;

/// Default timeout for page-level waits (30 seconds)
pub const DEFAULT_PAGE_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Timeout and polling interval for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    timeout: Duration,
    poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_ELEMENT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl WaitPolicy {
    /// Policy with the given timeout and the default poll interval
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Timeout in milliseconds
    #[must_use]
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Timeout in seconds
    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Same poll interval, different timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Timeout in milliseconds
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Poll interval
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll `probe` until it returns `Ok(Some(_))`.
    ///
    /// `Ok(None)` and transient errors (`NotFound`, `Stale`) keep polling;
    /// any other error is returned immediately. On expiry the last transient
    /// error is attached to the `Timeout`.
    pub fn until<T, F>(&self, waited_for: impl FnOnce() -> String, probe: F) -> UiResult<T>
    where
        F: FnMut() -> UiResult<Option<T>>,
    {
        self.until_retrying(waited_for, UiError::is_transient, probe)
    }

    /// Like [`WaitPolicy::until`], but only errors accepted by `retry` keep
    /// polling.
    pub fn until_retrying<T, F, R>(
        &self,
        waited_for: impl FnOnce() -> String,
        retry: R,
        mut probe: F,
    ) -> UiResult<T>
    where
        F: FnMut() -> UiResult<Option<T>>,
        R: Fn(&UiError) -> bool,
    {
        let start = Instant::now();
        let mut last_error = None;

        loop {
            match probe() {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(err) if retry(&err) => last_error = Some(Box::new(err)),
                Err(err) => return Err(err),
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                return Err(UiError::Timeout {
                    waited_for: waited_for(),
                    timeout_ms: self.timeout_ms(),
                    last_error,
                });
            }
            std::thread::sleep(self.poll_interval.min(self.timeout - elapsed));
        }
    }

    /// Poll a boolean predicate
    pub fn until_true<F>(&self, waited_for: impl FnOnce() -> String, mut predicate: F) -> UiResult<()>
    where
        F: FnMut() -> UiResult<bool>,
    {
        self.until(waited_for, || Ok(predicate()?.then_some(())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    mod wait_policy_tests {
        use super::*;

        #[test]
        fn test_default() {
            let policy = WaitPolicy::default();
            assert_eq!(policy.timeout_ms(), DEFAULT_ELEMENT_TIMEOUT_MS);
            assert_eq!(
                policy.poll_interval(),
                Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
            );
        }

        #[test]
        fn test_builders() {
            let policy = WaitPolicy::from_secs(30).with_poll_interval(Duration::from_millis(10));
            assert_eq!(policy.timeout(), Duration::from_secs(30));
            assert_eq!(policy.poll_interval(), Duration::from_millis(10));
            assert_eq!(WaitPolicy::from_millis(5000).timeout_ms(), 5000);
            assert_eq!(
                policy.with_timeout(Duration::from_secs(1)).poll_interval(),
                Duration::from_millis(10)
            );
        }
    }

    mod until_tests {
        use super::*;

        fn fast(ms: u64) -> WaitPolicy {
            WaitPolicy::from_millis(ms).with_poll_interval(Duration::from_millis(5))
        }

        #[test]
        fn test_returns_first_value() {
            let calls = Cell::new(0);
            let value = fast(1000)
                .until(String::new, || {
                    calls.set(calls.get() + 1);
                    Ok((calls.get() == 3).then_some("ready"))
                })
                .unwrap();
            assert_eq!(value, "ready");
            assert_eq!(calls.get(), 3);
        }

        #[test]
        fn test_times_out_after_full_bound() {
            let start = Instant::now();
            let err = fast(120)
                .until_true(|| "never".to_string(), || Ok(false))
                .unwrap_err();
            assert!(start.elapsed() >= Duration::from_millis(120));
            match err {
                UiError::Timeout {
                    waited_for,
                    timeout_ms,
                    last_error,
                } => {
                    assert_eq!(waited_for, "never");
                    assert_eq!(timeout_ms, 120);
                    assert!(last_error.is_none());
                }
                other => panic!("expected timeout, got {other:?}"),
            }
        }

        #[test]
        fn test_zero_timeout_still_probes_once() {
            let calls = Cell::new(0);
            let result = WaitPolicy::from_millis(0).until_true(String::new, || {
                calls.set(calls.get() + 1);
                Ok(true)
            });
            assert!(result.is_ok());
            assert_eq!(calls.get(), 1);
        }

        #[test]
        fn test_transient_errors_keep_polling() {
            let calls = Cell::new(0);
            let result = fast(1000).until_true(String::new, || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err(UiError::Stale {
                        element: "row".into(),
                    })
                } else {
                    Ok(true)
                }
            });
            assert!(result.is_ok());
        }

        #[test]
        fn test_last_transient_error_attached() {
            let err = fast(30)
                .until_true(String::new, || {
                    Err(UiError::Stale {
                        element: "row".into(),
                    })
                })
                .unwrap_err();
            match err {
                UiError::Timeout {
                    last_error: Some(inner),
                    ..
                } => assert!(inner.is_stale()),
                other => panic!("expected timeout with cause, got {other:?}"),
            }
        }

        #[test]
        fn test_until_retrying_stops_on_rejected_error() {
            let calls = Cell::new(0);
            let start = Instant::now();
            let err = fast(1000)
                .until_retrying(
                    String::new,
                    |err: &UiError| matches!(err, UiError::NotFound { .. }),
                    || -> UiResult<Option<()>> {
                        calls.set(calls.get() + 1);
                        Err(UiError::Stale {
                            element: "row".into(),
                        })
                    },
                )
                .unwrap_err();
            assert_eq!(calls.get(), 1);
            assert!(err.is_stale());
            assert!(start.elapsed() < Duration::from_millis(500));
        }

        #[test]
        fn test_fatal_error_stops_immediately() {
            let calls = Cell::new(0);
            let err = fast(1000)
                .until_true(String::new, || {
                    calls.set(calls.get() + 1);
                    Err(UiError::driver("session closed"))
                })
                .unwrap_err();
            assert_eq!(calls.get(), 1);
            assert!(matches!(err, UiError::Driver { .. }));
        }
    }
}
