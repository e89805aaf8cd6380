use std::future::Future;
use std::time::Duration;

use log::debug;

use crate::{Error, Result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// Bounded retry with a fixed pause between attempts.
///
/// Only transient errors are retried; anything else is returned as-is on the
/// first attempt. When every attempt fails transiently the last error is
/// wrapped in [`Error::RetriesExhausted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_DELAY)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn run<F, Fut, T>(&self, operation: &str, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match attempt_fn().await {
                Ok(val) => return Ok(val),
                Err(e) if e.is_transient() => {
                    if attempt >= self.max_attempts {
                        return Err(Error::RetriesExhausted {
                            operation: operation.to_string(),
                            attempts: attempt,
                            source: Box::new(e),
                        });
                    }
                    debug!(
                        "{operation}: attempt {attempt}/{} failed: {e}, retrying in {:?}",
                        self.max_attempts, self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::ErrorKind;

    fn instant() -> RetryPolicy {
        RetryPolicy::new(3, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_gives_up_after_exactly_max_attempts() {
        let calls = Cell::new(0);
        let result: Result<()> = instant()
            .run("fetch", || {
                calls.set(calls.get() + 1);
                async { Err(Error::Transient("connection reset".into())) }
            })
            .await;

        assert_eq!(calls.get(), 3);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermanentFailure);
        assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_recovers_on_later_attempt() {
        let calls = Cell::new(0);
        let result = instant()
            .run("fetch", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err(Error::Transient("429".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = instant()
            .run("fetch", || {
                calls.set(calls.get() + 1);
                async { Err(Error::CaptionsDisabled(crate::VideoId::new("abcDEFghiJK"))) }
            })
            .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(Error::CaptionsDisabled(_))));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[test]
    fn test_defaults() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts(), 3);
        assert_eq!(p.delay(), Duration::from_secs(2));
    }
}
