//! Bounded retry for transient I/O failures.
//!
//! Extraction and hashing wrap their reads in this combinator instead of
//! scattering ad-hoc retry loops per call site.

use std::time::Duration;

/// Attempt count and fixed delay between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// A single attempt, no delay. Useful in tests.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Run `op`, retrying up to the policy's attempt count on `Err`.
///
/// Each failed attempt is logged with the operation label and attempt
/// number so failures can be diagnosed without re-running.
pub fn retry_io<T>(
    policy: &RetryPolicy,
    what: &str,
    mut op: impl FnMut() -> std::io::Result<T>,
) -> std::io::Result<T> {
    let mut last_err = None;
    for attempt in 1..=policy.attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt < policy.attempts {
                    log::warn!(
                        "{what}: attempt {attempt}/{} failed ({e}), retrying",
                        policy.attempts
                    );
                    std::thread::sleep(policy.delay);
                } else {
                    log::warn!(
                        "{what}: attempt {attempt}/{} failed ({e}), giving up",
                        policy.attempts
                    );
                }
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| std::io::Error::other("retry with zero attempts")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result = retry_io(&RetryPolicy::default(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retries_then_succeeds() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let result = retry_io(&policy, "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(std::io::Error::other("transient"))
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let result: std::io::Result<()> = retry_io(&policy, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(std::io::Error::other("persistent"))
        });
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
