use crate::store::contract::BackendError;
use std::{thread, time::Duration};

///
/// RetryPolicy
///
/// Exponential backoff for throttled backend calls. Bounded attempts,
/// never unbounded spin; every other error kind surfaces immediately.
///

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(25);

    /// Policy used by tests: same attempt budget, no real sleeping.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (zero-based): base * 2^attempt.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay: Self::DEFAULT_BASE_DELAY,
        }
    }
}

/// Run a backend call under the policy, retrying only `Throttled`.
pub(crate) fn with_retry<T>(
    policy: RetryPolicy,
    mut op: impl FnMut() -> Result<T, BackendError>,
) -> Result<T, BackendError> {
    let attempts = policy.max_attempts.max(1);

    for attempt in 0..attempts {
        match op() {
            Err(err) if err.is_retryable() && attempt + 1 < attempts => {
                crate::obs::record(crate::obs::MetricsEvent::RetryAttempt);
                let delay = policy.delay(attempt);
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
            other => return other,
        }
    }

    // Loop always returns within max_attempts iterations.
    Err(BackendError::Throttled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn throttled_calls_retry_up_to_the_budget() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = with_retry(RetryPolicy::immediate(), || {
            calls.set(calls.get() + 1);
            Err(BackendError::Throttled)
        });

        assert_eq!(result, Err(BackendError::Throttled));
        assert_eq!(calls.get(), RetryPolicy::DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn a_later_success_stops_the_retry_loop() {
        let calls = Cell::new(0u32);
        let result = with_retry(RetryPolicy::immediate(), || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(BackendError::Throttled)
            } else {
                Ok(42)
            }
        });

        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn non_retryable_errors_surface_immediately() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = with_retry(RetryPolicy::immediate(), || {
            calls.set(calls.get() + 1);
            Err(BackendError::Gone)
        });

        assert_eq!(result, Err(BackendError::Gone));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn delays_grow_exponentially() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(10),
        };

        assert_eq!(policy.delay(0), Duration::from_millis(10));
        assert_eq!(policy.delay(1), Duration::from_millis(20));
        assert_eq!(policy.delay(3), Duration::from_millis(80));
    }
}
