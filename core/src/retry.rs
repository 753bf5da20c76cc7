//! Retry policies for failed calls.
//!
//! The client only consults a policy for wire failures (`Transport` and
//! `HttpResponse`). `RetryOnce` is the default: after the first such failure
//! the whole request runs exactly once more, whatever the error and whatever
//! the caller's error predicate said.

use std::fmt;
use std::time::Duration;

use crate::error::ApiError;

/// Decides whether and when a failed attempt is followed by another.
pub trait RetryPolicy: Send + Sync + fmt::Debug {
    /// Upper bound on attempts per call, including the first.
    fn max_attempts(&self) -> u32;

    /// Delay before the next attempt, or `None` to give up.
    ///
    /// `attempt` is the 1-based number of the attempt that just failed and
    /// `handled` is what the caller's error predicate returned for `error`.
    fn next_delay(&self, attempt: u32, error: &ApiError, handled: bool) -> Option<Duration>;
}

/// Always retry once, immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryOnce;

impl RetryPolicy for RetryOnce {
    fn max_attempts(&self) -> u32 {
        2
    }

    fn next_delay(&self, _attempt: u32, _error: &ApiError, _handled: bool) -> Option<Duration> {
        Some(Duration::ZERO)
    }
}

/// Never retry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn max_attempts(&self) -> u32 {
        1
    }

    fn next_delay(&self, _attempt: u32, _error: &ApiError, _handled: bool) -> Option<Duration> {
        None
    }
}

/// Bounded retries with a doubling delay: `base_delay`, `2 * base_delay`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExponentialBackoff {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Retry only when the caller's error predicate accepted the error.
    pub require_handled: bool,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            require_handled: true,
        }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn next_delay(&self, attempt: u32, _error: &ApiError, handled: bool) -> Option<Duration> {
        if self.require_handled && !handled {
            return None;
        }
        let exponent = attempt.saturating_sub(1).min(31);
        Some(self.base_delay.saturating_mul(1u32 << exponent))
    }
}
