//! Retry policy and error classification.
//!
//! Pure types and functions deciding whether and when a failed generation is
//! retried. The retry loop itself lives in [`crate::invoker`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Hard upper bound on retries per invocation.
pub const MAX_RETRIES: u32 = 1;

/// Upper bound on any retry delay, including server hints.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

/// Classification of a generation failure for retry decisions.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorClass {
    /// Transient failure, safe to retry once.
    Retryable { delay_hint: Option<Duration> },
    /// Rate limited by the capability.
    RateLimit { retry_after: Option<Duration> },
    /// Do not retry.
    Fatal,
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// At most one retry after a fixed delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries allowed. Anything above [`MAX_RETRIES`] is clamped.
    pub max_retries: u32,
    /// Delay before the retry, in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            delay_ms: 500,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay_ms: u64) -> Self {
        Self {
            max_retries: max_retries.min(MAX_RETRIES),
            delay_ms,
        }
    }

    /// Classify an HTTP status code into an [`ErrorClass`].
    pub fn classify_http_status(status: u16) -> ErrorClass {
        match status {
            429 => ErrorClass::RateLimit { retry_after: None },
            408 | 502 | 503 | 504 => ErrorClass::Retryable { delay_hint: None },
            _ if status >= 500 => ErrorClass::Retryable { delay_hint: None },
            _ => ErrorClass::Fatal,
        }
    }

    /// Classify an HTTP status with an optional `Retry-After` value in whole
    /// seconds. The value becomes the delay hint of a retryable class.
    pub fn classify_with_retry_after(status: u16, retry_after_secs: Option<u64>) -> ErrorClass {
        let mut class = Self::classify_http_status(status);
        if let Some(secs) = retry_after_secs {
            match &mut class {
                ErrorClass::RateLimit { retry_after } => {
                    *retry_after = Some(Duration::from_secs(secs));
                }
                ErrorClass::Retryable { delay_hint } => {
                    *delay_hint = Some(Duration::from_secs(secs));
                }
                ErrorClass::Fatal => {}
            }
        }
        class
    }

    /// Classify a [`GenerationError`]. Only transient failures are
    /// retryable; a timeout is never retried because the deadline covers
    /// the whole invocation.
    pub fn classify(error: &GenerationError) -> ErrorClass {
        match error {
            GenerationError::Unavailable(_) => ErrorClass::Retryable { delay_hint: None },
            GenerationError::Status {
                status,
                retry_after_secs,
                ..
            } => Self::classify_with_retry_after(*status, *retry_after_secs),
            GenerationError::Timeout(_)
            | GenerationError::InvalidConfig(_)
            | GenerationError::Malformed(_)
            | GenerationError::Other(_) => ErrorClass::Fatal,
        }
    }

    /// Delay before retry number `attempt` (0-indexed), or `None` when the
    /// retry budget is spent. A server hint replaces the fixed delay but is
    /// capped.
    pub fn next_delay(&self, attempt: u32, class: &ErrorClass) -> Option<Duration> {
        if attempt >= self.max_retries.min(MAX_RETRIES) {
            return None;
        }
        let hint = match class {
            ErrorClass::Retryable { delay_hint } => *delay_hint,
            ErrorClass::RateLimit { retry_after } => *retry_after,
            ErrorClass::Fatal => return None,
        };
        let delay = hint.unwrap_or(Duration::from_millis(self.delay_ms));
        Some(delay.min(MAX_RETRY_DELAY))
    }

    /// Whether a given [`ErrorClass`] should be retried.
    pub fn should_retry(class: &ErrorClass) -> bool {
        matches!(
            class,
            ErrorClass::Retryable { .. } | ErrorClass::RateLimit { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
