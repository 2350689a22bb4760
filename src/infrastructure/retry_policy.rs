//! Retry policy for page fetches
//!
//! Each failure class has its own backoff rule: `base + attempt * per_attempt + U(0, jitter)`
//! seconds. Rate limiting waits longest, transport faults shortest.

#![warn(clippy::all)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Why a fetch attempt failed in a retryable way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureClass {
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    ServerError,
    /// Timeout, connection reset, DNS and other client-side faults
    Transport,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate limited"),
            Self::ServerError => write!(f, "server error"),
            Self::Transport => write!(f, "transport error"),
        }
    }
}

impl FailureClass {
    /// Classify a response status; `None` means the status is not retryable
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            429 => Some(Self::RateLimited),
            500..=599 => Some(Self::ServerError),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackoffRule {
    pub base_seconds: f64,
    pub per_attempt_seconds: f64,
    pub jitter_seconds: f64,
}

impl BackoffRule {
    pub const fn new(base_seconds: f64, per_attempt_seconds: f64, jitter_seconds: f64) -> Self {
        Self {
            base_seconds,
            per_attempt_seconds,
            jitter_seconds,
        }
    }

    /// Deterministic part of the delay for a 1-based attempt
    pub fn floor_seconds(&self, attempt: u32) -> f64 {
        self.base_seconds + f64::from(attempt) * self.per_attempt_seconds
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter = fastrand::f64() * self.jitter_seconds.max(0.0);
        seconds_to_duration(self.floor_seconds(attempt) + jitter)
    }
}

/// Seconds from configuration as a `Duration`. Negative and NaN become zero; values too
/// large to represent saturate instead of panicking.
pub fn seconds_to_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX)
}

/// Attempt budget and per-class backoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub rate_limited: BackoffRule,
    pub server_error: BackoffRule,
    pub transport: BackoffRule,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limited: BackoffRule::new(8.0, 6.0, 4.0),
            server_error: BackoffRule::new(2.0, 2.0, 2.0),
            transport: BackoffRule::new(1.0, 2.0, 2.0),
        }
    }
}

impl RetryPolicy {
    /// Policy that retries without waiting; used by tests
    pub fn immediate(max_attempts: u32) -> Self {
        let zero = BackoffRule::new(0.0, 0.0, 0.0);
        Self {
            max_attempts,
            rate_limited: zero,
            server_error: zero,
            transport: zero,
        }
    }

    pub fn rule_for(&self, class: FailureClass) -> &BackoffRule {
        match class {
            FailureClass::RateLimited => &self.rate_limited,
            FailureClass::ServerError => &self.server_error,
            FailureClass::Transport => &self.transport,
        }
    }

    pub fn backoff_for(&self, class: FailureClass, attempt: u32) -> Duration {
        self.rule_for(class).delay(attempt)
    }

    /// Attempt numbers run from 1 to `max_attempts`; at least one attempt is always made
    pub fn attempts(&self) -> std::ops::RangeInclusive<u32> {
        1..=self.max_attempts.max(1)
    }
}
