//! Cooperative throttling driven by rate-limit response headers
//!
//! After every response the client reads `X-RateLimit-Remaining` and
//! `X-RateLimit-Reset`. When the remaining budget drops to the configured
//! threshold, the caller waits `reset / remaining` seconds before the result
//! is handed back.
//!
//! # Example
//!
//! ```rust
//! use apiwrap_core::rate_limit::{RateLimitStatus, ThrottleConfig};
//! use std::time::Duration;
//!
//! let status = RateLimitStatus::from_headers(Some("50"), Some("100"));
//! let delay = ThrottleConfig::default().delay_for(&status);
//! assert_eq!(delay, Some(Duration::from_secs(2)));
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Header carrying the number of requests left in the current window
pub const REMAINING_HEADER: &str = "X-RateLimit-Remaining";

/// Header carrying the reset value used for the back-off
pub const RESET_HEADER: &str = "X-RateLimit-Reset";

/// Remaining-request count at or below which the client backs off
pub const DEFAULT_THRESHOLD: i64 = 100;

/// Throttle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Whether rate-limit headers are honoured at all
    pub enabled: bool,
    /// Remaining-request threshold that triggers a wait
    pub threshold: i64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ThrottleConfig {
    /// Throttling switched off
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Throttling with a custom threshold
    #[must_use]
    pub fn with_threshold(threshold: i64) -> Self {
        Self {
            enabled: true,
            threshold,
        }
    }

    /// How long to wait for the given status, if at all.
    ///
    /// A non-positive remaining count waits the whole reset value.
    #[must_use]
    pub fn delay_for(&self, status: &RateLimitStatus) -> Option<Duration> {
        if !self.enabled || status.remaining > self.threshold || status.reset <= 0 {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let secs = if status.remaining <= 0 {
            status.reset as f64
        } else {
            status.reset as f64 / status.remaining as f64
        };
        Some(Duration::from_secs_f64(secs))
    }
}

/// Rate-limit values reported by a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    /// Requests remaining in the window (1 when not reported)
    pub remaining: i64,
    /// Reset value in seconds (0 when not reported)
    pub reset: i64,
}

impl Default for RateLimitStatus {
    fn default() -> Self {
        Self {
            remaining: 1,
            reset: 0,
        }
    }
}

impl RateLimitStatus {
    /// Build a status from raw header values. Missing or unparsable values
    /// fall back to the defaults.
    #[must_use]
    pub fn from_headers(remaining: Option<&str>, reset: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            remaining: parse_header(remaining).unwrap_or(defaults.remaining),
            reset: parse_header(reset).unwrap_or(defaults.reset),
        }
    }
}

fn parse_header(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}
