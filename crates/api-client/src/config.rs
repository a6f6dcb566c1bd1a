//! Configuration for the HTTP session behind a client
//!
//! Supports environment-based configuration with sensible defaults.

use crate::error::{ApiError, ApiResult};
use apiwrap_core::rate_limit::ThrottleConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `User-Agent` header
pub const DEFAULT_USER_AGENT: &str = concat!("apiwrap/", env!("CARGO_PKG_VERSION"));

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// `User-Agent` header sent with every request
    pub user_agent: String,
    /// Rate-limit header throttling
    pub rate_limit: ThrottleConfig,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            rate_limit: ThrottleConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `APIWRAP_TIMEOUT_SECS`: Request timeout in seconds
    /// - `APIWRAP_USER_AGENT`: `User-Agent` header
    /// - `APIWRAP_THROTTLE`: `false`/`0`/`off` disables rate-limit throttling
    /// - `APIWRAP_RATE_LIMIT_THRESHOLD`: Remaining-request threshold
    pub fn from_env() -> ApiResult<Self> {
        let defaults = Self::default();

        let timeout = match env::var("APIWRAP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ApiError::config(format!("invalid APIWRAP_TIMEOUT_SECS: {raw}")))?,
            Err(_) => defaults.timeout,
        };

        let user_agent = env::var("APIWRAP_USER_AGENT").unwrap_or(defaults.user_agent);

        let enabled = env::var("APIWRAP_THROTTLE").map_or(defaults.rate_limit.enabled, |raw| {
            !matches!(
                raw.trim().to_lowercase().as_str(),
                "false" | "0" | "off" | "no"
            )
        });

        let threshold = match env::var("APIWRAP_RATE_LIMIT_THRESHOLD") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                ApiError::config(format!("invalid APIWRAP_RATE_LIMIT_THRESHOLD: {raw}"))
            })?,
            Err(_) => defaults.rate_limit.threshold,
        };

        Ok(Self {
            timeout,
            user_agent,
            rate_limit: ThrottleConfig { enabled, threshold },
        })
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builder-style method to set rate limit config
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: ThrottleConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        if self.user_agent.trim().is_empty() {
            return Err(ApiError::config("user_agent cannot be empty"));
        }

        if self.rate_limit.threshold < 0 {
            return Err(ApiError::config("rate limit threshold cannot be negative"));
        }

        Ok(())
    }
}
