//! Retry-once policy for requests that fail on expired authentication
//!
//! A request is first attempted normally. If it fails because the
//! credentials expired and a refresh succeeds, it is attempted exactly once
//! more. The retried attempt never refreshes again.

use serde::{Deserialize, Serialize};

/// Attempt state of a single logical request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Attempt {
    /// The original attempt
    #[default]
    First,
    /// The single retry after a successful refresh
    Retried,
}

impl Attempt {
    /// Whether a failure in this state may trigger a refresh
    #[must_use]
    pub fn may_refresh(self) -> bool {
        matches!(self, Self::First)
    }

    /// The state after a successful refresh, or `None` when the retry budget
    /// is already spent
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::First => Some(Self::Retried),
            Self::Retried => None,
        }
    }

    /// 1-based attempt number, for logging
    #[must_use]
    pub fn number(self) -> u32 {
        match self {
            Self::First => 1,
            Self::Retried => 2,
        }
    }
}
