//! Core building blocks for apiwrap
//!
//! This crate provides the pieces of the client builder that do not depend on
//! an HTTP stack:
//!
//! - **Resource descriptors**: named URL templates with documentation links,
//!   declared in code or loaded from TOML/JSON resource files
//! - **Naming fallbacks**: snake_case to camelCase/PascalCase lookup candidates
//! - **Throttling**: cooperative back-off driven by rate-limit response headers
//! - **Retry policy**: the two-state retry-once machine used for token refresh
//! - **Telemetry**: tracing subscriber initialisation
//!
//! # Example
//!
//! ```rust
//! use apiwrap_core::config::{Resource, ResourceMapping};
//! use apiwrap_core::naming::lookup_candidates;
//!
//! let mut resources = ResourceMapping::new();
//! resources.insert(
//!     "user".to_string(),
//!     Resource::new("user/{id}/").with_docs("https://example.org/user"),
//! );
//!
//! assert_eq!(lookup_candidates("user_name"), vec!["user_name", "userName", "UserName"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod naming;
pub mod rate_limit;
pub mod retry;
pub mod telemetry;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Resource, ResourceFile, ResourceMapping};
    pub use crate::error::{Error, Result};
    pub use crate::naming::{lookup_candidates, to_camel_case, to_pascal_case};
    pub use crate::rate_limit::{RateLimitStatus, ThrottleConfig};
    pub use crate::retry::Attempt;
}
