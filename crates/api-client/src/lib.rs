//! Navigable HTTP API clients built from a resource map and an adapter
//!
//! An [`Adapter`] declares an API's resources and how to talk to it. A
//! [`Client`] built over the adapter resolves resource names to URLs,
//! materialises an [`Executor`] per call, and wraps every response and every
//! nested value in a new node that can be navigated further.
//!
//! # Features
//!
//! - **Resource navigation**: snake_case names fall back to camelCase and
//!   PascalCase keys and resources
//! - **Pluggable adapters**: request shaping, response parsing, error
//!   classification and pagination hooks with JSON defaults
//! - **Token refresh**: expired credentials are refreshed and the request is
//!   retried once
//! - **Rate-limit throttling**: back-off driven by `X-RateLimit-*` headers
//! - **Request correlation**: every request is traced with a unique ID
//!
//! # Example
//!
//! ```rust,no_run
//! use apiwrap::{Adapter, ApiParams, Client, RequestKwargs, Resource, ResourceMapping};
//!
//! struct GitHub {
//!     resources: ResourceMapping,
//! }
//!
//! impl Adapter for GitHub {
//!     fn resource_mapping(&self) -> &ResourceMapping {
//!         &self.resources
//!     }
//!
//!     fn get_api_root(&self, _api_params: &ApiParams, _resource_name: &str) -> String {
//!         "https://api.github.com".to_string()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut resources = ResourceMapping::new();
//!     resources.insert("user_repos".into(), Resource::new("users/{user}/repos"));
//!
//!     let client = Client::new(GitHub { resources })?;
//!     let repos = client
//!         .attr("user_repos")?
//!         .call_with([("user", "rust-lang")])?
//!         .get(RequestKwargs::new())
//!         .await?;
//!
//!     for repo in repos.iter()? {
//!         println!("{}", repo.attr("full_name")?.data());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod pages;
pub mod params;
pub mod request;
pub mod response;
pub mod serializer;

pub use adapter::{Adapter, DeclarativeAdapter};
pub use apiwrap_core::config::{Resource, ResourceFile, ResourceMapping};
pub use client::{Client, ClientBuilder, Key};
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult, ErrorKind, ProcessError, ResponseError};
pub use executor::Executor;
pub use pages::{PageLimits, Pages};
pub use params::ApiParams;
pub use request::{Auth, BodyFormat, RequestKwargs, UrlParams};
pub use response::ApiResponse;
pub use serializer::{Serializer, SimpleSerializer};

/// Re-export of the adapter macro, for adapters that override
/// [`Adapter::refresh_authentication`]
pub use async_trait::async_trait;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::adapter::{Adapter, DeclarativeAdapter};
    pub use crate::client::{Client, Key};
    pub use crate::config::ClientConfig;
    pub use crate::error::{ApiError, ApiResult, ErrorKind, ResponseError};
    pub use crate::executor::Executor;
    pub use crate::pages::PageLimits;
    pub use crate::params::ApiParams;
    pub use crate::request::{Auth, BodyFormat, RequestKwargs};
    pub use crate::serializer::{Serializer, SimpleSerializer};
    pub use apiwrap_core::config::{Resource, ResourceMapping};
}
