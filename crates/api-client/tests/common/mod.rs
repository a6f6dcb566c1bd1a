//! Shared adapters and helpers for the integration tests
#![allow(dead_code)]

use apiwrap::{
    async_trait, Adapter, ApiError, ApiParams, ApiResponse, ApiResult, Auth, Client,
    ClientBuilder, RequestKwargs, Resource, ResourceMapping, ResponseError,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

pub const ANOTHER_ROOT: &str = "https://api.another.com/";

static TRACING: Once = Once::new();

/// Install the tracing subscriber once per test binary
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = apiwrap_core::telemetry::init();
    });
}

pub fn resource_mapping() -> ResourceMapping {
    let mut resources = ResourceMapping::new();
    resources.insert(
        "test".into(),
        Resource::new("test/").with_docs("http://www.example.org"),
    );
    resources.insert(
        "user".into(),
        Resource::new("user/{id}/").with_docs("http://www.example.org/user"),
    );
    resources.insert(
        "resource".into(),
        Resource::new("resource/{number}/")
            .with_docs("http://www.example.org/resource")
            .with_meta("spam", "eggs")
            .with_meta("foo", "bar"),
    );
    resources.insert(
        "another_root".into(),
        Resource::new("another-root/").with_docs("http://www.example.org/another-root"),
    );
    resources
}

/// JSON adapter paging through `data` and following `paging.next`
pub struct TesterAdapter {
    api_root: String,
    resources: ResourceMapping,
}

impl TesterAdapter {
    pub fn new(api_root: impl Into<String>) -> Self {
        Self {
            api_root: api_root.into(),
            resources: resource_mapping(),
        }
    }
}

impl Adapter for TesterAdapter {
    fn resource_mapping(&self) -> &ResourceMapping {
        &self.resources
    }

    fn get_api_root(&self, _api_params: &ApiParams, resource_name: &str) -> String {
        if resource_name == "another_root" {
            ANOTHER_ROOT.to_string()
        } else {
            self.api_root.clone()
        }
    }

    fn get_auth(&self, api_params: &ApiParams) -> Option<Auth> {
        api_params.get_str("token").map(Auth::Bearer)
    }

    fn get_error_message(&self, data: &Value, _response: &ApiResponse) -> Option<String> {
        data.get("error").and_then(Value::as_str).map(str::to_string)
    }

    fn get_iterator_list(&self, data: &Value) -> Option<Vec<Value>> {
        data.get("data")?.as_array().cloned()
    }

    fn get_iterator_next_request_kwargs(
        &self,
        _prev_kwargs: Option<&RequestKwargs>,
        data: &Value,
        _response: Option<&ApiResponse>,
    ) -> Option<RequestKwargs> {
        let next = data.get("paging")?.get("next")?.as_str()?;
        if next.is_empty() {
            return None;
        }
        Some(RequestKwargs::new().url(next))
    }
}

/// Refreshes to `new_token` on a 401
pub struct TokenRefreshAdapter {
    inner: TesterAdapter,
    pub refreshes: Arc<AtomicUsize>,
}

impl TokenRefreshAdapter {
    pub fn new(api_root: impl Into<String>) -> Self {
        Self {
            inner: TesterAdapter::new(api_root),
            refreshes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Adapter for TokenRefreshAdapter {
    fn resource_mapping(&self) -> &ResourceMapping {
        self.inner.resource_mapping()
    }

    fn get_api_root(&self, api_params: &ApiParams, resource_name: &str) -> String {
        self.inner.get_api_root(api_params, resource_name)
    }

    fn get_auth(&self, api_params: &ApiParams) -> Option<Auth> {
        self.inner.get_auth(api_params)
    }

    fn is_authentication_expired(&self, error: &ResponseError) -> bool {
        error.status_code() == Some(401)
    }

    async fn refresh_authentication(&self, api_params: &ApiParams) -> ApiResult<Option<Value>> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        api_params.set("token", "new_token");
        Ok(Some(Value::String("new_token".into())))
    }
}

/// Reports expired credentials but never manages to refresh them
pub struct FailTokenRefreshAdapter {
    inner: TesterAdapter,
    pub refreshes: Arc<AtomicUsize>,
}

impl FailTokenRefreshAdapter {
    pub fn new(api_root: impl Into<String>) -> Self {
        Self {
            inner: TesterAdapter::new(api_root),
            refreshes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Adapter for FailTokenRefreshAdapter {
    fn resource_mapping(&self) -> &ResourceMapping {
        self.inner.resource_mapping()
    }

    fn get_api_root(&self, api_params: &ApiParams, resource_name: &str) -> String {
        self.inner.get_api_root(api_params, resource_name)
    }

    fn is_authentication_expired(&self, error: &ResponseError) -> bool {
        error.status_code() == Some(401)
    }

    async fn refresh_authentication(&self, _api_params: &ApiParams) -> ApiResult<Option<Value>> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

/// Reports expired credentials and fails to reach its refresh endpoint
pub struct BrokenRefreshAdapter {
    inner: TesterAdapter,
    pub refreshes: Arc<AtomicUsize>,
}

impl BrokenRefreshAdapter {
    pub fn new(api_root: impl Into<String>) -> Self {
        Self {
            inner: TesterAdapter::new(api_root),
            refreshes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Adapter for BrokenRefreshAdapter {
    fn resource_mapping(&self) -> &ResourceMapping {
        self.inner.resource_mapping()
    }

    fn get_api_root(&self, api_params: &ApiParams, resource_name: &str) -> String {
        self.inner.get_api_root(api_params, resource_name)
    }

    fn is_authentication_expired(&self, error: &ResponseError) -> bool {
        error.status_code() == Some(401)
    }

    async fn refresh_authentication(&self, _api_params: &ApiParams) -> ApiResult<Option<Value>> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Err(ApiError::config("refresh endpoint unavailable"))
    }
}

pub fn builder(api_root: &str) -> ClientBuilder {
    init_tracing();
    Client::builder(TesterAdapter::new(api_root))
}

pub fn client(api_root: &str) -> Client {
    builder(api_root).build().unwrap()
}
