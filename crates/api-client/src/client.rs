//! Client nodes and the client builder
//!
//! A [`Client`] pairs a data value with its provenance. The root node has no
//! data; resolving a resource name yields a node bound to the resource URL,
//! and resolving a key on fetched data yields a node bound to that element.
//! Calling a node materialises an [`Executor`] that can issue requests.

use crate::adapter::Adapter;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::executor::Executor;
use crate::pages::{PageLimits, Pages};
use crate::params::ApiParams;
use crate::request::{RequestKwargs, UrlParams};
use crate::response::ApiResponse;
use crate::serializer::Serializer;
use apiwrap_core::config::Resource;
use apiwrap_core::naming::lookup_candidates;
use apiwrap_core::rate_limit::ThrottleConfig;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// State shared by every node derived from one root
pub(crate) struct Context {
    pub(crate) adapter: Arc<dyn Adapter>,
    pub(crate) session: reqwest::Client,
    pub(crate) api_params: ApiParams,
    pub(crate) refresh_token_default: bool,
    pub(crate) serializer: Option<Arc<dyn Serializer>>,
    pub(crate) throttle: ThrottleConfig,
}

/// Refresh data of a node. Clones share the cell; the executor that ran a
/// refresh writes the result back here.
#[derive(Clone, Default)]
pub(crate) struct RefreshCell {
    inner: Arc<RwLock<Option<Value>>>,
}

impl RefreshCell {
    pub(crate) fn new(value: Option<Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    pub(crate) fn get(&self) -> Option<Value> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn set(&self, value: Option<Value>) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = value;
    }

    /// A new cell holding the current value
    pub(crate) fn detach(&self) -> Self {
        Self::new(self.get())
    }
}

impl fmt::Debug for RefreshCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.get().fmt(f)
    }
}

/// Data plus provenance; the shared body of [`Client`] and [`Executor`]
#[derive(Clone)]
pub(crate) struct Node {
    pub(crate) ctx: Arc<Context>,
    pub(crate) data: Value,
    pub(crate) response: Option<Arc<ApiResponse>>,
    pub(crate) request_kwargs: Option<RequestKwargs>,
    pub(crate) resource: Option<Arc<Resource>>,
    pub(crate) refresh_data: RefreshCell,
}

impl Node {
    /// Wrap navigated data: keeps the request kwargs, drops the response
    pub(crate) fn wrap(&self, data: Value) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            data,
            response: None,
            request_kwargs: self.request_kwargs.clone(),
            resource: None,
            refresh_data: self.refresh_data.detach(),
        }
    }

    /// Copy of this node with its own refresh cell
    pub(crate) fn detached(&self) -> Self {
        Self {
            refresh_data: self.refresh_data.detach(),
            ..self.clone()
        }
    }

    /// Wrap the outcome of a request
    pub(crate) fn wrap_response(
        &self,
        data: Value,
        response: Arc<ApiResponse>,
        request_kwargs: RequestKwargs,
        refresh_data: Option<Value>,
    ) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            data,
            response: Some(response),
            request_kwargs: Some(request_kwargs),
            resource: None,
            refresh_data: RefreshCell::new(refresh_data),
        }
    }

    pub(crate) fn response(&self) -> ApiResult<&ApiResponse> {
        self.response.as_deref().ok_or(ApiError::NoResponse)
    }

    pub(crate) fn docs(&self) -> Option<String> {
        self.resource.as_ref().map(|r| r.describe())
    }

    pub(crate) fn fmt_named(&self, name: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pretty = serde_json::to_string_pretty(&self.data).map_err(|_| fmt::Error)?;
        write!(f, "<{name} object\n{pretty}>")
    }
}

/// Lookup key for [`Client::item`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Array index
    Index(usize),
    /// Object key or resource name
    Name(String),
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// Builder for a root [`Client`]
pub struct ClientBuilder {
    adapter: Arc<dyn Adapter>,
    config: ClientConfig,
    session: Option<reqwest::Client>,
    serializer: Option<Arc<dyn Serializer>>,
    api_params: Map<String, Value>,
    refresh_token_by_default: bool,
}

impl ClientBuilder {
    fn new(adapter: Arc<dyn Adapter>) -> Self {
        Self {
            adapter,
            config: ClientConfig::default(),
            session: None,
            serializer: None,
            api_params: Map::new(),
            refresh_token_by_default: false,
        }
    }

    /// Set an API parameter (tokens, `default_url_params`, ...)
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.api_params.insert(key.into(), value.into());
        self
    }

    /// Set all API parameters at once
    #[must_use]
    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.api_params = params;
        self
    }

    /// Refresh expired credentials automatically unless a call opts out
    #[must_use]
    pub fn refresh_token_by_default(mut self, enabled: bool) -> Self {
        self.refresh_token_by_default = enabled;
        self
    }

    /// Use this serializer instead of the adapter's
    #[must_use]
    pub fn serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    /// Share an existing HTTP session
    #[must_use]
    pub fn session(mut self, session: reqwest::Client) -> Self {
        self.session = Some(session);
        self
    }

    /// Client configuration
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the root node
    pub fn build(self) -> ApiResult<Client> {
        self.config.validate()?;

        let session = match self.session {
            Some(session) => session,
            None => {
                let mut default_headers = HeaderMap::new();
                let agent = HeaderValue::from_str(&self.config.user_agent)
                    .map_err(|e| ApiError::config(format!("invalid user agent: {e}")))?;
                default_headers.insert(USER_AGENT, agent);

                reqwest::Client::builder()
                    .timeout(self.config.timeout)
                    .default_headers(default_headers)
                    .build()
                    .map_err(ApiError::Request)?
            }
        };

        let serializer = self.serializer.or_else(|| self.adapter.serializer());

        debug!(
            resources = self.adapter.resource_mapping().len(),
            refresh_token_by_default = self.refresh_token_by_default,
            "Client built"
        );

        let ctx = Context {
            adapter: self.adapter,
            session,
            api_params: ApiParams::new(self.api_params),
            refresh_token_default: self.refresh_token_by_default,
            serializer,
            throttle: self.config.rate_limit,
        };

        Ok(Client::from_node(Node {
            ctx: Arc::new(ctx),
            data: Value::Null,
            response: None,
            request_kwargs: None,
            resource: None,
            refresh_data: RefreshCell::default(),
        }))
    }
}

/// A navigable node
#[derive(Clone)]
pub struct Client {
    node: Node,
}

impl Client {
    /// Create a builder for a root client over `adapter`
    pub fn builder(adapter: impl Adapter) -> ClientBuilder {
        ClientBuilder::new(Arc::new(adapter))
    }

    /// Create a builder sharing an adapter with other clients
    pub fn builder_shared(adapter: Arc<dyn Adapter>) -> ClientBuilder {
        ClientBuilder::new(adapter)
    }

    /// Root client with default settings
    pub fn new(adapter: impl Adapter) -> ApiResult<Self> {
        Self::builder(adapter).build()
    }

    pub(crate) fn from_node(node: Node) -> Self {
        Self { node }
    }

    pub(crate) fn into_node(self) -> Node {
        self.node
    }

    /// Wrap a value in a new node sharing this node's context
    #[must_use]
    pub fn wrap(&self, data: Value) -> Self {
        Self::from_node(self.node.wrap(data))
    }

    /// Resolve a key to nested data or a declared resource.
    ///
    /// Names are tried verbatim, then camelCase, then PascalCase; each
    /// candidate is looked up in the data before the resource map.
    #[must_use]
    pub fn resolve(&self, key: impl Into<Key>) -> Option<Self> {
        match key.into() {
            Key::Index(index) => self.from_index(index),
            Key::Name(name) => lookup_candidates(&name)
                .iter()
                .find_map(|candidate| self.from_name(candidate)),
        }
    }

    /// Attribute-style lookup
    pub fn attr(&self, name: &str) -> ApiResult<Self> {
        self.resolve(name)
            .ok_or_else(|| ApiError::AttributeNotFound(name.to_string()))
    }

    /// Item-style lookup
    pub fn item(&self, key: impl Into<Key>) -> ApiResult<Self> {
        let key = key.into();
        self.resolve(key.clone())
            .ok_or_else(|| ApiError::KeyNotFound(key.to_string()))
    }

    fn from_index(&self, index: usize) -> Option<Self> {
        let item = self.node.data.as_array()?.get(index)?;
        Some(self.wrap(item.clone()))
    }

    fn from_name(&self, name: &str) -> Option<Self> {
        if let Some(value) = self.node.data.as_object().and_then(|o| o.get(name)) {
            return Some(self.wrap(value.clone()));
        }

        let adapter = &self.node.ctx.adapter;
        let resource = adapter.resource_mapping().get(name)?;
        let api_root = adapter.get_api_root(&self.node.ctx.api_params, name);
        let url = format!(
            "{}/{}",
            api_root.trim_end_matches('/'),
            resource.resource.trim_start_matches('/')
        );

        let mut node = self.node.wrap(Value::String(url));
        node.resource = Some(Arc::new(resource.clone()));
        Some(Self::from_node(node))
    }

    /// Materialise an executor, filling the resource template with the
    /// default URL parameters
    pub fn call(&self) -> ApiResult<Executor> {
        self.call_with(UrlParams::new())
    }

    /// Materialise an executor, filling the resource template with
    /// `url_params` on top of the default URL parameters
    pub fn call_with<I, K, V>(&self, url_params: I) -> ApiResult<Executor>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let mut params = self.node.ctx.api_params.default_url_params();
        params.extend(
            url_params
                .into_iter()
                .map(|(k, v)| (k.into(), v.to_string())),
        );

        let mut node = self.node.detached();
        if self.node.resource.is_some() && !params.is_empty() {
            let template = self.node.data.as_str().ok_or(ApiError::MissingUrl)?;
            let filled = self
                .node
                .ctx
                .adapter
                .fill_resource_template_url(template, &params)?;
            node.data = Value::String(filled);
        }
        Ok(Executor::from_node(node))
    }

    /// Shorthand for `call()?.pages(limits)`
    pub fn pages(&self, limits: PageLimits) -> ApiResult<Pages> {
        Ok(self.call()?.pages(limits))
    }

    /// Bound data
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.node.data
    }

    /// Bound data, consuming the node
    #[must_use]
    pub fn into_data(self) -> Value {
        self.node.data
    }

    /// The response this node came from
    pub fn response(&self) -> ApiResult<&ApiResponse> {
        self.node.response()
    }

    /// Status code of the response this node came from
    pub fn status_code(&self) -> ApiResult<u16> {
        Ok(self.node.response()?.status_code())
    }

    /// Arguments of the request this node came from
    #[must_use]
    pub fn request_kwargs(&self) -> Option<&RequestKwargs> {
        self.node.request_kwargs.as_ref()
    }

    /// Refresh data obtained by the last token refresh
    #[must_use]
    pub fn refresh_data(&self) -> Option<Value> {
        self.node.refresh_data.get()
    }

    /// The resource this node is bound to
    #[must_use]
    pub fn resource(&self) -> Option<&Resource> {
        self.node.resource.as_deref()
    }

    /// The shared API parameters
    #[must_use]
    pub fn api_params(&self) -> &ApiParams {
        &self.node.ctx.api_params
    }

    /// Generated documentation of the bound resource
    #[must_use]
    pub fn docs(&self) -> Option<String> {
        self.node.docs()
    }

    /// Names reachable from this node: resource names on the root, object
    /// keys on object data, nothing otherwise
    #[must_use]
    pub fn dir(&self) -> Vec<String> {
        match &self.node.data {
            Value::Null => self
                .node
                .ctx
                .adapter
                .resource_mapping()
                .keys()
                .cloned()
                .collect(),
            Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Number of elements, entries or characters of the bound data
    pub fn len(&self) -> ApiResult<usize> {
        match &self.node.data {
            Value::Array(items) => Ok(items.len()),
            Value::Object(map) => Ok(map.len()),
            Value::String(s) => Ok(s.chars().count()),
            other => Err(ApiError::NotIterable(type_name(other))),
        }
    }

    /// Whether the bound data is an empty collection
    pub fn is_empty(&self) -> ApiResult<bool> {
        self.len().map(|len| len == 0)
    }

    /// Whether the bound data contains `key`: an object key, an array
    /// element equal to the string, or a substring
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        match &self.node.data {
            Value::Object(map) => map.contains_key(key),
            Value::Array(items) => items.iter().any(|v| v.as_str() == Some(key)),
            Value::String(s) => s.contains(key),
            _ => false,
        }
    }

    /// Iterate over the elements of array data, each wrapped in a node
    pub fn iter(&self) -> ApiResult<impl Iterator<Item = Client> + '_> {
        let items = self
            .node
            .data
            .as_array()
            .ok_or_else(|| ApiError::NotIterable(type_name(&self.node.data)))?;
        Ok(items.iter().map(|item| self.wrap(item.clone())))
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.fmt_named("Client", f)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("data", &self.node.data)
            .field("status", &self.node.response.as_ref().map(|r| r.status_code()))
            .field("resource", &self.node.resource.as_ref().map(|r| &r.resource))
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("data", &self.data)
            .field("request_kwargs", &self.request_kwargs)
            .finish_non_exhaustive()
    }
}
