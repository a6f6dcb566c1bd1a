//! Instantiation parameters shared by every node of one client

use crate::request::UrlParams;
use serde_json::{Map, Value};
use std::sync::{Arc, RwLock};

/// Key holding URL parameters merged into every call
pub const DEFAULT_URL_PARAMS: &str = "default_url_params";

/// Shared, mutable API parameters (tokens, default URL parameters, ...).
///
/// Cloning the handle shares the underlying map; the refresh hook writes the
/// new credentials here and every node sees them.
#[derive(Debug, Clone, Default)]
pub struct ApiParams {
    inner: Arc<RwLock<Map<String, Value>>>,
}

impl ApiParams {
    /// Create parameters from a map
    #[must_use]
    pub fn new(params: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(params)),
        }
    }

    /// A parameter value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        // Handle poisoned lock by recovering the data (still valid even after panic)
        let params = self.inner.read().unwrap_or_else(|e| e.into_inner());
        params.get(key).cloned()
    }

    /// A string parameter
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Set a parameter, returning the previous value
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let mut params = self.inner.write().unwrap_or_else(|e| e.into_inner());
        params.insert(key.into(), value.into())
    }

    /// Remove a parameter
    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut params = self.inner.write().unwrap_or_else(|e| e.into_inner());
        params.remove(key)
    }

    /// Whether a parameter is set
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let params = self.inner.read().unwrap_or_else(|e| e.into_inner());
        params.contains_key(key)
    }

    /// Copy of all parameters
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The `default_url_params` entry as string pairs. Non-string scalars are
    /// rendered with their JSON representation.
    #[must_use]
    pub fn default_url_params(&self) -> UrlParams {
        let Some(Value::Object(map)) = self.get(DEFAULT_URL_PARAMS) else {
            return UrlParams::new();
        };
        map.into_iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect()
    }

    /// Whether two handles share the same map
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<Map<String, Value>> for ApiParams {
    fn from(params: Map<String, Value>) -> Self {
        Self::new(params)
    }
}
