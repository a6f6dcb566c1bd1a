//! The adapter: API-specific behaviour consumed by the client
//!
//! An adapter declares the resource map and shapes requests and responses.
//! Only [`Adapter::resource_mapping`] and [`Adapter::get_api_root`] are
//! required; every other hook has a default that speaks JSON, classifies
//! errors by status code and never paginates or refreshes.
//!
//! ```rust
//! use apiwrap::{Adapter, ApiParams, Resource, ResourceMapping};
//!
//! struct Example {
//!     resources: ResourceMapping,
//! }
//!
//! impl Adapter for Example {
//!     fn resource_mapping(&self) -> &ResourceMapping {
//!         &self.resources
//!     }
//!
//!     fn get_api_root(&self, _api_params: &ApiParams, _resource_name: &str) -> String {
//!         "https://api.example.org".to_string()
//!     }
//! }
//! ```

mod declarative;

pub use declarative::DeclarativeAdapter;

use crate::error::{ApiError, ApiResult, ErrorKind, ProcessError, ResponseError};
use crate::params::ApiParams;
use crate::request::{Auth, BodyFormat, RequestKwargs, UrlParams};
use crate::response::ApiResponse;
use crate::serializer::Serializer;
use apiwrap_core::config::ResourceMapping;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;

/// API-specific request and response shaping
#[async_trait]
pub trait Adapter: Send + Sync + 'static {
    /// Named resources of the API
    fn resource_mapping(&self) -> &ResourceMapping;

    /// Root URL for a resource
    fn get_api_root(&self, api_params: &ApiParams, resource_name: &str) -> String;

    /// Body encoding used when a request doesn't force one
    fn body_format(&self) -> BodyFormat {
        BodyFormat::Json
    }

    /// Serializer for outbound values and native conversions
    fn serializer(&self) -> Option<Arc<dyn Serializer>> {
        None
    }

    /// Authentication derived from the API parameters
    fn get_auth(&self, _api_params: &ApiParams) -> Option<Auth> {
        None
    }

    /// Build the full request arguments.
    ///
    /// `kwargs.data` has already been through the client's serializer. The
    /// default resolves the body format, sets the content type for JSON
    /// bodies and fills in `auth` from [`Adapter::get_auth`] unless the
    /// caller supplied one.
    fn get_request_kwargs(
        &self,
        api_params: &ApiParams,
        _method: &Method,
        mut kwargs: RequestKwargs,
    ) -> ApiResult<RequestKwargs> {
        let format = *kwargs.format.get_or_insert_with(|| self.body_format());

        if let Some(content_type) = format.content_type() {
            if !kwargs.has_content_type() {
                kwargs
                    .headers
                    .insert(CONTENT_TYPE.as_str().to_string(), content_type.to_string());
            }
        }

        if kwargs.auth.is_none() {
            kwargs.auth = self.get_auth(api_params);
        }

        Ok(kwargs)
    }

    /// Parse a response body into data
    fn response_to_native(&self, response: &ApiResponse) -> ApiResult<Value> {
        match self.body_format() {
            BodyFormat::Json if response.is_empty() => Ok(Value::Null),
            BodyFormat::Json => response.json(),
            BodyFormat::Form => Ok(json!({ "text": response.text() })),
        }
    }

    /// Parse a response, rejecting error statuses with
    /// [`ApiError::Process`]. The error payload is the parsed body, or
    /// `null` when it doesn't parse.
    fn process_response(&self, response: &ApiResponse) -> ApiResult<Value> {
        if let Some(kind) = ErrorKind::from_status(response.status_code()) {
            let data = self.response_to_native(response).unwrap_or(Value::Null);
            return Err(ProcessError::new(kind, data).into());
        }
        self.response_to_native(response)
    }

    /// Message for an error response; `None` falls back to the status code
    fn get_error_message(&self, _data: &Value, _response: &ApiResponse) -> Option<String> {
        None
    }

    /// Whether an error means the credentials expired
    fn is_authentication_expired(&self, _error: &ResponseError) -> bool {
        false
    }

    /// Refresh the credentials. A truthy value is kept as the client's
    /// refresh data and the failed request is retried once.
    async fn refresh_authentication(&self, _api_params: &ApiParams) -> ApiResult<Option<Value>> {
        Ok(None)
    }

    /// Items of the current page. The default pages over top-level arrays.
    fn get_iterator_list(&self, data: &Value) -> Option<Vec<Value>> {
        data.as_array().cloned()
    }

    /// Request arguments of the next page, or `None` on the last page
    fn get_iterator_next_request_kwargs(
        &self,
        _prev_kwargs: Option<&RequestKwargs>,
        _data: &Value,
        _response: Option<&ApiResponse>,
    ) -> Option<RequestKwargs> {
        None
    }

    /// Fill a resource URL template
    fn fill_resource_template_url(
        &self,
        template: &str,
        url_params: &UrlParams,
    ) -> ApiResult<String> {
        fill_template(template, url_params)
    }
}

/// Replace every `{name}` placeholder with its parameter. Unused parameters
/// are ignored; a placeholder without a parameter is an error.
pub fn fill_template(template: &str, url_params: &UrlParams) -> ApiResult<String> {
    let mut filled = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        filled.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| ApiError::InvalidUrl(format!("unclosed placeholder in {template}")))?;
        let name = &after[..end];
        let value = url_params
            .get(name)
            .ok_or_else(|| ApiError::MissingUrlParam(name.to_string()))?;
        filled.push_str(value);
        rest = &after[end + 1..];
    }
    filled.push_str(rest);
    Ok(filled)
}

/// Whether a value counts as set: null, false, zero and empty values do not
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
