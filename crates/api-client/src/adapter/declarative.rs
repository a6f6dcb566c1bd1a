//! An adapter driven entirely by a resource file

use super::Adapter;
use crate::error::ApiResult;
use crate::params::ApiParams;
use crate::request::{Auth, BodyFormat, RequestKwargs};
use crate::response::ApiResponse;
use apiwrap_core::config::{ResourceFile, ResourceMapping};
use serde_json::Value;
use std::path::Path;

/// Parameter read by [`DeclarativeAdapter`] for bearer authentication
pub const TOKEN_PARAM: &str = "token";

/// Adapter built from a [`ResourceFile`].
///
/// Authenticates with `Authorization: Bearer <token>` when the `token`
/// parameter is set, and paginates with JSON pointers into the response
/// data when they are configured.
#[derive(Debug, Clone)]
pub struct DeclarativeAdapter {
    file: ResourceFile,
    body_format: BodyFormat,
    items_pointer: Option<String>,
    next_pointer: Option<String>,
}

impl DeclarativeAdapter {
    /// Create an adapter from a parsed resource file
    #[must_use]
    pub fn new(file: ResourceFile) -> Self {
        Self {
            file,
            body_format: BodyFormat::Json,
            items_pointer: None,
            next_pointer: None,
        }
    }

    /// Load the resource file at `path`
    pub fn from_file(path: impl AsRef<Path>) -> ApiResult<Self> {
        Ok(Self::new(ResourceFile::load(path)?))
    }

    /// Builder-style method to set the body format
    #[must_use]
    pub fn with_body_format(mut self, format: BodyFormat) -> Self {
        self.body_format = format;
        self
    }

    /// Builder-style method to page over the array at `items` (a JSON
    /// pointer such as `/data`), following the URL at `next`
    /// (e.g. `/paging/next`)
    #[must_use]
    pub fn with_pagination(mut self, items: impl Into<String>, next: impl Into<String>) -> Self {
        self.items_pointer = Some(items.into());
        self.next_pointer = Some(next.into());
        self
    }

    /// The underlying resource file
    #[must_use]
    pub fn resource_file(&self) -> &ResourceFile {
        &self.file
    }
}

impl Adapter for DeclarativeAdapter {
    fn resource_mapping(&self) -> &ResourceMapping {
        &self.file.resources
    }

    fn get_api_root(&self, _api_params: &ApiParams, resource_name: &str) -> String {
        self.file.root_for(resource_name).to_string()
    }

    fn body_format(&self) -> BodyFormat {
        self.body_format
    }

    fn get_auth(&self, api_params: &ApiParams) -> Option<Auth> {
        api_params.get_str(TOKEN_PARAM).map(Auth::Bearer)
    }

    fn get_iterator_list(&self, data: &Value) -> Option<Vec<Value>> {
        match &self.items_pointer {
            Some(pointer) => data.pointer(pointer)?.as_array().cloned(),
            None => data.as_array().cloned(),
        }
    }

    fn get_iterator_next_request_kwargs(
        &self,
        _prev_kwargs: Option<&RequestKwargs>,
        data: &Value,
        _response: Option<&ApiResponse>,
    ) -> Option<RequestKwargs> {
        let next = data.pointer(self.next_pointer.as_deref()?)?.as_str()?;
        if next.is_empty() {
            return None;
        }
        Some(RequestKwargs::new().url(next))
    }
}
