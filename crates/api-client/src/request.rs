//! Request arguments
//!
//! [`RequestKwargs`] is what callers pass to a verb, what the adapter turns
//! into full request arguments, and what a node remembers about the request
//! that produced it (pagination derives the next page from it).

use crate::error::{ApiError, ApiResult};
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// URL template parameters
pub type UrlParams = BTreeMap<String, String>;

/// How a request body is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyFormat {
    /// `application/json`
    #[default]
    Json,
    /// `application/x-www-form-urlencoded`
    Form,
}

impl BodyFormat {
    /// Content type sent for this format, if the format sets one itself
    #[must_use]
    pub fn content_type(self) -> Option<&'static str> {
        match self {
            Self::Json => Some("application/json"),
            // reqwest sets the form content type when encoding
            Self::Form => None,
        }
    }
}

/// Request authentication
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// HTTP basic authentication
    Basic {
        /// User name
        username: String,
        /// Optional password
        password: Option<String>,
    },
    /// A custom header carrying a key
    Header {
        /// Header name
        name: String,
        /// Header value
        value: String,
    },
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(***)"),
            Self::Basic { username, .. } => write!(f, "Basic({username}:***)"),
            Self::Header { name, .. } => write!(f, "Header({name}: ***)"),
        }
    }
}

/// Arguments of a single request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestKwargs {
    /// Absolute URL; defaults to the URL the executor is bound to
    pub url: Option<String>,
    /// Query parameters
    pub params: BTreeMap<String, String>,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// Body payload, encoded according to `format`
    pub data: Option<Value>,
    /// Body encoding; the adapter's default when unset
    pub format: Option<BodyFormat>,
    /// Authentication
    pub auth: Option<Auth>,
    /// Per-request timeout
    pub timeout: Option<Duration>,
    /// `Some(false)` skips token refresh for this call; never sent
    pub refresh_token: Option<bool>,
}

impl RequestKwargs {
    /// Empty arguments
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method to set the URL
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Builder-style method to add a query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Builder-style method to add a header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Builder-style method to set the body payload
    #[must_use]
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Builder-style method to set the body from any serializable value
    pub fn json<T: Serialize>(self, body: &T) -> ApiResult<Self> {
        Ok(self.data(serde_json::to_value(body)?))
    }

    /// Builder-style method to force the body encoding
    #[must_use]
    pub fn format(mut self, format: BodyFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Builder-style method to set authentication
    #[must_use]
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Builder-style method to set a timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builder-style method to opt this call out of token refresh with `false`
    #[must_use]
    pub fn refresh_token(mut self, refresh: bool) -> Self {
        self.refresh_token = Some(refresh);
        self
    }

    /// Build a `reqwest` request from these arguments
    pub(crate) fn build(&self, session: &Client, method: Method) -> ApiResult<RequestBuilder> {
        let url = self.url.as_deref().ok_or(ApiError::MissingUrl)?;
        let url =
            reqwest::Url::parse(url).map_err(|e| ApiError::InvalidUrl(format!("{url}: {e}")))?;

        let mut request = session.request(method, url);

        if !self.params.is_empty() {
            request = request.query(&self.params);
        }

        for (name, value) in &self.headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| ApiError::config(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| ApiError::config(format!("invalid header value for {name}: {e}")))?;
            request = request.header(name, value);
        }

        request = match &self.auth {
            Some(Auth::Bearer(token)) => request.bearer_auth(token),
            Some(Auth::Basic { username, password }) => {
                request.basic_auth(username, password.as_ref())
            }
            Some(Auth::Header { name, value }) => request.header(name.as_str(), value.as_str()),
            None => request,
        };

        if let Some(data) = &self.data {
            request = match self.format.unwrap_or_default() {
                BodyFormat::Json => request.json(data),
                BodyFormat::Form => request.form(data),
            };
        }

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        Ok(request)
    }

    /// Whether a content type header is already set
    pub(crate) fn has_content_type(&self) -> bool {
        self.headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case(CONTENT_TYPE.as_str()))
    }
}
