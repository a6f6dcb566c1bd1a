//! Buffered HTTP responses
//!
//! The body is read eagerly so adapters can inspect the response
//! synchronously and nodes can keep it around.

use crate::error::ApiResult;
use apiwrap_core::rate_limit::{RateLimitStatus, REMAINING_HEADER, RESET_HEADER};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// A fully-read HTTP response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    url: String,
    body: Vec<u8>,
}

impl ApiResponse {
    /// Create a response from its parts
    #[must_use]
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        url: impl Into<String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            status,
            headers,
            url: url.into(),
            body,
        }
    }

    /// Read a `reqwest` response to completion
    pub async fn from_reqwest(response: reqwest::Response) -> ApiResult<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().to_string();
        let body = response.bytes().await?.to_vec();
        Ok(Self::new(status, headers, url, body))
    }

    /// HTTP status
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// HTTP status code
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as a string, if present and valid UTF-8
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Final URL of the request
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw body
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, lossily
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Whether the body is empty or only whitespace
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Body deserialized from JSON
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Rate-limit values reported by this response
    #[must_use]
    pub fn rate_limit(&self) -> RateLimitStatus {
        RateLimitStatus::from_headers(self.header(REMAINING_HEADER), self.header(RESET_HEADER))
    }
}
