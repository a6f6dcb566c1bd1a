//! Error types for the API client
//!
//! Responses the adapter rejects become a [`ResponseError`]: a classified
//! error carrying the adapter's message and the client node built from the
//! error payload, so callers can inspect data, headers and status code.

use crate::client::Client;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the core crate
    #[error(transparent)]
    Core(#[from] apiwrap_core::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A request was issued from a node that isn't bound to a URL
    #[error("No URL to request: node data is not a URL")]
    MissingUrl,

    /// A URL template placeholder had no value
    #[error("Missing URL parameter: {0}")]
    MissingUrlParam(String),

    /// Attribute-style lookup found nothing
    #[error("No attribute or resource named '{0}'")]
    AttributeNotFound(String),

    /// Item-style lookup found nothing
    #[error("No item or resource for key {0}")]
    KeyNotFound(String),

    /// Iteration or length on data that is not a collection
    #[error("Cannot iterate over {0} data")]
    NotIterable(&'static str),

    /// The node has no response attached
    #[error("This instance has no response object")]
    NoResponse,

    /// Native conversion failed or no serializer is configured
    #[error("Serializer error: {0}")]
    Serializer(String),

    /// The adapter rejected a response; raised by `Adapter::process_response`
    /// and turned into [`ApiError::Response`] by the executor
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// A classified error response
    #[error(transparent)]
    Response(Box<ResponseError>),
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a serializer error
    pub fn serializer(msg: impl Into<String>) -> Self {
        Self::Serializer(msg.into())
    }

    /// The classified response error, if this is one
    #[must_use]
    pub fn response_error(&self) -> Option<&ResponseError> {
        match self {
            Self::Response(e) => Some(e),
            _ => None,
        }
    }

    /// Kind of the classified response error, if this is one
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Response(e) => Some(e.kind),
            Self::Process(e) => Some(e.kind),
            _ => None,
        }
    }

    /// HTTP status code of the failing response, if known
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Response(e) => e.status_code(),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_some_and(|s| (400..500).contains(&s))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_some_and(|s| s >= 500)
    }
}

/// Classification of an error response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Generic 4xx
    ClientError,
    /// 404
    NotFound,
    /// 400
    BadRequest,
    /// 429
    RateLimit,
    /// 401
    InvalidCredentials,
    /// 403
    AccessDenied,
    /// 5xx
    ServerError,
}

impl ErrorKind {
    /// Default classification of an HTTP status code; `None` for non-errors
    #[must_use]
    pub fn from_status(status: u16) -> Option<Self> {
        let kind = match status {
            400 => Self::BadRequest,
            401 => Self::InvalidCredentials,
            403 => Self::AccessDenied,
            404 => Self::NotFound,
            429 => Self::RateLimit,
            402..=499 => Self::ClientError,
            500..=599 => Self::ServerError,
            _ => return None,
        };
        Some(kind)
    }

    /// `NotFound` is a specialised client error
    #[must_use]
    pub fn is_client_error(self) -> bool {
        matches!(self, Self::ClientError | Self::NotFound)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ClientError => "client error",
            Self::NotFound => "not found",
            Self::BadRequest => "bad request",
            Self::RateLimit => "rate limit",
            Self::InvalidCredentials => "invalid credentials",
            Self::AccessDenied => "access denied",
            Self::ServerError => "server error",
        };
        f.write_str(name)
    }
}

/// Structured response-processing failure: the error kind to raise plus the
/// raw error payload
#[derive(Error, Debug, Clone, PartialEq)]
#[error("response rejected by adapter ({kind})")]
pub struct ProcessError {
    /// Kind of error to raise
    pub kind: ErrorKind,
    /// Parsed error payload (`null` when there is none)
    pub data: Value,
}

impl ProcessError {
    /// Create a processing failure
    #[must_use]
    pub fn new(kind: ErrorKind, data: Value) -> Self {
        Self { kind, data }
    }
}

/// A classified error response
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ResponseError {
    /// Classification
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// Node wrapping the error payload and the failing response
    pub client: Client,
    /// The processing failure this error was built from
    #[source]
    pub source: ProcessError,
}

impl ResponseError {
    /// Build a classified error. An empty message falls back to
    /// `response status code: <status>`.
    #[must_use]
    pub fn new(
        kind: ErrorKind,
        message: Option<String>,
        client: Client,
        source: ProcessError,
    ) -> Self {
        let message = match message {
            Some(m) if !m.is_empty() => m,
            _ => match client.status_code() {
                Ok(status) => format!("response status code: {status}"),
                Err(_) => format!("{kind} response"),
            },
        };
        Self {
            kind,
            message,
            client,
            source,
        }
    }

    /// Status code of the failing response
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.client.status_code().ok()
    }

    /// Error payload
    #[must_use]
    pub fn data(&self) -> &Value {
        self.client.data()
    }
}

impl From<ResponseError> for ApiError {
    fn from(err: ResponseError) -> Self {
        Self::Response(Box::new(err))
    }
}
