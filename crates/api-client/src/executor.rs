//! Request execution
//!
//! An [`Executor`] is a node that can issue HTTP requests. Every request goes
//! through the adapter to build its arguments and parse the response, honours
//! rate-limit headers, and is retried once after a successful credential
//! refresh when the adapter reports that authentication expired.

use crate::adapter::is_truthy;
use crate::client::{Client, Node};
use crate::error::{ApiError, ApiResult, ProcessError, ResponseError};
use crate::pages::{PageLimits, Pages};
use crate::request::RequestKwargs;
use crate::response::ApiResponse;
use crate::serializer::Serializer;
use apiwrap_core::config::Resource;
use apiwrap_core::retry::Attempt;
use chrono::{DateTime, FixedOffset};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Result of a single HTTP round trip
enum Outcome {
    Accepted {
        data: Value,
        response: Arc<ApiResponse>,
        kwargs: RequestKwargs,
    },
    Rejected {
        error: ProcessError,
        response: Arc<ApiResponse>,
        kwargs: RequestKwargs,
    },
}

/// A node that issues requests
#[derive(Clone)]
pub struct Executor {
    node: Node,
}

impl Executor {
    pub(crate) fn from_node(node: Node) -> Self {
        Self { node }
    }

    pub(crate) fn node(&self) -> &Node {
        &self.node
    }

    /// Bound data; the request URL for resource executors
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.node.data
    }

    /// Bound URL, if the data is one
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.node.data.as_str()
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

    /// Refresh data from the last token refresh this executor ran, or the
    /// one it was created with
    #[must_use]
    pub fn refresh_data(&self) -> Option<Value> {
        self.node.refresh_data.get()
    }

    /// The resource this executor is bound to
    #[must_use]
    pub fn resource(&self) -> Option<&Resource> {
        self.node.resource.as_deref()
    }

    /// Generated documentation of the bound resource
    #[must_use]
    pub fn docs(&self) -> Option<String> {
        self.node.docs()
    }

    /// Documentation URL of the bound resource, when one is declared
    #[must_use]
    pub fn docs_url(&self) -> Option<&str> {
        self.node
            .resource
            .as_ref()
            .map(|r| r.docs.as_str())
            .filter(|docs| !docs.is_empty())
    }

    /// Back to a navigable node over the same data
    #[must_use]
    pub fn client(&self) -> Client {
        Client::from_node(self.node.detached())
    }

    /// `GET`
    pub async fn get(&self, kwargs: RequestKwargs) -> ApiResult<Client> {
        self.request(Method::GET, kwargs).await
    }

    /// `POST`
    pub async fn post(&self, kwargs: RequestKwargs) -> ApiResult<Client> {
        self.request(Method::POST, kwargs).await
    }

    /// `PUT`
    pub async fn put(&self, kwargs: RequestKwargs) -> ApiResult<Client> {
        self.request(Method::PUT, kwargs).await
    }

    /// `PATCH`
    pub async fn patch(&self, kwargs: RequestKwargs) -> ApiResult<Client> {
        self.request(Method::PATCH, kwargs).await
    }

    /// `DELETE`
    pub async fn delete(&self, kwargs: RequestKwargs) -> ApiResult<Client> {
        self.request(Method::DELETE, kwargs).await
    }

    /// `OPTIONS`
    pub async fn options(&self, kwargs: RequestKwargs) -> ApiResult<Client> {
        self.request(Method::OPTIONS, kwargs).await
    }

    /// Issue a request.
    ///
    /// Error responses become [`ApiError::Response`]. When the client
    /// refreshes tokens by default, the call doesn't opt out and the adapter
    /// reports expired credentials, the refresh result is stored as this
    /// executor's refresh data and a truthy result retries the request
    /// exactly once.
    #[instrument(skip_all, fields(request_id, method = %method))]
    pub async fn request(&self, method: Method, kwargs: RequestKwargs) -> ApiResult<Client> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let ctx = &self.node.ctx;
        let refresh_enabled = ctx.refresh_token_default && kwargs.refresh_token != Some(false);
        let mut refresh_data = self.node.refresh_data.get();
        let mut attempt = Attempt::First;

        loop {
            match self.send(&request_id, &method, &kwargs, attempt).await? {
                Outcome::Accepted {
                    data,
                    response,
                    kwargs,
                } => {
                    let node = self.node.wrap_response(data, response, kwargs, refresh_data);
                    return Ok(Client::from_node(node));
                }
                Outcome::Rejected {
                    error,
                    response,
                    kwargs,
                } => {
                    let message = ctx.adapter.get_error_message(&error.data, &response);
                    let client = Client::from_node(self.node.wrap_response(
                        error.data.clone(),
                        response,
                        kwargs,
                        refresh_data.clone(),
                    ));
                    let err = ResponseError::new(error.kind, message, client, error);

                    let retry = if refresh_enabled
                        && attempt.may_refresh()
                        && ctx.adapter.is_authentication_expired(&err)
                    {
                        refresh_data = self.refresh(&request_id, &err).await?;
                        if refresh_data.as_ref().is_some_and(is_truthy) {
                            attempt.next()
                        } else {
                            warn!(
                                request_id = %request_id,
                                "Token refresh returned nothing, not retrying"
                            );
                            None
                        }
                    } else {
                        None
                    };

                    match retry {
                        Some(next) => attempt = next,
                        None => {
                            debug!(
                                request_id = %request_id,
                                kind = %err.kind,
                                error = %err,
                                "Request rejected"
                            );
                            return Err(err.into());
                        }
                    }
                }
            }
        }
    }

    /// Refresh credentials and write the result back to this executor
    async fn refresh(
        &self,
        request_id: &str,
        rejected: &ResponseError,
    ) -> ApiResult<Option<Value>> {
        let ctx = &self.node.ctx;
        warn!(
            request_id = %request_id,
            status = rejected.status_code(),
            "Authentication expired, refreshing"
        );

        let refreshed = match ctx.adapter.refresh_authentication(&ctx.api_params).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                warn!(
                    request_id = %request_id,
                    status = rejected.status_code(),
                    rejected = %rejected,
                    error = %e,
                    "Token refresh failed"
                );
                return Err(e);
            }
        };

        self.node.refresh_data.set(refreshed.clone());
        Ok(refreshed)
    }

    /// One HTTP round trip: build, send, throttle, parse
    async fn send(
        &self,
        request_id: &str,
        method: &Method,
        kwargs: &RequestKwargs,
        attempt: Attempt,
    ) -> ApiResult<Outcome> {
        let ctx = &self.node.ctx;

        let mut kwargs = kwargs.clone();
        if kwargs.url.is_none() {
            kwargs.url = Some(self.url().ok_or(ApiError::MissingUrl)?.to_string());
        }
        if let (Some(data), Some(serializer)) = (kwargs.data.as_mut(), &ctx.serializer) {
            *data = serializer.serialize(data.take());
        }
        let kwargs = ctx
            .adapter
            .get_request_kwargs(&ctx.api_params, method, kwargs)?;

        let start = Instant::now();
        let response = kwargs.build(&ctx.session, method.clone())?.send().await?;
        let response = Arc::new(ApiResponse::from_reqwest(response).await?);

        debug!(
            request_id = %request_id,
            attempt = attempt.number(),
            url = %response.url(),
            status = response.status_code(),
            elapsed_ms = start.elapsed().as_millis(),
            "Request completed"
        );

        let rate_limit = response.rate_limit();
        if let Some(delay) = ctx.throttle.delay_for(&rate_limit) {
            warn!(
                request_id = %request_id,
                remaining = rate_limit.remaining,
                reset = rate_limit.reset,
                delay_ms = delay.as_millis(),
                "Rate limit threshold reached, throttling"
            );
            tokio::time::sleep(delay).await;
        }

        match ctx.adapter.process_response(&response) {
            Ok(data) => Ok(Outcome::Accepted {
                data,
                response,
                kwargs,
            }),
            Err(ApiError::Process(error)) => Ok(Outcome::Rejected {
                error,
                response,
                kwargs,
            }),
            Err(e) => Err(e),
        }
    }

    /// Iterate over the items of this page and the pages after it
    #[must_use]
    pub fn pages(&self, limits: PageLimits) -> Pages {
        Pages::new(self.clone(), limits)
    }

    fn serializer(&self) -> ApiResult<&dyn Serializer> {
        self.node
            .ctx
            .serializer
            .as_deref()
            .ok_or_else(|| ApiError::serializer("no serializer configured"))
    }

    /// Bound data as a date-time, through the configured serializer
    pub fn to_datetime(&self) -> ApiResult<DateTime<FixedOffset>> {
        self.serializer()?.to_datetime(&self.node.data)
    }

    /// Bound data as a decimal, through the configured serializer
    pub fn to_decimal(&self) -> ApiResult<Decimal> {
        self.serializer()?.to_decimal(&self.node.data)
    }

    /// Bound data deserialized into `T`
    pub fn to<T: DeserializeOwned>(&self) -> ApiResult<T> {
        Ok(serde_json::from_value(self.node.data.clone())?)
    }
}

impl fmt::Display for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.fmt_named("Executor", f)
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("node", &self.node)
            .finish()
    }
}
