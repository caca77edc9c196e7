//! HTTP transports.
//!
//! The service never discovers a transport on its own: callers hand it an
//! [`HttpClient`], which may also expose an [`AsyncHttpClient`] through
//! [`HttpClient::as_async`].

use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;
use std::time::Duration;

use crate::errors::TransportError;
use crate::message::{Request, Response};

/// Boxed future returned by [`AsyncHttpClient::send_async_request`].
pub type ResponseFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Response, TransportError>> + Send + 'a>>;

/// Blocking transport.
pub trait HttpClient: Send + Sync {
    fn send_request(&self, request: &Request) -> Result<Response, TransportError>;

    /// The non-blocking side of this transport, if it has one.
    fn as_async(&self) -> Option<&dyn AsyncHttpClient> {
        None
    }

    /// Name used in error messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Non-blocking transport.
pub trait AsyncHttpClient: Send + Sync {
    fn send_async_request<'a>(&'a self, request: &'a Request) -> ResponseFuture<'a>;
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `reqwest`-backed transport supporting both call shapes.
///
/// The blocking client is only created on the first blocking send, so a
/// `ReqwestClient` used from async code never owns one.
///
/// Blocking sends go through `reqwest::blocking`, which panics when run on an
/// async executor thread. Inside a tokio runtime use
/// [`ApiService::call_async`](crate::ApiService::call_async), or move the
/// whole service into `tokio::task::spawn_blocking` (it must also be dropped
/// there once the blocking client exists).
pub struct ReqwestClient {
    client: reqwest::Client,
    blocking: OnceLock<reqwest::blocking::Client>,
    timeout: Duration,
}

impl ReqwestClient {
    /// Creates a client with a 30-second timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent())
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                TransportError::Network(e)
            })?;
        Ok(Self {
            client,
            blocking: OnceLock::new(),
            timeout,
        })
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client, TransportError> {
        if let Some(client) = self.blocking.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent())
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build blocking HTTP client: {}", e);
                TransportError::Network(e)
            })?;
        // Another thread may have won the race; either client will do.
        let _ = self.blocking.set(client);
        self.blocking
            .get()
            .ok_or_else(|| TransportError::Other("blocking client unavailable".to_string()))
    }
}

impl HttpClient for ReqwestClient {
    fn send_request(&self, request: &Request) -> Result<Response, TransportError> {
        let mut builder = self
            .blocking_client()?
            .request(request.method().clone(), request.uri().clone())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.to_string());
        }
        let resp = builder.send().map_err(|e| {
            tracing::error!("Failed to send {} {}: {}", request.method(), request.uri(), e);
            TransportError::Network(e)
        })?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text().map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            TransportError::Body(e.to_string())
        })?;
        Ok(Response::new(status, headers, body))
    }

    fn as_async(&self) -> Option<&dyn AsyncHttpClient> {
        Some(self)
    }

    fn name(&self) -> &str {
        "ReqwestClient"
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn send_async_request<'a>(&'a self, request: &'a Request) -> ResponseFuture<'a> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method().clone(), request.uri().clone())
                .headers(request.headers().clone());
            if let Some(body) = request.body() {
                builder = builder.body(body.to_string());
            }
            let resp = builder.send().await.map_err(|e| {
                tracing::error!("Failed to send {} {}: {}", request.method(), request.uri(), e);
                TransportError::Network(e)
            })?;

            let status = resp.status();
            let headers = resp.headers().clone();
            let body = resp.text().await.map_err(|e| {
                tracing::error!("Failed to read response body: {}", e);
                TransportError::Body(e.to_string())
            })?;
            Ok(Response::new(status, headers, body))
        })
    }
}

fn user_agent() -> String {
    format!("openapi_service/{}", env!("CARGO_PKG_VERSION"))
}
