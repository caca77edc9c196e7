//! Transport-neutral HTTP request and response values.

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use url::Url;

/// Caller-supplied operation parameters, keyed by declared parameter name.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// A fully built request, ready to hand to an [`HttpClient`](crate::HttpClient).
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Url,
    headers: HeaderMap,
    body: Option<String>,
}

impl Request {
    pub fn new(method: Method, uri: Url, headers: HeaderMap, body: Option<String>) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// All values of a header joined with `", "`. Empty when absent.
    pub fn header_line(&self, name: &str) -> String {
        header_line(&self.headers, name)
    }

    pub fn content_type(&self) -> String {
        self.header_line(CONTENT_TYPE.as_str())
    }
}

/// A response as received from the transport.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// All values of a header joined with `", "`. Empty when absent.
    pub fn header_line(&self, name: &str) -> String {
        header_line(&self.headers, name)
    }

    pub fn content_type(&self) -> String {
        self.header_line(CONTENT_TYPE.as_str())
    }

    /// Returns each value of `name` separately, in received order.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }
}

fn header_line(headers: &HeaderMap, name: &str) -> String {
    headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join(", ")
}
