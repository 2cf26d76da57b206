//! HTTP seam shared by the backend and GitHub clients.
//!
//! Clients describe a call as an [`OutboundRequest`] and hand it to an
//! [`HttpTransport`]. Production uses [`ReqwestTransport`]; tests substitute a
//! recording transport.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::errors::TransportError;

#[derive(Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl OutboundRequest {
    pub fn new(method: Method, url: impl Into<String>, timeout: Duration) -> Self {
        Self { method, url: url.into(), query: Vec::new(), headers: Vec::new(), body: None, timeout }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }

    /// Header lookup is case-insensitive, matching HTTP semantics.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

// Header values carry credentials, so only names are printed.
impl fmt::Debug for OutboundRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("OutboundRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &header_names)
            .field("body", &self.body)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutboundResponse {
    pub status: u16,
    pub body: Value,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs one request/response cycle. Any HTTP status with a JSON body
    /// is a success; only transport and decoding failures are errors.
    async fn execute(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError>;
}

#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError> {
        let OutboundRequest { method, url, query, headers, body, timeout } = request;

        let mut builder = self.client.request(method.clone(), &url).timeout(timeout);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response =
            builder.send().await.map_err(|error| TransportError::from_reqwest(&url, &error))?;
        let status = response.status().as_u16();
        let bytes =
            response.bytes().await.map_err(|error| TransportError::from_reqwest(&url, &error))?;
        let body = serde_json::from_slice::<Value>(&bytes)
            .map_err(|error| TransportError::Decode { url: url.clone(), message: error.to_string() })?;

        debug!(
            event_name = "transport.http.completed",
            method = %method,
            url = %url,
            status,
            "outbound request completed"
        );

        Ok(OutboundResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::Method;

    use crate::transport::OutboundRequest;

    #[test]
    fn debug_output_hides_header_values() {
        let request = OutboundRequest::new(Method::GET, "https://legion.test", Duration::from_secs(1))
            .with_header("Cookie", "token=super-secret");

        let debug = format!("{request:?}");

        assert!(debug.contains("Cookie"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let request = OutboundRequest::new(Method::GET, "https://legion.test", Duration::from_secs(1))
            .with_header("Authorization", "Bearer abc");

        assert_eq!(request.header("authorization"), Some("Bearer abc"));
        assert_eq!(request.header("accept"), None);
    }
}
