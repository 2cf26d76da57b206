//! Client for the Legion backend's tRPC surface.
//!
//! Endpoints live under `{base_url}/api/trpc/<dotted.path>`. Queries are GETs
//! carrying their input as a JSON-encoded `input` query parameter; mutations
//! are POSTs with a JSON body. Both share one request builder and differ only
//! in verb, timeout tier and payload placement.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::errors::TransportError;
use crate::transport::{HttpTransport, OutboundRequest, OutboundResponse};

const TRPC_PREFIX: &str = "/api/trpc/";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CallKind {
    Query,
    Mutation,
}

impl CallKind {
    fn method(self) -> Method {
        match self {
            Self::Query => Method::GET,
            Self::Mutation => Method::POST,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
        }
    }
}

#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    auth_token: Option<SecretString>,
    query_timeout: Duration,
    mutation_timeout: Duration,
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.auth_token.is_some())
            .field("query_timeout", &self.query_timeout)
            .field("mutation_timeout", &self.mutation_timeout)
            .finish()
    }
}

impl RpcClient {
    pub fn new(config: &BackendConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            query_timeout: Duration::from_secs(config.query_timeout_secs),
            mutation_timeout: Duration::from_secs(config.mutation_timeout_secs),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{TRPC_PREFIX}{endpoint}", self.base_url)
    }

    /// Read-path call. An absent input, or an empty object, sends no `input`
    /// parameter at all.
    pub async fn query(&self, endpoint: &str, input: Option<&Value>) -> Result<Value, TransportError> {
        self.send(CallKind::Query, endpoint, input).await.map(|response| response.body)
    }

    /// Write-path call on the long timeout tier.
    pub async fn mutation(&self, endpoint: &str, input: &Value) -> Result<Value, TransportError> {
        self.send(CallKind::Mutation, endpoint, Some(input)).await.map(|response| response.body)
    }

    /// Input-less query that keeps the HTTP status alongside the body.
    pub async fn status_check(&self, endpoint: &str) -> Result<OutboundResponse, TransportError> {
        self.send(CallKind::Query, endpoint, None).await
    }

    async fn send(
        &self,
        kind: CallKind,
        endpoint: &str,
        input: Option<&Value>,
    ) -> Result<OutboundResponse, TransportError> {
        let request = self.build_request(kind, endpoint, input);
        debug!(
            event_name = "backend.rpc.request",
            kind = kind.as_str(),
            endpoint,
            "sending backend call"
        );

        match self.transport.execute(request).await {
            Ok(response) => {
                debug!(
                    event_name = "backend.rpc.response",
                    kind = kind.as_str(),
                    endpoint,
                    status = response.status,
                    "backend call completed"
                );
                Ok(response)
            }
            Err(error) => {
                warn!(
                    event_name = "backend.rpc.failed",
                    kind = kind.as_str(),
                    endpoint,
                    error_class = error.class(),
                    error = %error,
                    "backend call failed"
                );
                Err(error)
            }
        }
    }

    fn build_request(&self, kind: CallKind, endpoint: &str, input: Option<&Value>) -> OutboundRequest {
        let timeout = match kind {
            CallKind::Query => self.query_timeout,
            CallKind::Mutation => self.mutation_timeout,
        };
        let mut request = OutboundRequest::new(kind.method(), self.endpoint_url(endpoint), timeout);

        match kind {
            CallKind::Query => {
                if let Some(input) = input.filter(|value| !is_empty_input(value)) {
                    request = request.with_query("input", input.to_string());
                }
            }
            CallKind::Mutation => {
                request = request
                    .with_header("Content-Type", "application/json")
                    .with_body(input.cloned().unwrap_or(Value::Null));
            }
        }

        if let Some(token) = &self.auth_token {
            request = request.with_header("Cookie", format!("token={}", token.expose_secret()));
        }

        request
    }
}

fn is_empty_input(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use reqwest::Method;
    use serde_json::{json, Value};

    use crate::config::AppConfig;
    use crate::errors::TransportError;
    use crate::rpc::RpcClient;
    use crate::testing::MockTransport;

    fn client_with(transport: Arc<MockTransport>, token: Option<&str>) -> RpcClient {
        let mut backend = AppConfig::default().backend;
        backend.base_url = "https://legion.test/".to_string();
        backend.auth_token = token.map(|value| value.to_string().into());
        RpcClient::new(&backend, transport)
    }

    #[tokio::test]
    async fn query_encodes_input_as_json_query_parameter() {
        let transport = Arc::new(MockTransport::json(200, json!({"result": {"data": []}})));
        let client = client_with(transport.clone(), None);

        let body = client
            .query("leads.list", Some(&json!({"limit": 5, "offset": 10})))
            .await
            .expect("query should succeed");

        assert_eq!(body, json!({"result": {"data": []}}));
        let request = transport.last_request().expect("request recorded");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "https://legion.test/api/trpc/leads.list");
        assert_eq!(request.timeout, Duration::from_secs(30));
        assert!(request.body.is_none());

        let encoded = request.query_param("input").expect("input parameter");
        let decoded: Value = serde_json::from_str(encoded).expect("input is JSON");
        assert_eq!(decoded, json!({"limit": 5, "offset": 10}));
    }

    #[tokio::test]
    async fn query_without_input_sends_no_parameters() {
        let transport = Arc::new(MockTransport::json(200, json!({})));
        let client = client_with(transport.clone(), None);

        client.query("crm.deals.list", None).await.expect("query should succeed");
        client.query("callIntelligence.stats", Some(&json!({}))).await.expect("query should succeed");

        for request in transport.requests() {
            assert!(request.query.is_empty(), "no input parameter expected for {}", request.url);
            assert!(request.header("Cookie").is_none());
        }
    }

    #[tokio::test]
    async fn mutation_posts_json_body_on_long_tier() {
        let transport = Arc::new(MockTransport::echo());
        let client = client_with(transport.clone(), Some("jwt-123"));

        let body = client
            .mutation("leads.create", &json!({"name": "Ana"}))
            .await
            .expect("mutation should succeed");

        assert_eq!(body, json!({"result": {"name": "Ana"}}));
        let request = transport.last_request().expect("request recorded");
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.timeout, Duration::from_secs(60));
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("cookie"), Some("token=jwt-123"));
        assert!(request.query.is_empty());
    }

    #[tokio::test]
    async fn backend_error_bodies_pass_through() {
        let error_body = json!({"error": {"json": {"message": "UNAUTHORIZED", "code": -32001}}});
        let transport = Arc::new(MockTransport::json(401, error_body.clone()));
        let client = client_with(transport, None);

        let body = client.query("auth.me", None).await.expect("non-2xx JSON is not a transport error");

        assert_eq!(body, error_body);
    }

    #[tokio::test]
    async fn status_check_reports_status_code() {
        let transport = Arc::new(MockTransport::json(204, json!(null)));
        let client = client_with(transport, Some("jwt"));

        let response = client.status_check("auth.me").await.expect("status check should succeed");

        assert_eq!(response.status, 204);
    }

    #[tokio::test]
    async fn transport_failures_surface_as_errors() {
        let client = client_with(Arc::new(MockTransport::unreachable()), None);

        let error = client.query("leads.list", None).await.expect_err("should fail");

        assert!(matches!(error, TransportError::Connect { ref url, .. } if url.ends_with("leads.list")));
    }
}
