//! Minimal GitHub REST client scoped to a single repository.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::GitHubConfig;
use crate::errors::TransportError;
use crate::transport::{HttpTransport, OutboundRequest};

pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";
pub const GITHUB_API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("legion-mcp/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    api_base_url: String,
    repository: String,
    token: Option<SecretString>,
    timeout: Duration,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base_url", &self.api_base_url)
            .field("repository", &self.repository)
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl GitHubClient {
    /// Name of the credential, as reported when it is missing.
    pub const TOKEN_NAME: &'static str = "GITHUB_TOKEN";

    pub fn new(config: &GitHubConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            api_base_url: config.api_base_url.trim().trim_end_matches('/').to_string(),
            repository: config.repository.trim().to_string(),
            token: config.token.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    pub fn repository_url(&self, path: &str) -> String {
        format!("{}/repos/{}{path}", self.api_base_url, self.repository)
    }

    /// Issues one call against the repository. Query pairs are percent-encoded
    /// by the transport. GET never carries a body; other verbs send `data` as
    /// JSON when present.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        data: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let mut request = OutboundRequest::new(method.clone(), self.repository_url(path), self.timeout);
        for (key, value) in query {
            request = request.with_query(*key, value.as_str());
        }
        request = request
            .with_header("Accept", GITHUB_ACCEPT)
            .with_header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .with_header("User-Agent", USER_AGENT);

        if let Some(token) = &self.token {
            request = request.with_header("Authorization", format!("Bearer {}", token.expose_secret()));
        }
        if method != Method::GET {
            if let Some(data) = data {
                request = request.with_body(data.clone());
            }
        }

        debug!(event_name = "github.request", method = %method, path, "sending github call");
        match self.transport.execute(request).await {
            Ok(response) => Ok(response.body),
            Err(error) => {
                warn!(
                    event_name = "github.failed",
                    method = %method,
                    path,
                    error_class = error.class(),
                    error = %error,
                    "github call failed"
                );
                Err(error)
            }
        }
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, TransportError> {
        self.call(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, data: &Value) -> Result<Value, TransportError> {
        self.call(Method::POST, path, &[], Some(data)).await
    }

    pub async fn patch(&self, path: &str, data: &Value) -> Result<Value, TransportError> {
        self.call(Method::PATCH, path, &[], Some(data)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::Method;
    use serde_json::json;

    use crate::config::AppConfig;
    use crate::github::GitHubClient;
    use crate::testing::MockTransport;

    fn client_with(transport: Arc<MockTransport>, token: Option<&str>) -> GitHubClient {
        let mut github = AppConfig::default().github;
        github.api_base_url = "https://github.test/".to_string();
        github.repository = "acme/legion".to_string();
        github.token = token.map(|value| value.to_string().into());
        GitHubClient::new(&github, transport)
    }

    #[tokio::test]
    async fn get_builds_repository_scoped_url_with_headers() {
        let transport = Arc::new(MockTransport::json(200, json!([])));
        let client = client_with(transport.clone(), Some("ghp_abc"));

        client.get("/commits", &[("per_page", "5".to_string())]).await.expect("get should succeed");

        let request = transport.last_request().expect("request recorded");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "https://github.test/repos/acme/legion/commits");
        assert_eq!(request.query_param("per_page"), Some("5"));
        assert_eq!(request.header("authorization"), Some("Bearer ghp_abc"));
        assert_eq!(request.header("accept"), Some("application/vnd.github+json"));
        assert_eq!(request.header("x-github-api-version"), Some("2022-11-28"));
        assert!(request.header("user-agent").is_some_and(|agent| agent.starts_with("legion-mcp/")));
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn write_verbs_carry_json_body() {
        let transport = Arc::new(MockTransport::echo());
        let client = client_with(transport.clone(), Some("ghp_abc"));

        client.post("/issues", &json!({"title": "Bug"})).await.expect("post should succeed");
        client.patch("/issues/3", &json!({"state": "closed"})).await.expect("patch should succeed");
        client
            .call(Method::PUT, "/issues/3/lock", &[], Some(&json!({"lock_reason": "resolved"})))
            .await
            .expect("generic verb should succeed");

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].body, Some(json!({"title": "Bug"})));
        assert_eq!(requests[1].method, Method::PATCH);
        assert_eq!(requests[1].body, Some(json!({"state": "closed"})));
        assert_eq!(requests[2].method, Method::PUT);
        assert_eq!(requests[2].body, Some(json!({"lock_reason": "resolved"})));
    }

    #[tokio::test]
    async fn query_values_stay_out_of_the_path() {
        let transport = Arc::new(MockTransport::json(200, json!([])));
        let client = client_with(transport.clone(), Some("ghp_abc"));

        client
            .get("/issues", &[("state", "closed&per_page=100#".to_string()), ("per_page", "20".to_string())])
            .await
            .expect("get should succeed");

        let request = transport.last_request().expect("request recorded");
        assert_eq!(request.url, "https://github.test/repos/acme/legion/issues");
        assert_eq!(request.query_param("state"), Some("closed&per_page=100#"));
        assert_eq!(request.query_param("per_page"), Some("20"));
    }

    #[test]
    fn configuration_follows_token_presence() {
        let unconfigured = client_with(Arc::new(MockTransport::json(200, json!({}))), None);
        let configured = client_with(Arc::new(MockTransport::json(200, json!({}))), Some("ghp"));

        assert!(!unconfigured.is_configured());
        assert!(configured.is_configured());
        assert!(!format!("{configured:?}").contains("ghp"));
    }
}
