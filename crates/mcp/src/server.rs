//! MCP Server Implementation
//!
//! Adapts the [`ToolRegistry`] to the Model Context Protocol and hosts it over
//! streamable HTTP (mounted at `/mcp`, next to `/health`) or stdio.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use legion_core::config::{AppConfig, ServerConfig};
use rmcp::{
    model::{
        CallToolRequestParam, CallToolResult, Content, ErrorCode, ErrorData as McpError,
        Implementation, ListToolsResult, PaginatedRequestParam, ServerCapabilities, ServerInfo,
        Tool,
    },
    service::RequestContext,
    transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpService,
    },
    RoleServer, ServerHandler, ServiceExt,
};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::health::{self, HealthState};
use crate::registry::ToolRegistry;
use crate::tools::{build_registry, ToolContext};

const INSTRUCTIONS: &str = "Legion MCP Server - sales automation for AI agents. \
    Manage leads and deals, analyze calls, run outreach sequences, read dashboards \
    and forecasts, and follow deployments and issues on GitHub. \
    Every tool returns JSON text; failures come back as an object with an `error` field.";

/// Main MCP server for Legion
#[derive(Clone, Debug)]
pub struct LegionMcpServer {
    registry: Arc<ToolRegistry>,
    context: ToolContext,
    server: ServerConfig,
}

impl LegionMcpServer {
    pub fn new(registry: Arc<ToolRegistry>, context: ToolContext, server: ServerConfig) -> Self {
        Self { registry, context, server }
    }

    /// Builds the registry and the reqwest-backed clients from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let registry = build_registry().context("building tool registry")?;
        info!(
            event_name = "mcp.server.init",
            tools = registry.len(),
            backend = %config.backend.base_url,
            github_configured = config.github_configured(),
            "initializing legion mcp server"
        );
        Ok(Self::new(Arc::new(registry), ToolContext::from_config(config), config.server.clone()))
    }

    /// Tool listing as advertised to hosts, in registration order.
    pub fn tool_definitions(&self) -> Vec<Tool> {
        self.registry
            .descriptors()
            .iter()
            .map(|descriptor| {
                Tool::new(descriptor.name(), descriptor.description(), Arc::new(descriptor.input_schema()))
            })
            .collect()
    }

    /// Runs one tool call. Only an unknown tool name is a protocol error.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<&Map<String, Value>>,
    ) -> Result<CallToolResult, McpError> {
        match self.registry.invoke(&self.context, name, arguments).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(error) => {
                Err(McpError::new(ErrorCode(error.error_code()), error.to_string(), None))
            }
        }
    }

    /// `/mcp` streamable HTTP endpoint plus the `/health` liveness route.
    pub fn router(&self) -> Router {
        let server = self.clone();
        let mcp_service = StreamableHttpService::new(
            move || Ok(server.clone()),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        let health_state = HealthState {
            tool_count: self.registry.len(),
            github_configured: self.context.github.is_configured(),
            backend_url: self.context.backend.base_url().to_string(),
        };

        Router::new().nest_service("/mcp", mcp_service).merge(health::router(health_state))
    }

    /// Run the server over HTTP until Ctrl-C.
    pub async fn run_http(self) -> Result<()> {
        let address = format!("{}:{}", self.server.bind_address, self.server.port);
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .with_context(|| format!("binding {address}"))?;
        self.serve_http(listener, wait_for_ctrl_c()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves, then
    /// gives open streams `graceful_shutdown_secs` to finish.
    pub async fn serve_http(
        self,
        listener: tokio::net::TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let grace = Duration::from_secs(self.server.graceful_shutdown_secs);
        let local_address = listener.local_addr().context("reading bound address")?;
        let router = self.router();

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let serve = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            });
        let server = tokio::spawn(async move { serve.await });

        info!(
            event_name = "mcp.server.http.start",
            bind_address = %local_address,
            mcp_path = "/mcp",
            "mcp server listening"
        );

        shutdown.await;
        info!(event_name = "mcp.server.shutdown", "shutdown requested");
        let _ = shutdown_tx.send(true);

        match tokio::time::timeout(grace, server).await {
            Ok(joined) => joined.context("http server task panicked")?.context("http server failed")?,
            Err(_) => warn!(
                event_name = "mcp.server.shutdown_timeout",
                grace_secs = grace.as_secs(),
                "open connections did not close in time"
            ),
        }

        info!(event_name = "mcp.server.stopped", "MCP server shutdown complete");
        Ok(())
    }

    /// Run the server with stdio transport
    pub async fn run_stdio(self) -> Result<()> {
        use tokio::io::{stdin, stdout};

        info!(event_name = "mcp.server.stdio.start", "starting MCP server with stdio transport");

        let service = self.serve((stdin(), stdout())).await?;

        // Wait for shutdown
        let _quit = service.waiting().await?;

        info!(event_name = "mcp.server.stopped", "MCP server shutdown complete");
        Ok(())
    }
}

async fn wait_for_ctrl_c() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(event_name = "mcp.server.signal_error", error = %error, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

impl ServerHandler for LegionMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "legion-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(self.tool_definitions())))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move { self.dispatch(&request.name, request.arguments.as_ref()).await }
    }
}
