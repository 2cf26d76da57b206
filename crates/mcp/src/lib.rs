//! Legion MCP (Model Context Protocol) Server
//!
//! This crate exposes the Legion sales-automation backend as MCP tools so AI
//! agents can work leads, deals, call intelligence, sequences and forecasts,
//! and check deployments and issues on GitHub.
//!
//! ## Architecture
//!
//! - `registry`: operation descriptors (name, parameter schema, handler) and
//!   the name → descriptor map the server dispatches through
//! - `arguments`: coercion of caller arguments against a parameter schema
//! - `tools/`: the operations, grouped by category (crm, calls, sequences,
//!   analytics, system, github)
//! - `LegionMcpServer`: rmcp handler adapting the registry, hosted over
//!   streamable HTTP or stdio
//!
//! Every tool returns pretty-printed JSON text. Failures inside a tool become
//! structured `{"error": ...}` documents instead of protocol errors.
//!
//! ## Example Usage
//!
//! ```no_run
//! use legion_core::config::{AppConfig, LoadOptions};
//! use legion_mcp::LegionMcpServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load(LoadOptions::default())?;
//!     let server = LegionMcpServer::from_config(&config)?;
//!     server.run_stdio().await
//! }
//! ```

pub mod arguments;
pub mod health;
pub mod registry;
mod server;
pub mod tools;

pub use registry::{
    render_result, OperationDescriptor, ParamSpec, ParamType, RegistryError, ToolCategory,
    ToolRegistry,
};
pub use server::LegionMcpServer;
pub use tools::{build_registry, ToolContext};

use legion_core::TransportError;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors raised inside a single tool invocation
#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{0} not configured")]
    ConfigurationMissing(&'static str),

    #[error("invalid argument `{name}`: {message}")]
    MalformedArgument { name: String, message: String },

    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolError {
    pub fn malformed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedArgument { name: name.into(), message: message.into() }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            ToolError::Transport(_) => "transport",
            ToolError::ConfigurationMissing(_) => "configuration_missing",
            ToolError::MalformedArgument { .. } => "malformed_argument",
            ToolError::UnknownTool(_) => "unknown_tool",
        }
    }

    /// JSON-RPC code used when the error surfaces as a protocol error.
    pub fn error_code(&self) -> i32 {
        match self {
            ToolError::UnknownTool(_) | ToolError::MalformedArgument { .. } => -32602,
            ToolError::ConfigurationMissing(_) => -32001,
            ToolError::Transport(_) => -32603,
        }
    }

    /// The structured error document returned to the host as a normal result.
    pub fn to_value(&self) -> Value {
        match self {
            ToolError::ConfigurationMissing(_) => json!({ "error": self.to_string() }),
            ToolError::MalformedArgument { name, .. } => json!({
                "error": self.to_string(),
                "error_class": self.error_class(),
                "argument": name,
            }),
            ToolError::Transport(_) | ToolError::UnknownTool(_) => json!({
                "error": self.to_string(),
                "error_class": self.error_class(),
            }),
        }
    }
}

/// Result type for tool handlers
pub type ToolResult<T = Value> = Result<T, ToolError>;
