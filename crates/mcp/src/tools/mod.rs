//! MCP Tools for Legion
//!
//! Tools are grouped by category:
//! - CRM: leads and deals
//! - Calls: call intelligence and boardroom debates
//! - Sequences: outreach sequences and enrollment
//! - Analytics: dashboard, forecast and campaigns
//! - System: backend health and the database placeholder
//! - GitHub: commits and issues of the backend repository

mod analytics;
mod calls;
mod crm;
pub mod github;
mod sequences;
mod system;

use std::sync::Arc;

use legion_core::config::AppConfig;
use legion_core::{GitHubClient, HttpTransport, ReqwestTransport, RpcClient};
use serde_json::{json, Value};

use crate::registry::{OperationDescriptor, RegistryError, ToolRegistry};
use crate::ToolResult;

/// Shared clients handed to every handler. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct ToolContext {
    pub backend: Arc<RpcClient>,
    pub github: Arc<GitHubClient>,
}

impl ToolContext {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(config: &AppConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            backend: Arc::new(RpcClient::new(&config.backend, transport.clone())),
            github: Arc::new(GitHubClient::new(&config.github, transport)),
        }
    }
}

/// Every tool, in the order `tools/list` reports them.
pub fn all_descriptors() -> Vec<OperationDescriptor> {
    let mut descriptors = Vec::new();
    descriptors.extend(crm::descriptors());
    descriptors.extend(calls::descriptors());
    descriptors.extend(sequences::descriptors());
    descriptors.extend(analytics::descriptors());
    descriptors.extend(system::descriptors());
    descriptors.extend(github::descriptors());
    descriptors
}

pub fn build_registry() -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    for descriptor in all_descriptors() {
        registry.register(descriptor)?;
    }
    Ok(registry)
}

/// Some backend procedures expect their input under a `json` key.
pub(crate) fn json_wrapped(input: Value) -> Value {
    json!({ "json": input })
}

pub(crate) async fn query(context: &ToolContext, endpoint: &str, input: Option<Value>) -> ToolResult {
    Ok(context.backend.query(endpoint, input.as_ref()).await?)
}

pub(crate) async fn mutation(context: &ToolContext, endpoint: &str, input: Value) -> ToolResult {
    Ok(context.backend.mutation(endpoint, &input).await?)
}

/// Runs one tool through a fresh registry over `transport` and parses its output.
#[cfg(test)]
pub(crate) async fn call_with(
    transport: &Arc<legion_core::testing::MockTransport>,
    tool: &str,
    args: Value,
) -> Value {
    let context = ToolContext::with_transport(&AppConfig::default(), transport.clone());
    let registry = build_registry().expect("registry");
    let raw: serde_json::Map<String, Value> = serde_json::from_value(args).expect("object arguments");
    let text = registry.invoke(&context, tool, Some(&raw)).await.expect("known tool");
    serde_json::from_str(&text).expect("tool output is JSON")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::registry::ToolCategory;
    use crate::tools::build_registry;

    #[test]
    fn test_tool_counts() {
        let registry = build_registry().expect("tool names are unique");

        assert_eq!(registry.in_category(ToolCategory::Crm).len(), 6);
        assert_eq!(registry.in_category(ToolCategory::CallIntelligence).len(), 4);
        assert_eq!(registry.in_category(ToolCategory::Sequences).len(), 3);
        assert_eq!(registry.in_category(ToolCategory::Analytics).len(), 3);
        assert_eq!(registry.in_category(ToolCategory::System).len(), 2);
        assert_eq!(registry.in_category(ToolCategory::GitHub).len(), 3);
        assert_eq!(registry.len(), 21);
    }

    #[test]
    fn every_tool_is_prefixed_and_described() {
        let registry = build_registry().expect("tool names are unique");
        let names: HashSet<_> = registry.names().into_iter().collect();

        assert_eq!(names.len(), registry.len());
        for descriptor in registry.descriptors() {
            assert!(descriptor.name().starts_with("legion_"), "{}", descriptor.name());
            assert!(!descriptor.description().is_empty(), "{}", descriptor.name());
        }
    }

    #[test]
    fn registration_order_starts_with_crm() {
        let registry = build_registry().expect("tool names are unique");

        assert_eq!(&registry.names()[..2], &["legion_list_leads", "legion_create_lead"]);
        assert_eq!(registry.names().last(), Some(&"legion_create_issue"));
    }
}
