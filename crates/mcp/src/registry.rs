//! Operation registry
//!
//! Each tool is an [`OperationDescriptor`]: a name, a description, an ordered
//! parameter schema and an async handler. [`ToolRegistry`] owns the
//! descriptors in registration order and is the single place the server
//! dispatches through.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::arguments::Arguments;
use crate::tools::ToolContext;
use crate::{ToolError, ToolResult};

pub type HandlerFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;
type Handler = dyn Fn(ToolContext, Arguments) -> HandlerFuture + Send + Sync;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    StringList,
}

impl ParamType {
    fn schema(self) -> Value {
        match self {
            ParamType::String => json!({ "type": "string" }),
            ParamType::Integer => json!({ "type": "integer" }),
            ParamType::Boolean => json!({ "type": "boolean" }),
            ParamType::StringList => json!({ "type": "array", "items": { "type": "string" } }),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub param_type: ParamType,
    pub description: &'static str,
    pub default: Option<Value>,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self { name, param_type, description, default: None, required: true }
    }

    pub fn optional(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self { name, param_type, description, default: None, required: false }
    }

    pub fn with_default(
        name: &'static str,
        param_type: ParamType,
        description: &'static str,
        default: impl Into<Value>,
    ) -> Self {
        Self { name, param_type, description, default: Some(default.into()), required: false }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolCategory {
    Crm,
    CallIntelligence,
    Sequences,
    Analytics,
    System,
    GitHub,
}

impl ToolCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolCategory::Crm => "crm",
            ToolCategory::CallIntelligence => "calls",
            ToolCategory::Sequences => "sequences",
            ToolCategory::Analytics => "analytics",
            ToolCategory::System => "system",
            ToolCategory::GitHub => "github",
        }
    }
}

#[derive(Clone)]
pub struct OperationDescriptor {
    name: &'static str,
    category: ToolCategory,
    description: &'static str,
    params: Vec<ParamSpec>,
    handler: Arc<Handler>,
}

impl fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl OperationDescriptor {
    pub fn new<F, Fut>(
        name: &'static str,
        category: ToolCategory,
        description: &'static str,
        params: Vec<ParamSpec>,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolContext, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        let handler: Arc<Handler> =
            Arc::new(move |context: ToolContext, arguments: Arguments| -> HandlerFuture {
                Box::pin(handler(context, arguments))
            });
        Self { name, category, description, params, handler }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn category(&self) -> ToolCategory {
        self.category
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// JSON Schema for the tool's arguments, as advertised in `tools/list`.
    pub fn input_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            let mut property = param.param_type.schema();
            if let Value::Object(fields) = &mut property {
                fields.insert("description".to_owned(), Value::from(param.description));
                if let Some(default) = &param.default {
                    fields.insert("default".to_owned(), default.clone());
                }
            }
            properties.insert(param.name.to_owned(), property);
            if param.required {
                required.push(Value::from(param.name));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".to_owned(), Value::from("object"));
        schema.insert("properties".to_owned(), Value::Object(properties));
        schema.insert("required".to_owned(), Value::Array(required));
        schema
    }

    /// Binds the raw arguments and runs the handler.
    pub async fn run(&self, context: ToolContext, raw: Option<&Map<String, Value>>) -> ToolResult {
        let arguments = Arguments::bind(&self.params, raw)?;
        (self.handler)(context, arguments).await
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool `{0}` is already registered")]
    Duplicate(&'static str),
}

#[derive(Clone, Debug, Default)]
pub struct ToolRegistry {
    descriptors: Vec<OperationDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: OperationDescriptor) -> Result<(), RegistryError> {
        if self.index.contains_key(descriptor.name) {
            return Err(RegistryError::Duplicate(descriptor.name));
        }
        self.index.insert(descriptor.name, self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&OperationDescriptor> {
        self.index.get(name).map(|position| &self.descriptors[*position])
    }

    pub fn descriptors(&self) -> &[OperationDescriptor] {
        &self.descriptors
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(OperationDescriptor::name).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn in_category(&self, category: ToolCategory) -> Vec<&OperationDescriptor> {
        self.descriptors.iter().filter(|descriptor| descriptor.category == category).collect()
    }

    /// Resolves and runs one tool, rendering its outcome as pretty JSON.
    ///
    /// Only an unknown name is an error here; everything that goes wrong once
    /// the tool is resolved comes back as a rendered error document.
    pub async fn invoke(
        &self,
        context: &ToolContext,
        name: &str,
        raw: Option<&Map<String, Value>>,
    ) -> Result<String, ToolError> {
        let Some(descriptor) = self.get(name) else {
            warn!(event_name = "mcp.tool.unknown", tool = name, "unknown tool requested");
            return Err(ToolError::UnknownTool(name.to_owned()));
        };

        let started = Instant::now();
        debug!(
            event_name = "mcp.tool.invoke",
            tool = name,
            category = descriptor.category.as_str(),
            "invoking tool"
        );

        let value = match descriptor.run(context.clone(), raw).await {
            Ok(value) => {
                info!(
                    event_name = "mcp.tool.completed",
                    tool = name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "tool completed"
                );
                value
            }
            Err(error) => {
                warn!(
                    event_name = "mcp.tool.failed",
                    tool = name,
                    error_class = error.error_class(),
                    error = %error,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "tool returned an error result"
                );
                error.to_value()
            }
        };

        Ok(render_result(&value))
    }
}

/// Two-space pretty JSON; non-ASCII characters are written as-is.
pub fn render_result(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
