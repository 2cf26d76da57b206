//! Backend health and the database placeholder.

use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::{query, ToolContext};
use crate::arguments::Arguments;
use crate::registry::{OperationDescriptor, ParamSpec, ParamType, ToolCategory};
use crate::{ToolError, ToolResult};

const HEALTH_CHECK_ENDPOINT: &str = "auth.me";
const DB_QUERY_NOTE: &str = "Direct DB queries require DATABASE_URL. Use tRPC endpoints instead.";

pub(super) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor::new(
            "legion_health_check",
            ToolCategory::System,
            "Check whether the Legion backend is reachable and answering.",
            Vec::new(),
            health_check,
        ),
        OperationDescriptor::new(
            "legion_db_query",
            ToolCategory::System,
            "Describe a database question. Direct queries are not available; returns system health instead.",
            vec![ParamSpec::required(
                "query_description",
                ParamType::String,
                "What you want to know from the database",
            )],
            db_query,
        ),
    ]
}

/// Never fails: an unreachable backend is reported as `offline`.
async fn health_check(context: ToolContext, _args: Arguments) -> ToolResult {
    let url = context.backend.base_url().to_owned();
    let outcome = context.backend.status_check(HEALTH_CHECK_ENDPOINT).await;
    let checked_at = Utc::now().to_rfc3339();

    Ok(match outcome {
        Ok(response) => {
            info!(
                event_name = "mcp.health.online",
                http_status = response.status,
                "backend health check answered"
            );
            json!({
                "status": "online",
                "url": url,
                "http_status": response.status,
                "response": response.body,
                "checked_at": checked_at,
            })
        }
        Err(error) => {
            info!(
                event_name = "mcp.health.offline",
                error_class = error.class(),
                "backend health check failed"
            );
            json!({
                "status": "offline",
                "url": url,
                "error": error.to_string(),
                "checked_at": checked_at,
            })
        }
    })
}

async fn db_query(context: ToolContext, args: Arguments) -> ToolResult {
    info!(
        event_name = "mcp.db_query.placeholder",
        description = args.str("query_description")?,
        "database query requested"
    );
    let system_health = query(&context, "system.health", None)
        .await
        .unwrap_or_else(|error: ToolError| error.to_value());

    Ok(json!({ "note": DB_QUERY_NOTE, "system_health": system_health }))
}
