//! Dashboard, forecasting and campaigns.

use serde_json::json;

use super::{json_wrapped, query, ToolContext};
use crate::arguments::Arguments;
use crate::registry::{OperationDescriptor, ParamSpec, ParamType, ToolCategory};
use crate::ToolResult;

pub(super) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor::new(
            "legion_dashboard_metrics",
            ToolCategory::Analytics,
            "Get dashboard metrics: leads, deals, pipeline value, conversion rates and agent activity.",
            Vec::new(),
            dashboard_metrics,
        ),
        OperationDescriptor::new(
            "legion_revenue_forecast",
            ToolCategory::Analytics,
            "Get the revenue forecast for a period (month, quarter, year).",
            vec![ParamSpec::with_default("period", ParamType::String, "Forecast period", "quarter")],
            revenue_forecast,
        ),
        OperationDescriptor::new(
            "legion_list_campaigns",
            ToolCategory::Analytics,
            "List marketing campaigns.",
            vec![ParamSpec::with_default("limit", ParamType::Integer, "Maximum campaigns to return", 20)],
            list_campaigns,
        ),
    ]
}

async fn dashboard_metrics(context: ToolContext, _args: Arguments) -> ToolResult {
    query(&context, "sprint4.dashboardStats", None).await
}

async fn revenue_forecast(context: ToolContext, args: Arguments) -> ToolResult {
    let input = json_wrapped(json!({ "period": args.str("period")? }));
    query(&context, "forecasting.revenue", Some(input)).await
}

async fn list_campaigns(context: ToolContext, args: Arguments) -> ToolResult {
    query(&context, "campaigns.list", Some(json!({ "limit": args.int("limit")? }))).await
}
