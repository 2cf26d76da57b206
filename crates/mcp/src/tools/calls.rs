//! Call intelligence and boardroom debates.

use serde_json::json;

use super::{mutation, query, ToolContext};
use crate::arguments::Arguments;
use crate::registry::{OperationDescriptor, ParamSpec, ParamType, ToolCategory};
use crate::ToolResult;

pub(super) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor::new(
            "legion_analyze_call",
            ToolCategory::CallIntelligence,
            "Analyze a sales call transcript. Returns BANT score, sentiment, objections and coaching tips.",
            vec![
                ParamSpec::required("transcript", ParamType::String, "Full call transcript"),
                ParamSpec::with_default("title", ParamType::String, "Title for the analysis", "Call Analysis"),
            ],
            analyze_call,
        ),
        OperationDescriptor::new(
            "legion_call_stats",
            ToolCategory::CallIntelligence,
            "Get call intelligence statistics: total calls, average score, sentiment and BANT.",
            Vec::new(),
            call_stats,
        ),
        OperationDescriptor::new(
            "legion_list_calls",
            ToolCategory::CallIntelligence,
            "List analyzed calls with their scores and status.",
            vec![ParamSpec::with_default("limit", ParamType::Integer, "Maximum calls to return", 20)],
            list_calls,
        ),
        OperationDescriptor::new(
            "legion_boardroom_debate",
            ToolCategory::CallIntelligence,
            "Start a boardroom debate where the AI agents discuss a sales strategy topic.",
            vec![
                ParamSpec::required("topic", ParamType::String, "Topic to debate"),
                ParamSpec::with_default("context", ParamType::String, "Background for the agents", ""),
            ],
            boardroom_debate,
        ),
    ]
}

async fn analyze_call(context: ToolContext, args: Arguments) -> ToolResult {
    let input = json!({ "transcript": args.str("transcript")?, "title": args.str("title")? });
    mutation(&context, "callIntelligence.analyzeText", input).await
}

async fn call_stats(context: ToolContext, _args: Arguments) -> ToolResult {
    query(&context, "callIntelligence.stats", None).await
}

async fn list_calls(context: ToolContext, args: Arguments) -> ToolResult {
    query(&context, "callIntelligence.list", Some(json!({ "limit": args.int("limit")? }))).await
}

async fn boardroom_debate(context: ToolContext, args: Arguments) -> ToolResult {
    let input = json!({ "topic": args.str("topic")?, "context": args.str("context")? });
    mutation(&context, "boardroom.startDebate", input).await
}
