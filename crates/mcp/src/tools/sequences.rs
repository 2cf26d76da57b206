//! Outreach sequences. All three procedures take their input under `json`.

use serde_json::json;

use super::{json_wrapped, mutation, query, ToolContext};
use crate::arguments::{parse_id_list, parse_json_array, Arguments};
use crate::registry::{OperationDescriptor, ParamSpec, ParamType, ToolCategory};
use crate::ToolResult;

pub(super) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor::new(
            "legion_list_sequences",
            ToolCategory::Sequences,
            "List outreach sequences.",
            vec![ParamSpec::with_default(
                "active_only",
                ParamType::Boolean,
                "Only return active sequences",
                false,
            )],
            list_sequences,
        ),
        OperationDescriptor::new(
            "legion_create_sequence",
            ToolCategory::Sequences,
            "Create an outreach sequence from a JSON array of steps.",
            vec![
                ParamSpec::required("name", ParamType::String, "Sequence name"),
                ParamSpec::required(
                    "steps",
                    ParamType::String,
                    "JSON array of steps, e.g. [{\"type\":\"email\",\"delayDays\":0}]",
                ),
                ParamSpec::with_default("description", ParamType::String, "Sequence description", ""),
            ],
            create_sequence,
        ),
        OperationDescriptor::new(
            "legion_enroll_leads",
            ToolCategory::Sequences,
            "Enroll leads into a sequence.",
            vec![
                ParamSpec::required("sequence_id", ParamType::Integer, "Sequence id"),
                ParamSpec::required("lead_ids", ParamType::String, "Comma-separated lead ids"),
            ],
            enroll_leads,
        ),
    ]
}

async fn list_sequences(context: ToolContext, args: Arguments) -> ToolResult {
    let input = json_wrapped(json!({ "activeOnly": args.bool("active_only")? }));
    query(&context, "sequences.list", Some(input)).await
}

async fn create_sequence(context: ToolContext, args: Arguments) -> ToolResult {
    let steps = parse_json_array("steps", args.str("steps")?)?;
    let input = json_wrapped(json!({
        "name": args.str("name")?,
        "description": args.str("description")?,
        "steps": steps,
    }));
    mutation(&context, "sequences.create", input).await
}

async fn enroll_leads(context: ToolContext, args: Arguments) -> ToolResult {
    let lead_ids = parse_id_list("lead_ids", args.str("lead_ids")?)?;
    let input = json_wrapped(json!({ "sequenceId": args.int("sequence_id")?, "leadIds": lead_ids }));
    mutation(&context, "sequences.enroll", input).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use legion_core::testing::MockTransport;
    use serde_json::json;

    use crate::tools::call_with as call;

    #[tokio::test]
    async fn list_sequences_wraps_query_input() {
        let transport = Arc::new(MockTransport::echo());

        call(&transport, "legion_list_sequences", json!({ "active_only": "true" })).await;

        let request = transport.last_request().expect("request");
        assert_eq!(request.query_param("input"), Some(r#"{"json":{"activeOnly":true}}"#));
    }

    #[tokio::test]
    async fn create_sequence_parses_steps() {
        let transport = Arc::new(MockTransport::echo());

        let value = call(
            &transport,
            "legion_create_sequence",
            json!({ "name": "Onboarding", "steps": r#"[{"type":"email","delayDays":0}]"# }),
        )
        .await;

        assert_eq!(
            value["result"],
            json!({ "json": {
                "name": "Onboarding",
                "description": "",
                "steps": [{ "type": "email", "delayDays": 0 }]
            } })
        );
    }

    #[tokio::test]
    async fn invalid_steps_never_reach_backend() {
        let transport = Arc::new(MockTransport::echo());

        let value = call(
            &transport,
            "legion_create_sequence",
            json!({ "name": "Broken", "steps": "[{not json" }),
        )
        .await;

        assert_eq!(value["error_class"], "malformed_argument");
        assert_eq!(value["argument"], "steps");
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn enroll_uses_camel_case_keys() {
        let transport = Arc::new(MockTransport::echo());

        let value = call(
            &transport,
            "legion_enroll_leads",
            json!({ "sequence_id": 3, "lead_ids": "4,5" }),
        )
        .await;

        assert_eq!(value["result"], json!({ "json": { "sequenceId": 3, "leadIds": [4, 5] } }));
    }
}
