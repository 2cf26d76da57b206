//! Leads and deals.

use serde_json::{json, Map, Value};

use super::{json_wrapped, mutation, query, ToolContext};
use crate::arguments::{parse_id_list, Arguments};
use crate::registry::{OperationDescriptor, ParamSpec, ParamType, ToolCategory};
use crate::ToolResult;

pub(super) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor::new(
            "legion_list_leads",
            ToolCategory::Crm,
            "List leads from the Legion CRM with pagination.",
            vec![
                ParamSpec::with_default("limit", ParamType::Integer, "Maximum leads to return", 20),
                ParamSpec::with_default("offset", ParamType::Integer, "Leads to skip", 0),
            ],
            list_leads,
        ),
        OperationDescriptor::new(
            "legion_create_lead",
            ToolCategory::Crm,
            "Create a new lead in the Legion CRM.",
            vec![
                ParamSpec::required("name", ParamType::String, "Lead full name"),
                ParamSpec::required("email", ParamType::String, "Lead email address"),
                ParamSpec::with_default("company", ParamType::String, "Company name", ""),
                ParamSpec::with_default("phone", ParamType::String, "Phone number", ""),
                ParamSpec::with_default("source", ParamType::String, "Lead source", "manual"),
                ParamSpec::with_default("notes", ParamType::String, "Free-form notes", ""),
            ],
            create_lead,
        ),
        OperationDescriptor::new(
            "legion_update_lead",
            ToolCategory::Crm,
            "Update status, score or notes of an existing lead. Empty fields are left untouched.",
            vec![
                ParamSpec::required("lead_id", ParamType::Integer, "Lead id"),
                ParamSpec::with_default("status", ParamType::String, "New status", ""),
                ParamSpec::optional("score", ParamType::Integer, "New lead score"),
                ParamSpec::with_default("notes", ParamType::String, "Replacement notes", ""),
            ],
            update_lead,
        ),
        OperationDescriptor::new(
            "legion_bulk_update_leads",
            ToolCategory::Crm,
            "Set the same status on several leads at once.",
            vec![
                ParamSpec::required("lead_ids", ParamType::String, "Comma-separated lead ids, e.g. \"12,15,18\""),
                ParamSpec::required("status", ParamType::String, "Status to apply"),
            ],
            bulk_update_leads,
        ),
        OperationDescriptor::new(
            "legion_get_pipeline",
            ToolCategory::Crm,
            "Get the full sales pipeline with all deals, stages and values.",
            Vec::new(),
            get_pipeline,
        ),
        OperationDescriptor::new(
            "legion_update_deal_stage",
            ToolCategory::Crm,
            "Move a deal to another pipeline stage.",
            vec![
                ParamSpec::required("deal_id", ParamType::Integer, "Deal id"),
                ParamSpec::required("stage", ParamType::String, "Target stage"),
            ],
            update_deal_stage,
        ),
    ]
}

async fn list_leads(context: ToolContext, args: Arguments) -> ToolResult {
    let input = json!({ "limit": args.int("limit")?, "offset": args.int("offset")? });
    query(&context, "leads.list", Some(input)).await
}

async fn create_lead(context: ToolContext, args: Arguments) -> ToolResult {
    let input = json!({
        "name": args.str("name")?,
        "email": args.str("email")?,
        "company": args.str("company")?,
        "phone": args.str("phone")?,
        "source": args.str("source")?,
        "notes": args.str("notes")?,
    });
    mutation(&context, "leads.create", input).await
}

async fn update_lead(context: ToolContext, args: Arguments) -> ToolResult {
    let mut input = Map::new();
    input.insert("id".to_owned(), Value::from(args.int("lead_id")?));
    for field in ["status", "notes"] {
        if let Some(text) = args.opt_str(field).filter(|text| !text.is_empty()) {
            input.insert(field.to_owned(), Value::from(text));
        }
    }
    if let Some(score) = args.opt_int("score") {
        input.insert("score".to_owned(), Value::from(score));
    }
    mutation(&context, "leads.update", Value::Object(input)).await
}

async fn bulk_update_leads(context: ToolContext, args: Arguments) -> ToolResult {
    let ids = parse_id_list("lead_ids", args.str("lead_ids")?)?;
    let input = json_wrapped(json!({ "ids": ids, "status": args.str("status")? }));
    mutation(&context, "leads.bulkUpdateStatus", input).await
}

async fn get_pipeline(context: ToolContext, _args: Arguments) -> ToolResult {
    query(&context, "crm.deals.list", None).await
}

async fn update_deal_stage(context: ToolContext, args: Arguments) -> ToolResult {
    let input = json!({ "id": args.int("deal_id")?, "stage": args.str("stage")? });
    mutation(&context, "crm.deals.updateStage", input).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use legion_core::testing::MockTransport;
    use reqwest::Method;
    use serde_json::json;

    use crate::tools::call_with as call;

    #[tokio::test]
    async fn list_leads_sends_flat_paging_input() {
        let transport = Arc::new(MockTransport::echo());

        let value = call(&transport, "legion_list_leads", json!({ "limit": 5 })).await;

        assert_eq!(value, json!({ "result": { "limit": 5, "offset": 0 } }));
        let request = transport.last_request().expect("request");
        assert_eq!(request.method, Method::GET);
        assert!(request.url.ends_with("/api/trpc/leads.list"));
    }

    #[tokio::test]
    async fn update_lead_omits_empty_fields() {
        let transport = Arc::new(MockTransport::echo());

        let value = call(&transport, "legion_update_lead", json!({ "lead_id": "42", "score": 80 })).await;

        assert_eq!(value["result"], json!({ "id": 42, "score": 80 }));
    }

    #[tokio::test]
    async fn bulk_update_wraps_payload_in_json_key() {
        let transport = Arc::new(MockTransport::echo());

        let value = call(
            &transport,
            "legion_bulk_update_leads",
            json!({ "lead_ids": "12, 15,18", "status": "qualified" }),
        )
        .await;

        assert_eq!(value["result"], json!({ "json": { "ids": [12, 15, 18], "status": "qualified" } }));
    }

    #[tokio::test]
    async fn bulk_update_rejects_bad_ids_without_calling_backend() {
        let transport = Arc::new(MockTransport::echo());

        let value = call(
            &transport,
            "legion_bulk_update_leads",
            json!({ "lead_ids": "1,x", "status": "lost" }),
        )
        .await;

        assert_eq!(value["error_class"], "malformed_argument");
        assert_eq!(value["argument"], "lead_ids");
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn deal_stage_update_is_a_flat_mutation() {
        let transport = Arc::new(MockTransport::echo());

        let value = call(
            &transport,
            "legion_update_deal_stage",
            json!({ "deal_id": 7, "stage": "negotiation" }),
        )
        .await;

        assert_eq!(value["result"], json!({ "id": 7, "stage": "negotiation" }));
        assert_eq!(transport.last_request().expect("request").method, Method::POST);
    }
}
