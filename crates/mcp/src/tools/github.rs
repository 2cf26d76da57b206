//! Commits and issues of the backend repository.
//!
//! Without a token none of these tools touch the network; they answer with
//! the bare `{"error": "GITHUB_TOKEN not configured"}` document.

use legion_core::GitHubClient;
use serde_json::{json, Map, Value};

use super::ToolContext;
use crate::arguments::Arguments;
use crate::registry::{OperationDescriptor, ParamSpec, ParamType, ToolCategory};
use crate::{ToolError, ToolResult};

const SHORT_SHA_LEN: usize = 7;
const ISSUES_PER_PAGE: u32 = 20;

pub(super) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor::new(
            "legion_recent_deploys",
            ToolCategory::GitHub,
            "Get recent commits (deployments) of the Legion repository.",
            vec![ParamSpec::with_default("count", ParamType::Integer, "Number of commits", 5)],
            recent_deploys,
        ),
        OperationDescriptor::new(
            "legion_list_issues",
            ToolCategory::GitHub,
            "List GitHub issues of the Legion repository. State: open, closed, all.",
            vec![ParamSpec::with_default("state", ParamType::String, "Issue state filter", "open")],
            list_issues,
        ),
        OperationDescriptor::new(
            "legion_create_issue",
            ToolCategory::GitHub,
            "Create a GitHub issue or bug report in the Legion repository.",
            vec![
                ParamSpec::required("title", ParamType::String, "Issue title"),
                ParamSpec::required("body", ParamType::String, "Issue body (markdown)"),
                ParamSpec::optional("labels", ParamType::StringList, "Labels to apply"),
            ],
            create_issue,
        ),
    ]
}

fn configured(context: &ToolContext) -> ToolResult<&GitHubClient> {
    if context.github.is_configured() {
        Ok(context.github.as_ref())
    } else {
        Err(ToolError::ConfigurationMissing(GitHubClient::TOKEN_NAME))
    }
}

async fn recent_deploys(context: ToolContext, args: Arguments) -> ToolResult {
    let github = configured(&context)?;
    let commits = github.get("/commits", &[("per_page", args.int("count")?.to_string())]).await?;
    Ok(reduce_list(commits, summarize_commit))
}

async fn list_issues(context: ToolContext, args: Arguments) -> ToolResult {
    let github = configured(&context)?;
    let query = [
        ("state", args.str("state")?.to_owned()),
        ("per_page", ISSUES_PER_PAGE.to_string()),
    ];
    let issues = github.get("/issues", &query).await?;
    Ok(reduce_list(issues, summarize_issue))
}

async fn create_issue(context: ToolContext, args: Arguments) -> ToolResult {
    let github = configured(&context)?;

    let mut data = Map::new();
    data.insert("title".to_owned(), Value::from(args.str("title")?));
    data.insert("body".to_owned(), Value::from(args.str("body")?));
    let labels = args.string_list("labels");
    if !labels.is_empty() {
        data.insert("labels".to_owned(), Value::from(labels));
    }

    let created = github.post("/issues", &Value::Object(data)).await?;
    Ok(json!({
        "number": created.get("number").cloned().unwrap_or(Value::Null),
        "url": created.get("html_url").cloned().unwrap_or(Value::Null),
        "title": created.get("title").cloned().unwrap_or(Value::Null),
    }))
}

/// Applies `summarize` to every element of a list response. Anything else,
/// typically a GitHub error object, is returned unmodified.
pub fn reduce_list(response: Value, summarize: fn(&Value) -> Value) -> Value {
    match response {
        Value::Array(items) => Value::Array(items.iter().map(summarize).collect()),
        other => other,
    }
}

pub fn summarize_commit(commit: &Value) -> Value {
    let sha: String = commit["sha"].as_str().unwrap_or_default().chars().take(SHORT_SHA_LEN).collect();
    let message = commit["commit"]["message"].as_str().unwrap_or_default();
    let author = &commit["commit"]["author"];

    json!({
        "sha": sha,
        "message": message.lines().next().unwrap_or_default(),
        "author": author["name"],
        "date": author["date"],
    })
}

pub fn summarize_issue(issue: &Value) -> Value {
    let labels: Vec<&Value> = issue["labels"]
        .as_array()
        .map(|labels| labels.iter().map(|label| &label["name"]).collect())
        .unwrap_or_default();

    json!({
        "number": issue["number"],
        "title": issue["title"],
        "state": issue["state"],
        "labels": labels,
        "created_at": issue["created_at"],
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{reduce_list, summarize_commit, summarize_issue};

    #[test]
    fn commits_keep_short_sha_and_first_line() {
        let commit = json!({
            "sha": "a1b2c3d4e5f6a7b8",
            "commit": {
                "message": "Fix pipeline totals\n\nLonger body",
                "author": { "name": "Rita", "date": "2026-03-01T12:00:00Z" }
            }
        });

        assert_eq!(
            summarize_commit(&commit),
            json!({
                "sha": "a1b2c3d",
                "message": "Fix pipeline totals",
                "author": "Rita",
                "date": "2026-03-01T12:00:00Z"
            })
        );
    }

    #[test]
    fn issues_flatten_label_names() {
        let issue = json!({
            "number": 12,
            "title": "Forecast is empty",
            "state": "open",
            "labels": [{ "name": "bug", "color": "f00" }, { "name": "p1" }],
            "created_at": "2026-02-10T08:30:00Z",
            "body": "ignored"
        });

        assert_eq!(
            summarize_issue(&issue),
            json!({
                "number": 12,
                "title": "Forecast is empty",
                "state": "open",
                "labels": ["bug", "p1"],
                "created_at": "2026-02-10T08:30:00Z"
            })
        );
    }

    #[test]
    fn issues_without_labels_get_empty_list() {
        let summary = summarize_issue(&json!({ "number": 1, "title": "t", "state": "open" }));

        assert_eq!(summary["labels"], json!([]));
        assert!(summary["created_at"].is_null());
    }

    #[test]
    fn non_list_responses_pass_through() {
        let error = json!({ "message": "Bad credentials", "documentation_url": "https://docs.github.com" });

        assert_eq!(reduce_list(error.clone(), summarize_commit), error);
    }
}
