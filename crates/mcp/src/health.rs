//! `GET /health` liveness route for the HTTP host. Reports the adapter's own
//! state only; backend reachability is the `legion_health_check` tool's job.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

#[derive(Clone, Debug)]
pub struct HealthState {
    pub tool_count: usize,
    pub github_configured: bool,
    pub backend_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub tools: HealthCheck,
    pub github: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let ready = state.tool_count > 0;

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("legion-mcp forwarding to {}", state.backend_url),
        },
        tools: HealthCheck {
            status: if ready { "ready" } else { "degraded" },
            detail: format!("{} tools registered", state.tool_count),
        },
        github: if state.github_configured {
            HealthCheck { status: "ready", detail: "GITHUB_TOKEN configured".to_string() }
        } else {
            HealthCheck {
                status: "disabled",
                detail: "GITHUB_TOKEN not configured; github tools answer with an error".to_string(),
            }
        },
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}
