//! Health endpoints
//!
//! `/health` and `/health/live` answer as long as the process serves
//! requests. `/health/ready` pings both credential stores and reports
//! each one as a component.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use startkit_shared::{ComponentHealth, HealthResponse};
use tracing::warn;

const USER_STORE: &str = "user_store";
const RESET_TOKEN_STORE: &str = "reset_token_store";

fn report(status: &str, components: Vec<ComponentHealth>) -> HealthResponse {
    HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        components,
    }
}

fn component(name: &str, outcome: anyhow::Result<()>) -> ComponentHealth {
    if let Err(e) = &outcome {
        warn!(component = name, error = %e, "Readiness check failed");
    }
    ComponentHealth {
        name: name.to_string(),
        healthy: outcome.is_ok(),
    }
}

fn readiness(components: Vec<ComponentHealth>) -> (StatusCode, Json<HealthResponse>) {
    if components.iter().all(|c| c.healthy) {
        (StatusCode::OK, Json(report("ready", components)))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(report("not_ready", components)),
        )
    }
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(report("healthy", Vec::new()))
}

/// Ready when both the user store and the reset token store answer
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (users, tokens) = tokio::join!(state.users().ping(), state.reset_tokens().ping());
    readiness(vec![
        component(USER_STORE, users),
        component(RESET_TOKEN_STORE, tokens),
    ])
}

pub async fn liveness_check() -> Json<HealthResponse> {
    Json(report("alive", Vec::new()))
}
