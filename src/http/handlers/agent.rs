use crate::agent::control_loop::CycleOutcome;
use crate::AppState;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TriggerParams {
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShadowParams {
    pub enable: bool,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.control_loop.snapshot().await;
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({"status": "active", "state": snapshot})),
    )
        .into_response()
}

pub async fn routing_table(State(state): State<AppState>) -> impl IntoResponse {
    let table = state.control_loop.routing_table().await;
    (axum::http::StatusCode::OK, Json(table)).into_response()
}

pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.control_loop.snapshot().await;
    let active_incidents = snapshot
        .routing_table
        .values()
        .filter(|a| a.is_rerouted())
        .count();

    match state.store.stats().await {
        Ok(stats) => (
            axum::http::StatusCode::OK,
            Json(serde_json::json!({
                "total_transactions": stats.total,
                "failed_transactions": stats.failed,
                "success_rate": stats.success_rate_pct(),
                "active_incidents": active_incidents,
                "routing_table": snapshot.routing_table,
                "shadow_mode": snapshot.shadow_mode,
            })),
        )
            .into_response(),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn trigger_cycle(
    State(state): State<AppState>,
    Query(params): Query<TriggerParams>,
) -> impl IntoResponse {
    let source = params.source.unwrap_or_else(|| "Manual".to_string());
    let outcome = state.control_loop.trigger_cycle(&source).await;
    let status = match outcome {
        CycleOutcome::FetchFailed { .. } => axum::http::StatusCode::SERVICE_UNAVAILABLE,
        _ => axum::http::StatusCode::OK,
    };
    (status, Json(outcome)).into_response()
}

pub async fn toggle_shadow_mode(
    State(state): State<AppState>,
    Query(params): Query<ShadowParams>,
) -> impl IntoResponse {
    state.control_loop.set_shadow_mode(params.enable).await;
    let label = if params.enable { "ON" } else { "OFF" };
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({"status": format!("Shadow Mode is now {}", label)})),
    )
        .into_response()
}
