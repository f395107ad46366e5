use crate::AppState;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct IncidentParams {
    pub bank_name: String,
}

pub async fn trigger_incident(
    State(state): State<AppState>,
    Query(params): Query<IncidentParams>,
) -> impl IntoResponse {
    if params.bank_name.trim().is_empty() {
        return (
            axum::http::StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "bank_name must not be empty"})),
        )
            .into_response();
    }

    let mode = state.control_loop.request_incident(&params.bank_name).await;
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({
            "message": format!("Started outage for {}", params.bank_name.trim().to_uppercase()),
            "simulation_mode": mode,
        })),
    )
        .into_response()
}

pub async fn stop_incident(State(state): State<AppState>) -> impl IntoResponse {
    state.control_loop.stop_incident().await;
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({"simulation_mode": "NORMAL"})),
    )
        .into_response()
}
