use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub const API_KEY_HEADER: &str = "X-Internal-Api-Key";

/// Rejects admin requests that do not carry the configured internal key.
pub async fn require_internal_api_key(
    State(expected): State<String>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    match provided {
        Some(key) if key == expected => next.run(request).await,
        _ => {
            tracing::warn!(path = %request.uri().path(), "admin request rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"error": "missing or invalid internal api key"})),
            )
                .into_response()
        }
    }
}
