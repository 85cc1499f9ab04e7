use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

/// Re-reads the corpus and swaps it in. On failure the previous snapshot
/// stays active.
pub async fn reload(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.knowledge.reload().await?;
    Ok(Json(json!({
        "message": "Knowledge base reloaded successfully",
        "count": snapshot.len(),
        "generation": snapshot.generation(),
    })))
}
