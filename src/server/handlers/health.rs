use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.knowledge.current();
    let credentials = &state.credentials;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0);

    Json(json!({
        "status": "ok",
        "uptime_secs": uptime_secs,
        "knowledge": {
            "generation": snapshot.generation(),
            "records": snapshot.len(),
            "loaded_at": snapshot.loaded_at(),
            "source": snapshot.source(),
        },
        "credentials": {
            "count": credentials.len(),
            "cursor": credentials.cursor(),
        },
        "model": state.settings.generation.model,
    }))
}

/// Landing page that forwards visitors to the hosted frontend, so hitting
/// the backend URL also wakes it up.
pub async fn wake_page(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let url = state
        .settings
        .server
        .frontend_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::NotFound("No frontend configured".to_string()))?;
    let url = escape_attribute(url);
    let name = escape_attribute(&state.settings.chat.assistant_name);

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8" />
    <title>{name}</title>
    <meta http-equiv="refresh" content="0; url={url}" />
    <style>
        body {{ font-family: sans-serif; display: flex; align-items: center; justify-content: center; height: 100vh; margin: 0; background: #f4f6fb; color: #1f2937; }}
    </style>
</head>
<body>
    <p>Server is awake. Redirecting you to <a href="{url}">{name}</a>...</p>
</body>
</html>
"#
    )))
}

fn escape_attribute(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
