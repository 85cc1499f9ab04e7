use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::Instrument;
use uuid::Uuid;

use crate::chat::{Attachment, ChatInput, ChatTurn};
use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub file: Option<Attachment>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("chat", %request_id);

    let input = ChatInput {
        message: payload.message.unwrap_or_default(),
        attachment: payload.file,
        history: payload.history,
    };
    span.in_scope(|| {
        tracing::info!(
            has_attachment = input.attachment.is_some(),
            history_turns = input.history.len(),
            "chat request"
        )
    });

    match state.chat.handle(input).instrument(span.clone()).await {
        Ok(response) => Ok(Json(json!({ "response": response }))),
        Err(err) => {
            span.in_scope(|| tracing::warn!("chat request failed: {}", err));
            Err(err.into())
        }
    }
}
