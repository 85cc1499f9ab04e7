mod orchestrator;
mod prompt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::errors::ApiError;
use crate::knowledge::LoadError;
use crate::llm::GenerationError;

pub use orchestrator::{Attachment, ChatInput, ChatOrchestrator, OrchestratorConfig};
pub use prompt::{ChatTurn, PromptBuilder};

pub const EXHAUSTED_MESSAGE: &str =
    "All API keys are currently rate-limited. Please try again later.";

/// Whether a question that arrives with an attachment is also ranked against
/// the knowledge base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentPolicy {
    #[default]
    Skip,
    Ground,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("No message provided")]
    EmptyMessage,
    #[error("Invalid attachment: {0}")]
    InvalidAttachment(String),
    #[error("all credentials rate-limited")]
    CredentialsExhausted(#[source] GenerationError),
    #[error("generation failed: {0}")]
    Generation(#[source] GenerationError),
}

impl From<GenerationError> for ChatError {
    fn from(err: GenerationError) -> Self {
        if err.is_exhausted() {
            ChatError::CredentialsExhausted(err)
        } else {
            ChatError::Generation(err)
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage | ChatError::InvalidAttachment(_) => {
                ApiError::BadRequest(err.to_string())
            }
            ChatError::CredentialsExhausted(_) => {
                ApiError::ServiceUnavailable(EXHAUSTED_MESSAGE.to_string())
            }
            ChatError::Generation(source) => ApiError::internal(source),
        }
    }
}

impl From<LoadError> for ApiError {
    fn from(err: LoadError) -> Self {
        ApiError::Internal(format!("Failed to reload data: {}", err))
    }
}
