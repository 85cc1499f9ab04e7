use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::prompt::{ChatTurn, PromptBuilder};
use super::{AttachmentPolicy, ChatError};
use crate::knowledge::KnowledgeStore;
use crate::llm::{GenerationGateway, PromptPart};
use crate::rag::{EvidenceContext, SearchRanker};

const DEFAULT_ATTACHMENT_MIME: &str = "image/png";
const DEFAULT_ATTACHMENT_QUESTION: &str =
    "Analyze this image/document and tell me what it is about.";

/// File sent along with a chat message. `data` is base64, optionally as a
/// `data:<mime>;base64,` URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: String,
}

impl Attachment {
    /// Strips any data-URL header, checks the payload decodes and picks the
    /// mime type (explicit, else from the header, else `image/png`).
    pub fn into_prompt_part(self) -> Result<PromptPart, ChatError> {
        let (header, payload) = match self.data.split_once(',') {
            Some((header, payload)) if header.starts_with("data:") => (Some(header), payload),
            Some((_, payload)) => (None, payload),
            None => (None, self.data.as_str()),
        };
        let payload = payload.trim();

        STANDARD
            .decode(payload)
            .map_err(|e| ChatError::InvalidAttachment(format!("payload is not base64: {}", e)))?;

        let header_mime = header
            .and_then(|h| h.strip_prefix("data:"))
            .and_then(|h| h.split(';').next())
            .filter(|mime| !mime.is_empty());
        let mime_type = self
            .mime_type
            .as_deref()
            .filter(|mime| !mime.trim().is_empty())
            .or(header_mime)
            .unwrap_or(DEFAULT_ATTACHMENT_MIME)
            .to_string();

        Ok(PromptPart::blob(mime_type, payload))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatInput {
    pub message: String,
    pub attachment: Option<Attachment>,
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub assistant_name: String,
    pub attachment_policy: AttachmentPolicy,
    pub max_history_turns: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            assistant_name: "CampusBot for RLJIT".to_string(),
            attachment_policy: AttachmentPolicy::default(),
            max_history_turns: 10,
        }
    }
}

/// Turns a chat request into one gateway call: rank, assemble, generate.
pub struct ChatOrchestrator {
    knowledge: Arc<KnowledgeStore>,
    ranker: SearchRanker,
    gateway: GenerationGateway,
    config: OrchestratorConfig,
}

impl ChatOrchestrator {
    pub fn new(
        knowledge: Arc<KnowledgeStore>,
        ranker: SearchRanker,
        gateway: GenerationGateway,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            knowledge,
            ranker,
            gateway,
            config,
        }
    }

    pub fn gateway(&self) -> &GenerationGateway {
        &self.gateway
    }

    /// Evidence for an attachment-free question against the active snapshot.
    pub fn retrieve(&self, question: &str) -> EvidenceContext {
        let snapshot = self.knowledge.current();
        self.ranker.rank(question, &snapshot)
    }

    /// Builds the ordered prompt parts for a request without calling out.
    pub fn assemble(&self, input: ChatInput) -> Result<Vec<PromptPart>, ChatError> {
        let attachment = input
            .attachment
            .filter(|attachment| !attachment.data.trim().is_empty())
            .map(Attachment::into_prompt_part)
            .transpose()?;

        let message = input.message.trim();
        if message.is_empty() && attachment.is_none() {
            return Err(ChatError::EmptyMessage);
        }

        let grounding = match (&attachment, self.config.attachment_policy) {
            (None, _) => self.retrieve(message),
            (Some(_), AttachmentPolicy::Ground) if !message.is_empty() => self.retrieve(message),
            (Some(_), _) => EvidenceContext::empty(),
        };
        if !grounding.is_empty() {
            tracing::debug!(sources = ?grounding.titles(), "grounding context selected");
        }

        let question = if message.is_empty() {
            DEFAULT_ATTACHMENT_QUESTION
        } else {
            message
        };

        let skip = input
            .history
            .len()
            .saturating_sub(self.config.max_history_turns);
        let history = &input.history[skip..];
        let builder = PromptBuilder::new(&self.config.assistant_name, history);

        let text = if grounding.is_empty() {
            builder.general(question, attachment.is_some())
        } else {
            builder.grounded(&grounding.render(), question)
        };

        let mut parts = Vec::with_capacity(2);
        parts.extend(attachment);
        parts.push(PromptPart::text(text));
        Ok(parts)
    }

    pub async fn handle(&self, input: ChatInput) -> Result<String, ChatError> {
        let parts = self.assemble(input)?;
        let text = self.gateway.generate(&parts).await?;
        Ok(text)
    }
}
