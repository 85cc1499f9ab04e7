use serde::{Deserialize, Serialize};

/// One element of an outbound generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromptPart {
    Text { text: String },
    /// Binary payload, base64-encoded without any data-URL prefix.
    Blob { mime_type: String, data: String },
}

impl PromptPart {
    pub fn text(text: impl Into<String>) -> Self {
        PromptPart::Text { text: text.into() }
    }

    pub fn blob(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        PromptPart::Blob {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PromptPart::Text { text } => Some(text),
            PromptPart::Blob { .. } => None,
        }
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, PromptPart::Blob { .. })
    }
}
