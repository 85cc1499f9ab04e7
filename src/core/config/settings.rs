//! Typed view over the merged configuration document.
//!
//! `ConfigService` hands out an untyped `serde_json::Value`; everything the
//! service reads at startup goes through [`Settings`] so defaults live in one
//! place.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::AttachmentPolicy;
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub knowledge: KnowledgeSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub chat: ChatSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default)]
    pub frontend_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusKind {
    #[default]
    Sqlite,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeSettings {
    #[serde(default)]
    pub source: CorpusKind,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub api_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
    #[serde(default = "default_max_context_records")]
    pub max_context_records: usize,
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
    #[serde(default)]
    pub attachment_policy: AttachmentPolicy,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_assistant_name() -> String {
    "CampusBot for RLJIT".to_string()
}

fn default_max_context_records() -> usize {
    5
}

fn default_max_history_turns() -> usize {
    10
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            cors_allowed_origins: Vec::new(),
            frontend_url: None,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            api_keys: Vec::new(),
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            assistant_name: default_assistant_name(),
            max_context_records: default_max_context_records(),
            max_history_turns: default_max_history_turns(),
            attachment_policy: AttachmentPolicy::default(),
        }
    }
}

impl Settings {
    pub fn from_value(config: &Value) -> Result<Self, ApiError> {
        serde_json::from_value(config.clone())
            .map_err(|e| ApiError::BadRequest(format!("Invalid config: {}", e)))
    }

    /// Location of the corpus for the configured source kind. Relative paths
    /// resolve against the data directory.
    pub fn corpus_path(&self, paths: &AppPaths) -> PathBuf {
        match self.knowledge.path.as_deref() {
            Some(raw) => {
                let candidate = PathBuf::from(raw);
                if candidate.is_absolute() {
                    candidate
                } else {
                    paths.user_data_dir.join(candidate)
                }
            }
            None => match self.knowledge.source {
                CorpusKind::Sqlite => paths.db_path.clone(),
                CorpusKind::Json => paths.corpus_json_path.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = Settings::from_value(&json!({})).expect("defaults");
        assert_eq!(settings.server.port, 5001);
        assert_eq!(settings.server.max_body_bytes, 16 * 1024 * 1024);
        assert_eq!(settings.knowledge.source, CorpusKind::Sqlite);
        assert_eq!(settings.generation.model, DEFAULT_MODEL);
        assert_eq!(settings.chat.max_context_records, 5);
        assert_eq!(settings.chat.attachment_policy, AttachmentPolicy::Skip);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let settings = Settings::from_value(&json!({
            "knowledge": { "source": "json" },
            "chat": { "attachment_policy": "ground" }
        }))
        .expect("settings");
        assert_eq!(settings.knowledge.source, CorpusKind::Json);
        assert_eq!(settings.chat.attachment_policy, AttachmentPolicy::Ground);
        assert_eq!(settings.chat.assistant_name, "CampusBot for RLJIT");
    }

    #[test]
    fn corpus_path_follows_source_kind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::from_dirs(dir.path().to_path_buf(), dir.path().join("data"));

        let mut settings = Settings::default();
        assert_eq!(settings.corpus_path(&paths), paths.db_path);

        settings.knowledge.source = CorpusKind::Json;
        assert_eq!(settings.corpus_path(&paths), paths.corpus_json_path);

        settings.knowledge.path = Some("seed/records.json".to_string());
        assert_eq!(
            settings.corpus_path(&paths),
            paths.user_data_dir.join("seed/records.json")
        );
    }
}
