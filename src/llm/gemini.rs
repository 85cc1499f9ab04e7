use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::credentials::Credential;
use super::error::ProviderError;
use super::provider::GenerationProvider;
use super::types::PromptPart;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Generative Language REST client (`models/{model}:generateContent`).
#[derive(Clone)]
pub struct GeminiProvider {
    base_url: String,
    model: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

fn build_request_body(parts: &[PromptPart]) -> Value {
    let parts: Vec<Value> = parts
        .iter()
        .map(|part| match part {
            PromptPart::Text { text } => json!({ "text": text }),
            PromptPart::Blob { mime_type, data } => json!({
                "inline_data": { "mime_type": mime_type, "data": data }
            }),
        })
        .collect();

    json!({
        "contents": [
            { "role": "user", "parts": parts }
        ]
    })
}

fn parse_http_error(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ProviderError::http(status, envelope.error.status, envelope.error.message),
        Err(_) => ProviderError::http(status, None, body.trim().to_string()),
    }
}

fn extract_text(payload: &Value) -> Result<String, ProviderError> {
    let candidate = &payload["candidates"][0];
    let text: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if !text.is_empty() {
        return Ok(text);
    }

    let reason = candidate["finishReason"]
        .as_str()
        .or_else(|| payload["promptFeedback"]["blockReason"].as_str())
        .unwrap_or("EMPTY_RESPONSE");
    Err(ProviderError::transport("Gemini returned no text").with_code(reason))
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        parts: &[PromptPart],
        credential: &Credential,
    ) -> Result<String, ProviderError> {
        let res = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, credential.expose())
            .json(&build_request_body(parts))
            .send()
            .await
            .map_err(|e| {
                let err = ProviderError::transport(e.to_string());
                if e.is_timeout() {
                    err.with_code("TIMEOUT")
                } else {
                    err
                }
            })?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(parse_http_error(status.as_u16(), &text));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ProviderError::transport(format!("Invalid Gemini response: {}", e)))?;
        extract_text(&payload)
    }
}
