use async_trait::async_trait;

use super::credentials::Credential;
use super::error::ProviderError;
use super::types::PromptPart;

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// return the provider name (e.g. "gemini")
    fn name(&self) -> &str;

    /// single-shot generation with the given key
    async fn generate(
        &self,
        parts: &[PromptPart],
        credential: &Credential,
    ) -> Result<String, ProviderError>;
}
