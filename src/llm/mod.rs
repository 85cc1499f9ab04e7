pub mod credentials;
pub mod error;
pub mod gateway;
pub mod gemini;
pub mod provider;
pub mod types;

pub use credentials::{Credential, CredentialPool};
pub use error::{classify, FailureClass, GenerationError, ProviderError};
pub use gateway::GenerationGateway;
pub use gemini::GeminiProvider;
pub use provider::GenerationProvider;
pub use types::PromptPart;
