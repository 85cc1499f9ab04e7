use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to open knowledge source: {0}")]
    Knowledge(#[source] anyhow::Error),

    #[error("Failed to initialize generation client: {0}")]
    Llm(#[source] anyhow::Error),
}
