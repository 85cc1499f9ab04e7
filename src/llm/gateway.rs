//! Outbound generation with credential failover.
//!
//! One call walks a small state machine: attempt with the current key,
//! classify any failure, rotate on quota errors, stop on anything else. At
//! most one attempt per credential is made.

use std::sync::Arc;

use super::credentials::{Credential, CredentialPool};
use super::error::{classify, FailureClass, GenerationError, ProviderError};
use super::provider::GenerationProvider;
use super::types::PromptPart;
use crate::core::events::{CoreEvent, SharedObserver};

#[derive(Debug)]
enum AttemptState {
    Attempting {
        attempt: usize,
        credential: Credential,
    },
    Success {
        attempts: usize,
        text: String,
    },
    RetryableFailure {
        attempt: usize,
        error: ProviderError,
    },
    FatalFailure {
        attempt: usize,
        error: ProviderError,
    },
    Exhausted {
        attempts: usize,
        last: Option<ProviderError>,
    },
}

#[derive(Clone)]
pub struct GenerationGateway {
    provider: Arc<dyn GenerationProvider>,
    pool: Arc<CredentialPool>,
    observer: SharedObserver,
}

impl GenerationGateway {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        pool: Arc<CredentialPool>,
        observer: SharedObserver,
    ) -> Self {
        Self {
            provider,
            pool,
            observer,
        }
    }

    pub fn pool(&self) -> &Arc<CredentialPool> {
        &self.pool
    }

    /// Runs the prompt against the provider, failing over across credentials
    /// on quota errors. An empty pool fails with `Exhausted { attempts: 0 }`
    /// without calling the provider.
    pub async fn generate(&self, parts: &[PromptPart]) -> Result<String, GenerationError> {
        let max_attempts = self.pool.len();
        let mut state = match self.pool.current() {
            Some(credential) => AttemptState::Attempting {
                attempt: 1,
                credential,
            },
            None => AttemptState::Exhausted {
                attempts: 0,
                last: None,
            },
        };

        loop {
            state = match state {
                AttemptState::Attempting {
                    attempt,
                    credential,
                } => {
                    tracing::debug!(
                        provider = self.provider.name(),
                        attempt,
                        key = %credential,
                        "calling generation service"
                    );
                    match self.provider.generate(parts, &credential).await {
                        Ok(text) => AttemptState::Success {
                            attempts: attempt,
                            text,
                        },
                        Err(error) => match classify(&error) {
                            FailureClass::Retryable => {
                                AttemptState::RetryableFailure { attempt, error }
                            }
                            FailureClass::Fatal => AttemptState::FatalFailure { attempt, error },
                        },
                    }
                }
                AttemptState::RetryableFailure { attempt, error } => {
                    // Rotate even after the last attempt so the next request
                    // starts on the following key.
                    let next = self.pool.rotate();
                    self.observer.emit(CoreEvent::CredentialRotated {
                        attempt,
                        cursor: self.pool.cursor(),
                    });
                    match next {
                        Some(credential) if attempt < max_attempts => AttemptState::Attempting {
                            attempt: attempt + 1,
                            credential,
                        },
                        _ => AttemptState::Exhausted {
                            attempts: attempt,
                            last: Some(error),
                        },
                    }
                }
                AttemptState::Success { attempts, text } => {
                    self.observer
                        .emit(CoreEvent::GenerationSucceeded { attempts });
                    return Ok(text);
                }
                AttemptState::FatalFailure { attempt, error } => {
                    self.observer.emit(CoreEvent::GenerationFailed {
                        attempts: attempt,
                        reason: error.to_string(),
                    });
                    return Err(GenerationError::Fatal {
                        attempts: attempt,
                        source: error,
                    });
                }
                AttemptState::Exhausted { attempts, last } => {
                    self.observer
                        .emit(CoreEvent::GenerationExhausted { attempts });
                    return Err(GenerationError::Exhausted { attempts, last });
                }
            };
        }
    }
}
