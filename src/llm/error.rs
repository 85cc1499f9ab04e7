//! Errors of the outbound generation path and their classification.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message fragments that mark a quota or rate-limit failure when the
/// provider gave no HTTP status to go by.
const QUOTA_MARKERS: [&str; 5] = [
    "429",
    "quota",
    "rate limit",
    "resource exhausted",
    "too many requests",
];

const RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";

/// A failed call to the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    /// HTTP status, when the failure came with a response.
    pub status: Option<u16>,
    /// Provider-specific status string (Gemini: `error.status`).
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn http(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            code,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.code.as_deref()) {
            (Some(status), Some(code)) => write!(f, "HTTP {} {}: {}", status, code, self.message),
            (Some(status), None) => write!(f, "HTTP {}: {}", status, self.message),
            (None, Some(code)) => write!(f, "{}: {}", code, self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Quota or rate limit on the credential used; another key may succeed.
    Retryable,
    /// Anything else; retrying with another key will not help.
    Fatal,
}

/// Decides whether a failure should rotate to the next credential.
///
/// Structured signals win: HTTP 429 or a `RESOURCE_EXHAUSTED` status code is
/// retryable and any other HTTP status is fatal. Only failures without a
/// status (transport errors, SDK-style messages) fall back to looking for
/// quota markers in the message.
pub fn classify(err: &ProviderError) -> FailureClass {
    if err.status == Some(429) {
        return FailureClass::Retryable;
    }
    if err
        .code
        .as_deref()
        .is_some_and(|code| code.eq_ignore_ascii_case(RESOURCE_EXHAUSTED))
    {
        return FailureClass::Retryable;
    }
    if err.status.is_some() {
        return FailureClass::Fatal;
    }

    let message = err.message.to_lowercase();
    if QUOTA_MARKERS.iter().any(|marker| message.contains(marker)) {
        FailureClass::Retryable
    } else {
        FailureClass::Fatal
    }
}

/// Terminal outcome of a failed `GenerationGateway::generate`.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Every credential hit a quota (or the pool is empty).
    #[error("all credentials exhausted after {attempts} attempt(s)")]
    Exhausted {
        attempts: usize,
        last: Option<ProviderError>,
    },

    /// A non-quota failure; no further credentials were tried.
    #[error("generation failed after {attempts} attempt(s): {source}")]
    Fatal {
        attempts: usize,
        #[source]
        source: ProviderError,
    },
}

impl GenerationError {
    pub fn attempts(&self) -> usize {
        match self {
            GenerationError::Exhausted { attempts, .. } | GenerationError::Fatal { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, GenerationError::Exhausted { .. })
    }

    pub fn last_error(&self) -> Option<&ProviderError> {
        match self {
            GenerationError::Exhausted { last, .. } => last.as_ref(),
            GenerationError::Fatal { source, .. } => Some(source),
        }
    }
}
