//! Structured events emitted by the knowledge store and the generation
//! gateway.
//!
//! Components take an `Arc<dyn EventObserver>` instead of logging directly, so
//! tests can record what happened and production routes everything to
//! `tracing`.

use std::sync::Arc;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CoreEvent {
    ReloadSucceeded {
        generation: u64,
        record_count: usize,
    },
    ReloadFailed {
        reason: String,
    },
    CredentialRotated {
        /// 1-based attempt that hit the quota.
        attempt: usize,
        cursor: usize,
    },
    GenerationSucceeded {
        attempts: usize,
    },
    GenerationExhausted {
        attempts: usize,
    },
    GenerationFailed {
        attempts: usize,
        reason: String,
    },
}

pub trait EventObserver: Send + Sync {
    fn emit(&self, event: CoreEvent);
}

pub type SharedObserver = Arc<dyn EventObserver>;

/// Default observer: one `tracing` record per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl EventObserver for TracingObserver {
    fn emit(&self, event: CoreEvent) {
        match event {
            CoreEvent::ReloadSucceeded {
                generation,
                record_count,
            } => tracing::info!(generation, record_count, "knowledge base reloaded"),
            CoreEvent::ReloadFailed { reason } => {
                tracing::error!(%reason, "knowledge base reload failed")
            }
            CoreEvent::CredentialRotated { attempt, cursor } => {
                tracing::warn!(attempt, cursor, "credential rate-limited, rotating")
            }
            CoreEvent::GenerationSucceeded { attempts } => {
                tracing::debug!(attempts, "generation succeeded")
            }
            CoreEvent::GenerationExhausted { attempts } => {
                tracing::error!(attempts, "all credentials exhausted")
            }
            CoreEvent::GenerationFailed { attempts, reason } => {
                tracing::error!(attempts, %reason, "generation failed")
            }
        }
    }
}

pub fn tracing_observer() -> SharedObserver {
    Arc::new(TracingObserver)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every emitted event for later assertions.
    #[derive(Default)]
    pub struct RecordingObserver {
        events: Mutex<Vec<CoreEvent>>,
    }

    impl RecordingObserver {
        pub fn events(&self) -> Vec<CoreEvent> {
            self.events.lock().map(|e| e.clone()).unwrap_or_default()
        }
    }

    impl EventObserver for RecordingObserver {
        fn emit(&self, event: CoreEvent) {
            if let Ok(mut events) = self.events.lock() {
                events.push(event);
            }
        }
    }
}
