use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::chat::{ChatOrchestrator, OrchestratorConfig};
use crate::core::config::{AppPaths, ConfigService, CorpusKind, Settings};
use crate::core::events::{tracing_observer, SharedObserver};
use crate::knowledge::{CorpusSource, JsonFileCorpusSource, KnowledgeStore, SqliteCorpusSource};
use crate::llm::credentials::keys_from_env;
use crate::llm::{CredentialPool, GeminiProvider, GenerationGateway, GenerationProvider};
use crate::rag::{RankerConfig, SearchRanker};

pub mod error;

use error::InitializationError;

/// Shared state handed to every route.
///
/// The knowledge store owns the active snapshot; the orchestrator owns the
/// ranker and the generation gateway. Both are safe to use concurrently.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Arc<Settings>,
    pub knowledge: Arc<KnowledgeStore>,
    pub credentials: Arc<CredentialPool>,
    pub chat: Arc<ChatOrchestrator>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Loads settings, opens the configured corpus and builds the Gemini
    /// client. A failed first load is logged and the server starts on the
    /// empty snapshot.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let source = open_source(&settings, &paths).await?;

        let generation = &settings.generation;
        let provider = GeminiProvider::new(
            &generation.endpoint,
            &generation.model,
            Duration::from_secs(generation.timeout_secs),
        )
        .map_err(|e| InitializationError::Llm(e.into()))?;

        let keys = keys_from_env(&generation.api_keys);
        if keys.is_empty() {
            tracing::warn!("No Gemini API keys configured; chat requests will fail with 503");
        } else {
            tracing::info!(count = keys.len(), model = %generation.model, "Loaded Gemini API keys");
        }

        Ok(Self::assemble(
            paths,
            config,
            settings,
            source,
            Arc::new(provider),
            keys,
            tracing_observer(),
        )
        .await)
    }

    /// Wires the components from already constructed parts and runs the
    /// first corpus load.
    pub async fn assemble(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: Settings,
        source: Arc<dyn CorpusSource>,
        provider: Arc<dyn GenerationProvider>,
        keys: Vec<String>,
        observer: SharedObserver,
    ) -> Arc<Self> {
        let knowledge = Arc::new(KnowledgeStore::new(source, observer.clone()));
        if let Err(err) = knowledge.reload().await {
            tracing::warn!("Initial knowledge load failed; serving empty corpus: {}", err);
        }

        let credentials = Arc::new(CredentialPool::from_keys(keys));
        let gateway = GenerationGateway::new(provider, credentials.clone(), observer);
        let ranker = SearchRanker::new(RankerConfig {
            top_k: settings.chat.max_context_records,
            ..RankerConfig::default()
        });
        let chat = Arc::new(ChatOrchestrator::new(
            knowledge.clone(),
            ranker,
            gateway,
            OrchestratorConfig {
                assistant_name: settings.chat.assistant_name.clone(),
                attachment_policy: settings.chat.attachment_policy,
                max_history_turns: settings.chat.max_history_turns,
            },
        ));

        Arc::new(AppState {
            paths,
            config,
            settings: Arc::new(settings),
            knowledge,
            credentials,
            chat,
            started_at: Utc::now(),
        })
    }
}

async fn open_source(
    settings: &Settings,
    paths: &AppPaths,
) -> Result<Arc<dyn CorpusSource>, InitializationError> {
    let path = settings.corpus_path(paths);
    let source: Arc<dyn CorpusSource> = match settings.knowledge.source {
        CorpusKind::Sqlite => Arc::new(
            SqliteCorpusSource::connect(&path)
                .await
                .map_err(|e| InitializationError::Knowledge(e.into()))?,
        ),
        CorpusKind::Json => Arc::new(JsonFileCorpusSource::new(path)),
    };
    tracing::info!(source = %source.describe(), "Knowledge source ready");
    Ok(source)
}
