//! Replaces the SQLite knowledge corpus with the contents of a JSON file.
//!
//! Usage: `seed_corpus [file.json]` (defaults to `alldata.json` in the
//! project root). The file must hold a JSON array of records.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use campus_bot::core::config::{AppPaths, ConfigService, CorpusKind};
use campus_bot::core::logging;
use campus_bot::knowledge::{JsonFileCorpusSource, KnowledgeRecord, RawDocument, SqliteCorpusSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let input = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.corpus_json_path.clone());

    let settings = ConfigService::new(paths.clone()).load_settings()?;
    let db_path = match settings.knowledge.source {
        CorpusKind::Sqlite => settings.corpus_path(&paths),
        CorpusKind::Json => paths.db_path.clone(),
    };

    tracing::info!("Loading {}", input.display());
    let documents = JsonFileCorpusSource::new(input.clone())
        .read_documents()
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    for (index, document) in documents.iter().enumerate() {
        KnowledgeRecord::from_document(index, RawDocument::new(None, document.clone()))
            .with_context(|| format!("Record {} is not a valid knowledge record", index))?;
    }

    let store = SqliteCorpusSource::connect(&db_path).await?;
    let (deleted, inserted) = store.replace_all(&documents).await?;
    tracing::info!(
        deleted,
        inserted,
        total = store.count().await?,
        "Seeded {}",
        db_path.display()
    );

    Ok(())
}
