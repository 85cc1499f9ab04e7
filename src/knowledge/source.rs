//! Backing stores the knowledge snapshot is loaded from.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use thiserror::Error;

use super::record::RawDocument;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("corpus store unavailable: {0}")]
    Unavailable(String),

    #[error("corpus query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document {id} is not valid JSON: {source}")]
    Decode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected corpus format: {0}")]
    Format(String),
}

/// Anything that can hand over the full corpus in one call.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Short label for logs and status output.
    fn describe(&self) -> String;

    async fn fetch_all(&self) -> Result<Vec<RawDocument>, SourceError>;
}

/// Corpus kept as JSON documents in a SQLite table.
#[derive(Clone)]
pub struct SqliteCorpusSource {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteCorpusSource {
    pub async fn connect(db_path: &Path) -> Result<Self, SourceError> {
        if let Some(parent) = db_path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        let conn_str = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&conn_str)
            .await
            .map_err(|e| {
                SourceError::Unavailable(format!(
                    "Failed to open knowledge db {}: {}",
                    db_path.display(),
                    e
                ))
            })?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS knowledge_base (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                document TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            path: db_path.to_path_buf(),
        })
    }

    /// Clears the table and inserts `documents` in order, in one transaction.
    /// Returns `(deleted, inserted)`.
    pub async fn replace_all(&self, documents: &[Value]) -> Result<(u64, usize), SourceError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM knowledge_base")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for document in documents {
            sqlx::query("INSERT INTO knowledge_base (document) VALUES (?)")
                .bind(document.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok((deleted, documents.len()))
    }

    pub async fn count(&self) -> Result<i64, SourceError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM knowledge_base")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("total")?)
    }
}

#[async_trait]
impl CorpusSource for SqliteCorpusSource {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }

    async fn fetch_all(&self) -> Result<Vec<RawDocument>, SourceError> {
        let rows = sqlx::query("SELECT id, document FROM knowledge_base ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id")?;
            let text: String = row.try_get("document")?;
            let body = serde_json::from_str(&text).map_err(|source| SourceError::Decode {
                id: id.to_string(),
                source,
            })?;
            documents.push(RawDocument::new(Some(id.to_string()), body));
        }
        Ok(documents)
    }
}

/// Corpus read from a JSON file holding an array of documents, the format
/// used for seeding.
#[derive(Debug, Clone)]
pub struct JsonFileCorpusSource {
    path: PathBuf,
}

impl JsonFileCorpusSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn read_documents(&self) -> Result<Vec<Value>, SourceError> {
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| SourceError::Io {
                    path: self.path.clone(),
                    source,
                })?;
        let parsed: Value =
            serde_json::from_str(&contents).map_err(|source| SourceError::Decode {
                id: self.path.display().to_string(),
                source,
            })?;
        match parsed {
            Value::Array(items) => Ok(items),
            _ => Err(SourceError::Format(
                "JSON corpus must contain a list of objects".to_string(),
            )),
        }
    }
}

#[async_trait]
impl CorpusSource for JsonFileCorpusSource {
    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }

    async fn fetch_all(&self) -> Result<Vec<RawDocument>, SourceError> {
        Ok(self
            .read_documents()
            .await?
            .into_iter()
            .map(|body| RawDocument::new(None, body))
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Source that replays scripted results, then repeats the last one.
    pub struct ScriptedSource {
        script: Mutex<VecDeque<Result<Vec<Value>, String>>>,
    }

    impl ScriptedSource {
        pub fn new(script: Vec<Result<Vec<Value>, String>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }

        pub fn always(documents: Vec<Value>) -> Self {
            Self::new(vec![Ok(documents)])
        }
    }

    #[async_trait]
    impl CorpusSource for ScriptedSource {
        fn describe(&self) -> String {
            "scripted".to_string()
        }

        async fn fetch_all(&self) -> Result<Vec<RawDocument>, SourceError> {
            let next = {
                let mut script = self
                    .script
                    .lock()
                    .map_err(|_| SourceError::Unavailable("script poisoned".to_string()))?;
                if script.len() > 1 {
                    script.pop_front()
                } else {
                    script.front().cloned()
                }
            };
            match next {
                Some(Ok(documents)) => Ok(documents
                    .into_iter()
                    .map(|body| RawDocument::new(None, body))
                    .collect()),
                Some(Err(reason)) => Err(SourceError::Unavailable(reason)),
                None => Ok(Vec::new()),
            }
        }
    }
}
