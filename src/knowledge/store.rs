use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use super::record::{KnowledgeRecord, RecordError};
use super::source::{CorpusSource, SourceError};
use crate::core::events::{CoreEvent, SharedObserver};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch corpus: {0}")]
    Source(#[from] SourceError),

    #[error("malformed record at position {index}: {reason}")]
    MalformedRecord {
        index: usize,
        #[source]
        reason: RecordError,
    },
}

/// One fully loaded, immutable copy of the corpus.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeSnapshot {
    records: Vec<KnowledgeRecord>,
    generation: u64,
    loaded_at: DateTime<Utc>,
    source: String,
}

impl KnowledgeSnapshot {
    pub fn new(records: Vec<KnowledgeRecord>, source: impl Into<String>) -> Self {
        Self {
            records,
            generation: 0,
            loaded_at: Utc::now(),
            source: source.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), "empty")
    }

    pub fn records(&self) -> &[KnowledgeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 0 for the bootstrap snapshot, +1 for every swap since.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Holder of the active snapshot.
///
/// The slot lock is only held to clone or replace the `Arc`; callers rank
/// against the `Arc` they got from [`KnowledgeStore::current`] and never see
/// a snapshot change underneath them.
pub struct KnowledgeStore {
    source: Arc<dyn CorpusSource>,
    active: RwLock<Arc<KnowledgeSnapshot>>,
    reload_lock: Mutex<()>,
    observer: SharedObserver,
}

impl KnowledgeStore {
    pub fn new(source: Arc<dyn CorpusSource>, observer: SharedObserver) -> Self {
        Self {
            source,
            active: RwLock::new(Arc::new(KnowledgeSnapshot::empty())),
            reload_lock: Mutex::new(()),
            observer,
        }
    }

    /// Fetches and validates the whole corpus into a new snapshot without
    /// publishing it.
    pub async fn load(&self) -> Result<KnowledgeSnapshot, LoadError> {
        let documents = self.source.fetch_all().await?;
        let records = documents
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                KnowledgeRecord::from_document(index, raw)
                    .map_err(|reason| LoadError::MalformedRecord { index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(KnowledgeSnapshot::new(records, self.source.describe()))
    }

    /// Publishes `snapshot` as the active one and returns it. The generation
    /// is assigned here, under the slot lock.
    pub fn swap(&self, mut snapshot: KnowledgeSnapshot) -> Arc<KnowledgeSnapshot> {
        let mut slot = match self.active.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        snapshot.generation = slot.generation + 1;
        let published = Arc::new(snapshot);
        *slot = Arc::clone(&published);
        published
    }

    pub fn current(&self) -> Arc<KnowledgeSnapshot> {
        let slot = match self.active.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(&slot)
    }

    /// `load` followed by `swap`. Reloads are serialized; a failed load leaves
    /// the active snapshot in place.
    pub async fn reload(&self) -> Result<Arc<KnowledgeSnapshot>, LoadError> {
        let _guard = self.reload_lock.lock().await;
        match self.load().await {
            Ok(snapshot) => {
                let published = self.swap(snapshot);
                self.observer.emit(CoreEvent::ReloadSucceeded {
                    generation: published.generation(),
                    record_count: published.len(),
                });
                Ok(published)
            }
            Err(err) => {
                self.observer.emit(CoreEvent::ReloadFailed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::testing::RecordingObserver;
    use crate::knowledge::source::testing::ScriptedSource;
    use serde_json::json;

    fn store_with(source: ScriptedSource) -> (KnowledgeStore, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let store = KnowledgeStore::new(Arc::new(source), observer.clone());
        (store, observer)
    }

    #[tokio::test]
    async fn starts_empty_and_counts_generations() {
        let (store, observer) = store_with(ScriptedSource::always(vec![
            json!({ "title": "Library Hours" }),
            json!({ "title": "Admission" }),
        ]));
        assert_eq!(store.current().generation(), 0);
        assert!(store.current().is_empty());

        let first = store.reload().await.expect("first reload");
        let second = store.reload().await.expect("second reload");

        assert_eq!(first.generation(), 1);
        assert_eq!(second.generation(), 2);
        assert_eq!(store.current().len(), 2);
        assert_eq!(store.current().source(), "scripted");
        assert_eq!(
            observer.events(),
            vec![
                CoreEvent::ReloadSucceeded {
                    generation: 1,
                    record_count: 2
                },
                CoreEvent::ReloadSucceeded {
                    generation: 2,
                    record_count: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_snapshot() {
        let (store, observer) = store_with(ScriptedSource::new(vec![
            Ok(vec![json!({ "title": "Library Hours" })]),
            Err("connection refused".to_string()),
        ]));
        store.reload().await.expect("initial load");

        let err = store.reload().await.expect_err("source is down");
        assert!(matches!(err, LoadError::Source(_)));

        let current = store.current();
        assert_eq!(current.generation(), 1);
        assert_eq!(current.records()[0].title(), Some("Library Hours"));
        assert!(matches!(
            observer.events().last(),
            Some(CoreEvent::ReloadFailed { .. })
        ));
    }

    #[tokio::test]
    async fn malformed_record_rejects_whole_load() {
        let (store, _) = store_with(ScriptedSource::new(vec![
            Ok(vec![json!({ "title": "Library Hours" })]),
            Ok(vec![json!({ "title": "Fine" }), json!({ "title": 5 })]),
        ]));
        store.reload().await.expect("initial load");

        let err = store.reload().await.expect_err("second record is malformed");
        match err {
            LoadError::MalformedRecord { index, reason } => {
                assert_eq!(index, 1);
                assert_eq!(reason.field, "title");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.current().len(), 1);
        assert_eq!(store.current().records()[0].title(), Some("Library Hours"));
    }

    #[tokio::test]
    async fn held_snapshot_is_unaffected_by_swap() {
        let (store, _) = store_with(ScriptedSource::new(vec![
            Ok(vec![json!({ "title": "old-a" }), json!({ "title": "old-b" })]),
            Ok(vec![json!({ "title": "new-a" })]),
        ]));
        store.reload().await.expect("initial load");

        let held = store.current();
        store.reload().await.expect("swap to new corpus");

        let titles: Vec<_> = held.records().iter().filter_map(|r| r.title()).collect();
        assert_eq!(titles, vec!["old-a", "old-b"]);
        assert_eq!(store.current().records()[0].title(), Some("new-a"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_readers_never_see_mixed_snapshots() {
        let store = Arc::new(KnowledgeStore::new(
            Arc::new(ScriptedSource::always(Vec::new())),
            Arc::new(RecordingObserver::default()),
        ));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    for _ in 0..500 {
                        let snapshot = store.current();
                        let tag = format!("gen-{}", snapshot.generation());
                        for record in snapshot.records() {
                            assert_eq!(record.text_for_ai(), tag);
                        }
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        for round in 1..=50u64 {
            let records = (0..20)
                .map(|i| {
                    KnowledgeRecord::new(
                        format!("{round}-{i}"),
                        None,
                        Default::default(),
                        format!("gen-{round}"),
                        Default::default(),
                    )
                })
                .collect();
            let published = store.swap(KnowledgeSnapshot::new(records, "test"));
            assert_eq!(published.generation(), round);
            tokio::task::yield_now().await;
        }

        for reader in readers {
            reader.await.expect("reader task");
        }
    }
}
