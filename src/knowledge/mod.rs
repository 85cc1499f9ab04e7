//! Knowledge corpus: record schema, backing sources and the reloadable
//! snapshot store.

mod record;
mod source;
mod store;

pub use record::{KnowledgeRecord, RawDocument, RecordError};
pub use source::{CorpusSource, JsonFileCorpusSource, SourceError, SqliteCorpusSource};
pub use store::{KnowledgeSnapshot, KnowledgeStore, LoadError};

#[cfg(test)]
pub(crate) use source::testing;
