//! Retrieval over the knowledge snapshot.
//!
//! - `SearchRanker`: scores records against a query and keeps the best ones
//! - `EvidenceContext`: the ranked records and their prompt rendering

mod context_builder;
mod ranker;

pub use context_builder::{Evidence, EvidenceContext};
pub use ranker::{RankerConfig, SearchRanker};
