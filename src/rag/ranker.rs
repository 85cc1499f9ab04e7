//! Keyword ranker over the in-memory snapshot.
//!
//! Scoring is a linear scan: each query token adds `body_weight` when it
//! occurs anywhere in a record's full text and `title_boost` more when it
//! occurs in the title. Ties keep corpus order.

use serde::{Deserialize, Serialize};

use super::context_builder::{Evidence, EvidenceContext};
use crate::knowledge::{KnowledgeRecord, KnowledgeSnapshot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Maximum number of records in a context.
    pub top_k: usize,
    /// Tokens with this many characters or fewer are dropped.
    pub min_token_chars: usize,
    pub body_weight: u32,
    pub title_boost: u32,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_token_chars: 2,
            body_weight: 1,
            title_boost: 5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchRanker {
    config: RankerConfig,
}

impl SearchRanker {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn with_top_k(top_k: usize) -> Self {
        Self::new(RankerConfig {
            top_k,
            ..RankerConfig::default()
        })
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Lower-cased whitespace tokens longer than `min_token_chars`.
    /// Repeated tokens are kept and score once per occurrence.
    pub fn tokenize(&self, query: &str) -> Vec<String> {
        query
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|token| token.chars().count() > self.config.min_token_chars)
            .collect()
    }

    pub fn score(&self, tokens: &[String], record: &KnowledgeRecord) -> u32 {
        tokens.iter().fold(0, |score, token| {
            let mut gained = 0;
            if record.search_text().contains(token.as_str()) {
                gained += self.config.body_weight;
            }
            if record.title_lower().contains(token.as_str()) {
                gained += self.config.title_boost;
            }
            score + gained
        })
    }

    pub fn rank(&self, query: &str, snapshot: &KnowledgeSnapshot) -> EvidenceContext {
        let tokens = self.tokenize(query);
        if tokens.is_empty() || snapshot.is_empty() {
            return EvidenceContext::empty();
        }

        let mut scored: Vec<(u32, &KnowledgeRecord)> = snapshot
            .records()
            .iter()
            .map(|record| (self.score(&tokens, record), record))
            .filter(|(score, _)| *score > 0)
            .collect();

        // `sort_by` is stable, so equal scores stay in corpus order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(self.config.top_k);

        EvidenceContext::new(
            scored
                .into_iter()
                .map(|(score, record)| Evidence::from_record(record, score))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn record(id: &str, title: &str, text: &str) -> KnowledgeRecord {
        KnowledgeRecord::new(id, Some(title.to_string()), Map::new(), text, Map::new())
    }

    fn snapshot(records: Vec<KnowledgeRecord>) -> KnowledgeSnapshot {
        KnowledgeSnapshot::new(records, "test")
    }

    fn ids(context: &EvidenceContext) -> Vec<&str> {
        context
            .entries()
            .iter()
            .map(|e| e.record_id.as_str())
            .collect()
    }

    #[test]
    fn short_tokens_only_yield_empty_context() {
        let ranker = SearchRanker::default();
        let corpus = snapshot(vec![record("1", "Is it on", "an ox is at it")]);

        assert!(ranker.rank("is it on an ox", &corpus).is_empty());
        assert!(ranker.rank("   ", &corpus).is_empty());
        assert!(ranker.rank("", &corpus).is_empty());
    }

    #[test]
    fn title_match_outranks_body_match() {
        let ranker = SearchRanker::default();
        let corpus = snapshot(vec![
            record("admission", "Admission", "library deadline June"),
            record("hours", "Library Hours", "9am-9pm"),
        ]);

        let context = ranker.rank("library", &corpus);

        assert_eq!(ids(&context), vec!["hours", "admission"]);
        assert_eq!(context.entries()[0].score, 6);
        assert_eq!(context.entries()[1].score, 1);
    }

    #[test]
    fn library_scenario_in_corpus_order() {
        let ranker = SearchRanker::default();
        let corpus = snapshot(vec![
            record("hours", "Library Hours", "9am-9pm"),
            record("admission", "Admission", "library deadline June"),
        ]);

        let context = ranker.rank("library", &corpus);

        assert_eq!(ids(&context), vec!["hours", "admission"]);
        assert!(context.entries().iter().all(|e| e.score > 0));
    }

    #[test]
    fn title_boost_is_at_least_five_over_body_only() {
        let ranker = SearchRanker::default();
        let in_title = record("t", "Hostel Rules", "curfew at ten");
        let in_body = record("b", "Rules", "hostel curfew at ten");
        let tokens = ranker.tokenize("hostel");

        let diff = ranker.score(&tokens, &in_title) - ranker.score(&tokens, &in_body);
        assert!(diff >= 5);
    }

    #[test]
    fn scores_accumulate_per_token() {
        let ranker = SearchRanker::default();
        let corpus = snapshot(vec![record("1", "Library Hours", "open daily")]);

        let context = ranker.rank("LIBRARY hours", &corpus);
        assert_eq!(context.entries()[0].score, 12);

        let repeated = ranker.rank("library library", &corpus);
        assert_eq!(repeated.entries()[0].score, 12);
    }

    #[test]
    fn details_and_extra_fields_are_searchable() {
        let ranker = SearchRanker::default();
        let mut details = Map::new();
        details.insert("room".to_string(), json!("B-204"));
        let mut extra = Map::new();
        extra.insert("category".to_string(), Value::String("Placements".to_string()));
        let corpus = snapshot(vec![KnowledgeRecord::new(
            "1",
            Some("Training Cell".to_string()),
            details,
            "",
            extra,
        )]);

        assert_eq!(ranker.rank("b-204", &corpus).len(), 1);
        assert_eq!(ranker.rank("placements", &corpus).len(), 1);
    }

    #[test]
    fn keeps_top_five_with_stable_ties() {
        let ranker = SearchRanker::default();
        let mut records: Vec<_> = (0..7)
            .map(|i| record(&format!("body-{i}"), "Notice", "exam schedule posted"))
            .collect();
        records.push(record("title", "Exam Cell", "contact office"));
        let corpus = snapshot(records);

        let context = ranker.rank("exam", &corpus);

        assert_eq!(context.len(), 5);
        assert_eq!(
            ids(&context),
            vec!["title", "body-0", "body-1", "body-2", "body-3"]
        );
        let scores: Vec<u32> = context.entries().iter().map(|e| e.score).collect();
        assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn zero_score_records_are_dropped() {
        let ranker = SearchRanker::default();
        let corpus = snapshot(vec![
            record("1", "Canteen", "lunch menu"),
            record("2", "Transport", "bus routes"),
        ]);

        assert_eq!(ids(&ranker.rank("bus", &corpus)), vec!["2"]);
        assert!(ranker.rank("hostel", &corpus).is_empty());
    }

    #[test]
    fn top_k_is_configurable() {
        let ranker = SearchRanker::with_top_k(2);
        let corpus = snapshot(
            (0..4)
                .map(|i| record(&i.to_string(), "Event", "fest"))
                .collect(),
        );
        assert_eq!(ranker.rank("event", &corpus).len(), 2);
    }
}
