//! Evidence context: the ranked records handed to the prompt, and their
//! text rendering.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::knowledge::KnowledgeRecord;

/// One ranked record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evidence {
    pub record_id: String,
    pub title: Option<String>,
    pub details: Map<String, Value>,
    pub text_for_ai: String,
    pub score: u32,
}

impl Evidence {
    pub fn from_record(record: &KnowledgeRecord, score: u32) -> Self {
        Self {
            record_id: record.id().to_string(),
            title: record.title().map(str::to_string),
            details: record.details().clone(),
            text_for_ai: record.text_for_ai().to_string(),
            score,
        }
    }
}

/// Ranked evidence, highest score first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvidenceContext {
    entries: Vec<Evidence>,
}

impl EvidenceContext {
    pub fn new(entries: Vec<Evidence>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Evidence] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders every entry as a numbered source block:
    ///
    /// ```text
    /// --- SOURCE 1 ---
    /// Title: Library Hours
    /// Details: {"open":"9am"}
    /// Summary: The library is open 9am-9pm.
    /// ```
    ///
    /// Blocks are separated by a blank line; an empty context renders as "".
    pub fn render(&self) -> String {
        let mut context = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            context.push_str(&format!(
                "--- SOURCE {} ---\nTitle: {}\nDetails: {}\nSummary: {}\n\n",
                i + 1,
                entry.title.as_deref().unwrap_or("N/A"),
                Value::Object(entry.details.clone()),
                entry.text_for_ai
            ));
        }
        context
    }

    /// Titles of the records used, in rank order.
    pub fn titles(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|entry| entry.title.as_deref().unwrap_or("N/A"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn evidence(title: Option<&str>, details: Value, text: &str, score: u32) -> Evidence {
        Evidence {
            record_id: "r".to_string(),
            title: title.map(str::to_string),
            details: details.as_object().cloned().unwrap_or_default(),
            text_for_ai: text.to_string(),
            score,
        }
    }

    #[test]
    fn empty_context_renders_nothing() {
        assert_eq!(EvidenceContext::empty().render(), "");
    }

    #[test]
    fn renders_numbered_source_blocks() {
        let context = EvidenceContext::new(vec![
            evidence(Some("Library Hours"), json!({ "open": "9am" }), "9am-9pm", 6),
            evidence(None, json!({}), "library deadline June", 1),
        ]);

        assert_eq!(
            context.render(),
            "--- SOURCE 1 ---\nTitle: Library Hours\nDetails: {\"open\":\"9am\"}\nSummary: 9am-9pm\n\n\
             --- SOURCE 2 ---\nTitle: N/A\nDetails: {}\nSummary: library deadline June\n\n"
        );
        assert_eq!(context.titles(), vec!["Library Hours", "N/A"]);
    }
}
