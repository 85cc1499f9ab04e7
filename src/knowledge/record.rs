//! Knowledge record schema.
//!
//! Persisted documents are loosely shaped JSON. They are validated once, at
//! load time, and turned into immutable [`KnowledgeRecord`]s whose search
//! text is precomputed so ranking never touches raw JSON.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

const ID_FIELDS: [&str; 2] = ["id", "_id"];

/// One document as handed over by a corpus source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Identifier assigned by the backing store, if it has one.
    pub id: Option<String>,
    pub body: Value,
}

impl RawDocument {
    pub fn new(id: Option<String>, body: Value) -> Self {
        Self { id, body }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct RecordError {
    pub field: &'static str,
    pub reason: String,
}

impl RecordError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeRecord {
    id: String,
    title: Option<String>,
    details: Map<String, Value>,
    text_for_ai: String,
    extra: Map<String, Value>,
    #[serde(skip)]
    title_lower: String,
    #[serde(skip)]
    search_text: String,
}

impl KnowledgeRecord {
    pub fn new(
        id: impl Into<String>,
        title: Option<String>,
        details: Map<String, Value>,
        text_for_ai: impl Into<String>,
        extra: Map<String, Value>,
    ) -> Self {
        let text_for_ai = text_for_ai.into();
        let title_lower = title.as_deref().unwrap_or_default().to_lowercase();
        let search_text = render_search_text(title.as_deref(), &details, &text_for_ai, &extra);
        Self {
            id: id.into(),
            title,
            details,
            text_for_ai,
            extra,
            title_lower,
            search_text,
        }
    }

    /// Validates a persisted document. `position` is only used to build an
    /// identifier when neither the store nor the document carries one.
    pub fn from_document(position: usize, raw: RawDocument) -> Result<Self, RecordError> {
        let Value::Object(mut fields) = raw.body else {
            return Err(RecordError::new("document", "expected a JSON object"));
        };

        let document_id = ID_FIELDS
            .iter()
            .find_map(|key| fields.remove(*key))
            .and_then(|value| match value {
                Value::String(text) => Some(text),
                Value::Number(number) => Some(number.to_string()),
                Value::Object(map) => map
                    .get("$oid")
                    .and_then(|oid| oid.as_str())
                    .map(str::to_string),
                _ => None,
            });
        let id = raw
            .id
            .or(document_id)
            .unwrap_or_else(|| format!("record-{}", position));

        let title = match fields.remove("title") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text),
            Some(_) => return Err(RecordError::new("title", "expected a string")),
        };

        let details = match fields.remove("details") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(RecordError::new("details", "expected an object")),
        };

        let text_for_ai = match fields.remove("text_for_ai") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text,
            Some(_) => return Err(RecordError::new("text_for_ai", "expected a string")),
        };

        Ok(Self::new(id, title, details, text_for_ai, fields))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn details(&self) -> &Map<String, Value> {
        &self.details
    }

    pub fn text_for_ai(&self) -> &str {
        &self.text_for_ai
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Lower-cased title, empty when the record has none.
    pub fn title_lower(&self) -> &str {
        &self.title_lower
    }

    /// Lower-cased rendering of every field, used for substring matching.
    pub fn search_text(&self) -> &str {
        &self.search_text
    }
}

fn render_search_text(
    title: Option<&str>,
    details: &Map<String, Value>,
    text_for_ai: &str,
    extra: &Map<String, Value>,
) -> String {
    let mut parts = Vec::with_capacity(4);
    if let Some(title) = title {
        parts.push(title.to_string());
    }
    if !details.is_empty() {
        parts.push(Value::Object(details.clone()).to_string());
    }
    if !text_for_ai.is_empty() {
        parts.push(text_for_ai.to_string());
    }
    if !extra.is_empty() {
        parts.push(Value::Object(extra.clone()).to_string());
    }
    parts.join("\n").to_lowercase()
}
