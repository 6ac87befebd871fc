//! Notation documents and their catalog metadata

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder shown for empty metadata values
pub const EMPTY_VALUE: &str = "N/A";

/// Storage-internal keys that are never shown to the user
const HIDDEN_KEYS: &[&str] = &[
    "title",
    "artist",
    "composer",
    "genre",
    "instrumentation",
    "content",
    "__v",
    "_id",
    "filename",
    "coverImageUrl",
    "deleted",
    "mp3FileName",
    "mp3FileUrl",
    "downloadEvents",
];

const DATE_KEYS: &[&str] = &[
    "dateAccessioned",
    "dateAvailable",
    "dateIssued",
    "dateOfBirth",
    "dateOfComposition",
    "dateOfCreation",
    "dateOfRecording",
    "lastModified",
    "dateUploaded",
];

/// A loaded ABC score. Immutable for the lifetime of a view session.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NotationDocument {
    pub id: String,
    /// Raw ABC text: header directives and body lines
    pub content: String,
    pub metadata: ScoreMetadata,
}

impl NotationDocument {
    pub fn new(id: impl Into<String>, content: impl Into<String>, metadata: ScoreMetadata) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata,
        }
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

/// Catalog metadata attached to a score
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ScoreMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub composer: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub instrumentation: Option<String>,
    /// Any other catalog attributes, keyed as stored
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One labelled line of the metadata panel
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MetadataRow {
    pub label: String,
    pub value: String,
}

impl MetadataRow {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

impl ScoreMetadata {
    /// Rows for the metadata panel: fixed fields first, then the remaining
    /// attributes sorted by key, ignoring case.
    pub fn display_rows(&self) -> Vec<MetadataRow> {
        let fixed = [
            ("Title", &self.title),
            ("Artist", &self.artist),
            ("Composer", &self.composer),
            ("Genre", &self.genre),
            ("Instrumentation", &self.instrumentation),
        ];

        let mut rows: Vec<MetadataRow> = fixed
            .iter()
            .map(|(label, value)| {
                let value = value
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .unwrap_or(EMPTY_VALUE);
                MetadataRow::new(*label, value)
            })
            .collect();

        let mut extra: Vec<(&String, &Value)> = self
            .extra
            .iter()
            .filter(|(key, _)| !HIDDEN_KEYS.contains(&key.as_str()))
            .collect();
        extra.sort_by(|(a, _), (b, _)| compare_keys(a, b));

        for (key, value) in extra {
            rows.push(MetadataRow::new(humanize_key(key), format_value(key, value)));
        }

        rows
    }
}

/// Case-insensitive key order; on a tie the lowercase spelling comes first
fn compare_keys(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// "dateOfComposition" -> "Date Of Composition"
pub fn humanize_key(key: &str) -> String {
    let mut label = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if i == 0 {
            label.extend(ch.to_uppercase());
        } else {
            if ch.is_ascii_uppercase() {
                label.push(' ');
            }
            label.push(ch);
        }
    }
    label
}

fn format_value(key: &str, value: &Value) -> String {
    let text = match value {
        Value::Null => None,
        Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            Some(parts.join(", ")).filter(|s| !s.is_empty())
        }
        Value::Object(_) => Some(value.to_string()),
    };

    let Some(text) = text else {
        return EMPTY_VALUE.to_string();
    };

    if DATE_KEYS.contains(&key) {
        return format_date(&text).unwrap_or(text);
    }
    if key.eq_ignore_ascii_case("price") {
        return format!("RM {}", text);
    }
    text
}

/// Format an ISO timestamp or date as dd/MM/yyyy
fn format_date(raw: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.format("%d/%m/%Y").to_string());
    }
    let date_part = raw.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%d/%m/%Y").to_string())
}
