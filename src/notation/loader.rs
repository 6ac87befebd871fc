//! Notation Loader
//!
//! Decodes the score record returned by `GET /abc-file/{id}` and extracts the
//! initial tempo from the notation header. The fetch itself is performed by
//! the host page; this module only sees its result.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::LoadError;
use crate::notation::document::{NotationDocument, ScoreMetadata};
use crate::playback::settings::Tempo;

/// Quarter-note tempo directive, e.g. `Q: 1/4=120`
static TEMPO_DIRECTIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Q:\s*1/4\s*=\s*(\d+)").expect("valid tempo regex"));

/// Wire shape of a score record: notation content plus catalog fields
#[derive(Deserialize, Debug)]
struct ScoreRecord {
    #[serde(default)]
    content: Option<String>,
    #[serde(flatten)]
    metadata: ScoreMetadata,
}

/// A decoded document together with its tempo hint
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedScore {
    pub document: NotationDocument,
    pub initial_tempo: Tempo,
}

/// Endpoint path for a score record
pub fn score_path(id: &str) -> String {
    format!("/abc-file/{}", id)
}

/// Extract the initial tempo from the notation text.
///
/// Falls back to `Tempo::DEFAULT` when no directive is present or its value
/// does not fit; values outside the playable range are clamped.
pub fn extract_tempo(abc: &str) -> Tempo {
    TEMPO_DIRECTIVE_RE
        .captures(abc)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(Tempo::new)
        .unwrap_or(Tempo::DEFAULT)
}

/// Build a document from an already-parsed score record
pub fn load_from_value(id: &str, record: serde_json::Value) -> Result<LoadedScore, LoadError> {
    let record: ScoreRecord = serde_json::from_value(record)
        .map_err(|e| LoadError::MalformedResponse(e.to_string()))?;
    into_loaded(id, record)
}

/// Build a document from a raw JSON response body
pub fn load_from_json(id: &str, body: &str) -> Result<LoadedScore, LoadError> {
    let record: ScoreRecord =
        serde_json::from_str(body).map_err(|e| LoadError::MalformedResponse(e.to_string()))?;
    into_loaded(id, record)
}

fn into_loaded(id: &str, record: ScoreRecord) -> Result<LoadedScore, LoadError> {
    let content = record.content.ok_or(LoadError::MissingContent)?;
    let initial_tempo = extract_tempo(&content);

    log::info!(
        "Loaded score {} ({} lines, initial tempo {} bpm)",
        id,
        content.lines().count(),
        initial_tempo.bpm()
    );

    Ok(LoadedScore {
        document: NotationDocument::new(id, content, record.metadata),
        initial_tempo,
    })
}
