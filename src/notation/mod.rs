//! ABC notation handling: documents, loading, transposition and pagination
//!
//! Everything in this module is pure text processing and does not touch the
//! renderer or the synthesizer.

pub mod document;
pub mod loader;
pub mod paginate;
pub mod transpose;

pub use document::{MetadataRow, NotationDocument, ScoreMetadata};
pub use loader::{extract_tempo, load_from_json, load_from_value, LoadedScore};
pub use paginate::{paginate, PaginationState};
pub use transpose::{is_directive_line, transpose};
