//! Mozartify Score View WASM API
//!
//! JavaScript-facing surface of the crate.
//!
//! # Module Structure
//!
//! - `helpers`: console logging macros, serde conversion, error conversion
//! - `abcjs`: abcjs imports and the renderer/synthesizer adapters built on them
//! - `score_view`: the exported `MusicScoreView` class
//! - `notation`: stateless helpers (transpose, paginate, tempo, instruments)

pub mod helpers;
pub mod abcjs;
pub mod notation;
pub mod score_view;

pub use notation::{extract_tempo, instrument_catalog, paginate_abc, score_path, transpose_abc};
pub use score_view::MusicScoreView;
