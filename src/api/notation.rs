//! Stateless notation helpers exported to JavaScript

use wasm_bindgen::prelude::*;

use crate::api::helpers::serialize;
use crate::notation::loader;
use crate::notation::paginate::paginate;
use crate::notation::transpose::transpose;
use crate::playback::settings::INSTRUMENTS;

/// Transpose the body lines of an ABC text
#[wasm_bindgen(js_name = transposeAbc)]
pub fn transpose_abc(abc: &str, semitones: i32) -> String {
    transpose(abc, semitones)
}

/// Split ABC text into pages of at most `max_lines_per_page` lines
#[wasm_bindgen(js_name = paginateAbc)]
pub fn paginate_abc(abc: &str, max_lines_per_page: usize) -> Result<JsValue, JsValue> {
    serialize(&paginate(abc, max_lines_per_page), "Pages")
}

/// Initial tempo (bpm) declared by a `Q:1/4=N` directive, or the default
#[wasm_bindgen(js_name = extractTempo)]
pub fn extract_tempo(abc: &str) -> u32 {
    loader::extract_tempo(abc).bpm()
}

/// Request path for a score record
#[wasm_bindgen(js_name = scorePath)]
pub fn score_path(id: &str) -> String {
    loader::score_path(id)
}

/// `[{ program, name }]` for the instrument selector
#[wasm_bindgen(js_name = instrumentCatalog)]
pub fn instrument_catalog() -> Result<JsValue, JsValue> {
    serialize(&INSTRUMENTS, "Instrument catalog")
}
