//! Mozartify Score View WASM Module
//!
//! Client-side engine behind the music score view: loads ABC notation,
//! transposes and paginates it, renders it through abcjs and drives abcjs
//! audio synthesis through a small playback state machine.

pub mod api;
pub mod config;
pub mod error;
pub mod notation;
pub mod playback;
pub mod render;
pub mod view;

// Re-export commonly used types
pub use config::ViewConfig;
pub use error::{LoadError, RenderError, ScoreViewError};
pub use notation::{paginate, transpose, NotationDocument, PaginationState, ScoreMetadata};
pub use playback::{PlaybackController, PlaybackSettings, PlaybackState, Tempo, Transposition};
pub use render::{NotationRenderer, RenderOptions, Rendered, RendererAdapter};
pub use view::{ControlAccess, LockedFeature, ScoreView, ViewStatus};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    if console_log::init_with_level(log::Level::Debug).is_err() {
        web_sys::console::warn_1(&"[WASM] logger already initialized".into());
    }

    log::info!("Mozartify score view WASM module initialized");
}
