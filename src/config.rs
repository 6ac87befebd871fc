//! View configuration
//!
//! Compile-time defaults plus the runtime `ViewConfig` handed in from
//! JavaScript as a plain object.

use serde::{Deserialize, Serialize};

use crate::error::ScoreViewError;
use crate::render::RenderOptions;

/// Element id the score is drawn into
pub const DEFAULT_CONTAINER_ID: &str = "abc-container";

/// Lines of notation text per display page
pub const DEFAULT_MAX_LINES_PER_PAGE: usize = 20;

/// Sound font location used by the synthesizer
pub const DEFAULT_SOUND_FONT_URL: &str = "https://paulrosen.github.io/midi-js-soundfonts/abcjs/";

/// Corrects for the renderer's internal quarter-note tempo assumption
pub const DEFAULT_TEMPO_CORRECTION: f64 = 1.1667;

/// Runtime configuration for a score view
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewConfig {
    pub container_id: String,
    pub max_lines_per_page: usize,
    pub sound_font_url: String,
    pub tempo_correction: f64,
    /// Options for the full (transposed) score render that drives playback
    pub score_render: RenderOptions,
    /// Options for drawing a single page
    pub page_render: RenderOptions,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            container_id: DEFAULT_CONTAINER_ID.to_string(),
            max_lines_per_page: DEFAULT_MAX_LINES_PER_PAGE,
            sound_font_url: DEFAULT_SOUND_FONT_URL.to_string(),
            tempo_correction: DEFAULT_TEMPO_CORRECTION,
            score_render: RenderOptions::score(),
            page_render: RenderOptions::page(),
        }
    }
}

impl ViewConfig {
    /// Reject values the view cannot work with
    pub fn validate(&self) -> Result<(), ScoreViewError> {
        if self.container_id.trim().is_empty() {
            return Err(ScoreViewError::InvalidConfig(
                "containerId must not be empty".to_string(),
            ));
        }
        if self.max_lines_per_page == 0 {
            return Err(ScoreViewError::InvalidConfig(
                "maxLinesPerPage must be at least 1".to_string(),
            ));
        }
        if !(self.tempo_correction.is_finite() && self.tempo_correction > 0.0) {
            return Err(ScoreViewError::InvalidConfig(format!(
                "tempoCorrection must be positive (got {})",
                self.tempo_correction
            )));
        }
        Ok(())
    }
}
