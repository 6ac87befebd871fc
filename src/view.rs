//! Score view
//!
//! Ties the loader, transposition, renderer, paginator and playback controller
//! together for one mounted view. All parameter changes are routed through
//! the controller so in-flight playback is always stopped first.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ViewConfig;
use crate::error::{LoadError, ScoreViewError};
use crate::notation::document::{MetadataRow, NotationDocument};
use crate::notation::loader::{self, LoadedScore};
use crate::notation::paginate::PaginationState;
use crate::notation::transpose::transpose;
use crate::playback::backend::{AudioBackend, PlaybackEvent};
use crate::playback::controller::{EventOutcome, PlayOutcome, PlaybackController, PlaybackState};
use crate::playback::settings::{
    instrument_for_program, PlaybackSettings, Tempo, Transposition, DEFAULT_PROGRAM,
};
use crate::render::{NotationRenderer, RendererAdapter};

/// Loading/error display state
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "status", content = "message", rename_all = "camelCase")]
pub enum ViewStatus {
    Loading,
    Ready,
    Failed(String),
}

/// Which controls the viewer may use
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ControlAccess {
    /// Clerk/admin views and customers who bought the score
    Full,
    /// Customers who have not bought the score
    Preview,
}

/// Controls that are unavailable in `ControlAccess::Preview`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LockedFeature {
    Tempo,
    Transposition,
    Loop,
    Pagination,
    Instrument,
}

impl fmt::Display for LockedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LockedFeature::Tempo => "Tempo",
            LockedFeature::Transposition => "Transpose",
            LockedFeature::Loop => "Loop",
            LockedFeature::Pagination => "Page navigation",
            LockedFeature::Instrument => "Instrument",
        };
        f.write_str(name)
    }
}

pub struct ScoreView<R, B>
where
    R: NotationRenderer,
    B: AudioBackend<Visual = R::Visual>,
{
    config: ViewConfig,
    access: ControlAccess,
    status: ViewStatus,
    /// Id of the document currently being loaded or shown
    document_id: Option<String>,
    document: Option<NotationDocument>,
    pagination: PaginationState,
    renderer: RendererAdapter<R>,
    player: PlaybackController<B, R::Timing>,
}

impl<R, B> ScoreView<R, B>
where
    R: NotationRenderer,
    B: AudioBackend<Visual = R::Visual>,
{
    /// `config` is expected to have passed `ViewConfig::validate`
    pub fn new(config: ViewConfig, renderer: R, backend: B, access: ControlAccess) -> Self {
        let player = PlaybackController::new(
            backend,
            config.tempo_correction,
            config.sound_font_url.clone(),
        );
        Self {
            pagination: PaginationState::new(config.max_lines_per_page),
            config,
            access,
            status: ViewStatus::Loading,
            document_id: None,
            document: None,
            renderer: RendererAdapter::new(renderer),
            player,
        }
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Mount or switch to document `id`; the fetch result arrives through
    /// `finish_load`
    pub fn begin_load(&mut self, id: &str) {
        log::info!("Loading score {}", id);
        self.player.teardown();
        self.renderer.clear();
        self.document = None;
        self.document_id = Some(id.to_string());
        self.status = ViewStatus::Loading;
    }

    /// Install a fetched document. Results for an id other than the one
    /// last passed to `begin_load` are dropped.
    pub fn finish_load(
        &mut self,
        id: &str,
        result: Result<LoadedScore, LoadError>,
    ) -> Result<(), ScoreViewError> {
        if self.document_id.as_deref() != Some(id) {
            log::debug!("Dropping stale load result for {}", id);
            return Ok(());
        }

        let loaded = match result {
            Ok(loaded) => loaded,
            Err(e) => {
                log::error!("Loading score {} failed: {}", id, e);
                self.status = ViewStatus::Failed(e.to_string());
                return Err(ScoreViewError::LoadFailure(e));
            }
        };

        self.player.set_tempo(loaded.initial_tempo);
        self.pagination.recompute(&loaded.document.content, true);
        self.document = Some(loaded.document);

        self.render_score()?;
        self.draw_page()?;
        self.status = ViewStatus::Ready;
        Ok(())
    }

    /// `begin_load` + decode a raw response body + `finish_load`
    pub fn load_json(&mut self, id: &str, body: &str) -> Result<(), ScoreViewError> {
        self.begin_load(id);
        let result = loader::load_from_json(id, body);
        self.finish_load(id, result)
    }

    /// Report a failed fetch for `id`
    pub fn fail_load(&mut self, id: &str, message: impl Into<String>) -> Result<(), ScoreViewError> {
        self.finish_load(id, Err(LoadError::Fetch(message.into())))
    }

    // ------------------------------------------------------------------
    // Rendering and pages
    // ------------------------------------------------------------------

    /// Render the whole (transposed) document; the result drives playback
    fn render_score(&mut self) -> Result<(), ScoreViewError> {
        let Some(document) = self.document.as_ref() else {
            return Ok(());
        };
        let text = transpose(&document.content, self.player.settings().transposition.semitones());

        if let Err(e) = self.renderer.render(&text, &self.config.score_render) {
            self.status = ViewStatus::Failed(e.to_string());
            return Err(ScoreViewError::RenderFailure(e));
        }
        Ok(())
    }

    /// Draw the current page, transposed like the full score
    fn draw_page(&mut self) -> Result<(), ScoreViewError> {
        let Some(page_text) = self.pagination.current_text() else {
            return Ok(());
        };
        let text = transpose(page_text, self.player.settings().transposition.semitones());

        if let Err(e) = self.renderer.draw(&text, &self.config.page_render) {
            log::error!("Drawing page {} failed: {}", self.pagination.current_page(), e);
            self.status = ViewStatus::Failed(e.to_string());
            return Err(ScoreViewError::RenderFailure(e));
        }
        Ok(())
    }

    /// Go to a 1-based page; returns the page actually shown
    pub fn show_page(&mut self, page: usize) -> Result<usize, ScoreViewError> {
        if page != 1 {
            self.require(LockedFeature::Pagination)?;
        }
        let shown = self.pagination.set_page(page);
        self.draw_page()?;
        Ok(shown)
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    pub fn play(&mut self) -> Result<PlayOutcome, ScoreViewError> {
        self.player.play(self.renderer.current())
    }

    pub fn stop(&mut self) {
        self.player.stop();
    }

    /// Play/stop button: stops an active cycle, otherwise starts one
    pub fn toggle_playback(&mut self) -> Result<PlaybackState, ScoreViewError> {
        if self.player.state().is_active() {
            self.player.stop();
        } else {
            self.play()?;
        }
        Ok(self.player.state())
    }

    pub fn handle_playback_event(
        &mut self,
        event: PlaybackEvent,
    ) -> Result<EventOutcome, ScoreViewError> {
        self.player.handle_event(event, self.renderer.current())
    }

    // ------------------------------------------------------------------
    // Controls
    // ------------------------------------------------------------------

    pub fn set_tempo(&mut self, tempo: Tempo) -> Result<Tempo, ScoreViewError> {
        self.require(LockedFeature::Tempo)?;
        self.player.set_tempo(tempo);
        Ok(self.player.settings().tempo)
    }

    /// Commit the text typed into the tempo field
    pub fn set_tempo_input(&mut self, text: &str) -> Result<Tempo, ScoreViewError> {
        self.set_tempo(Tempo::from_input(text))
    }

    pub fn step_tempo(&mut self, up: bool) -> Result<Tempo, ScoreViewError> {
        let current = self.player.settings().tempo;
        self.set_tempo(if up { current.step_up() } else { current.step_down() })
    }

    /// Change transposition and re-render in place (page index is kept)
    pub fn set_transposition(
        &mut self,
        transposition: Transposition,
    ) -> Result<Transposition, ScoreViewError> {
        self.require(LockedFeature::Transposition)?;
        if self.player.set_transposition(transposition) && self.document.is_some() {
            self.render_score()?;
            self.draw_page()?;
        }
        Ok(self.player.settings().transposition)
    }

    pub fn step_transposition(&mut self, up: bool) -> Result<Transposition, ScoreViewError> {
        let current = self.player.settings().transposition;
        self.set_transposition(if up { current.step_up() } else { current.step_down() })
    }

    pub fn set_looping(&mut self, looping: bool) -> Result<(), ScoreViewError> {
        self.require(LockedFeature::Loop)?;
        self.player.set_looping(looping);
        Ok(())
    }

    /// Preview access is limited to the default program
    pub fn set_program(&mut self, program: u8) -> Result<u8, ScoreViewError> {
        if program != DEFAULT_PROGRAM {
            self.require(LockedFeature::Instrument)?;
        }
        if instrument_for_program(program).is_none() {
            log::warn!("Program {} is not in the instrument catalog", program);
        }
        self.player.set_program(program);
        Ok(self.player.settings().program)
    }

    pub fn set_access(&mut self, access: ControlAccess) {
        if self.access == access {
            return;
        }
        self.access = access;
        if access == ControlAccess::Preview {
            self.player.set_program(DEFAULT_PROGRAM);
        }
        if access == ControlAccess::Preview && self.pagination.current_page() != 1 {
            self.pagination.set_page(1);
            if let Err(e) = self.draw_page() {
                log::error!("Redraw after access change failed: {}", e);
            }
        }
    }

    /// View teardown
    pub fn unmount(&mut self) {
        log::debug!("Unmounting score view");
        self.player.teardown();
        self.renderer.clear();
    }

    fn require(&self, feature: LockedFeature) -> Result<(), ScoreViewError> {
        if self.access == ControlAccess::Preview {
            log::warn!("{} requested in preview access", feature);
            return Err(ScoreViewError::FeatureLocked(feature));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn access(&self) -> ControlAccess {
        self.access
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn document(&self) -> Option<&NotationDocument> {
        self.document.as_ref()
    }

    pub fn metadata_rows(&self) -> Vec<MetadataRow> {
        self.document
            .as_ref()
            .map(|d| d.metadata.display_rows())
            .unwrap_or_default()
    }

    pub fn settings(&self) -> &PlaybackSettings {
        self.player.settings()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.player.state()
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn player(&self) -> &PlaybackController<B, R::Timing> {
        &self.player
    }

    pub fn renderer(&self) -> &RendererAdapter<R> {
        &self.renderer
    }
}
