//! Playback Controller
//!
//! State machine around one synthesizer / timing-callback pair:
//!
//! ```text
//! Idle|Stopped --play--> Priming --primed--> Playing --ended(no loop)--> Stopped
//!                           ^                   |
//!                           +---ended(loop)-----+
//! ```
//!
//! Every exit path (explicit stop, failure, parameter change, teardown) goes
//! through `release_handles`, so at most one synthesizer and one set of timing
//! callbacks are live at any time.

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::error::ScoreViewError;
use crate::playback::backend::{
    AudioBackend, CycleId, PlaybackEvent, SynthRequest, Synthesizer, TimingCallbacks,
};
use crate::playback::settings::{PlaybackSettings, Tempo, Transposition};
use crate::render::Rendered;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum PlaybackState {
    Idle = 0,
    Priming = 1,
    Playing = 2,
    Stopped = 3,
}

impl PlaybackState {
    /// Priming or playing: a synthesizer is allocated
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackState::Priming | PlaybackState::Playing)
    }
}

/// Result of a play request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    /// A new cycle is priming
    Priming(CycleId),
    /// A cycle is already priming or playing; nothing was allocated
    AlreadyActive(CycleId),
    /// No rendered score to play
    NothingToPlay,
}

/// Result of handling a `PlaybackEvent`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// Priming finished and audio started
    Started,
    /// End of score with looping on; a new cycle is priming
    Restarted(CycleId),
    /// End of score; released and stopped
    Stopped,
    /// Event belonged to an older cycle or no longer applies
    Ignored,
}

pub struct PlaybackController<B, T>
where
    B: AudioBackend,
    T: TimingCallbacks + Clone,
{
    backend: B,
    state: PlaybackState,
    settings: PlaybackSettings,
    synth: Option<B::Synth>,
    timing: Option<T>,
    cycle: CycleId,
    tempo_correction: f64,
    sound_font_url: String,
}

impl<B, T> PlaybackController<B, T>
where
    B: AudioBackend,
    T: TimingCallbacks + Clone,
{
    pub fn new(backend: B, tempo_correction: f64, sound_font_url: impl Into<String>) -> Self {
        Self {
            backend,
            state: PlaybackState::Idle,
            settings: PlaybackSettings::default(),
            synth: None,
            timing: None,
            cycle: 0,
            tempo_correction,
            sound_font_url: sound_font_url.into(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    /// Cycle of the most recent play request
    pub fn current_cycle(&self) -> CycleId {
        self.cycle
    }

    pub fn has_live_synth(&self) -> bool {
        self.synth.is_some()
    }

    pub fn has_live_timing(&self) -> bool {
        self.timing.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Measure duration the next cycle will be primed with
    pub fn millis_per_measure(&self) -> f64 {
        self.settings.tempo.millis_per_measure(self.tempo_correction)
    }

    /// Handle a play request.
    ///
    /// While a cycle is priming or playing this is a no-op, so repeated
    /// requests never allocate a second synthesizer.
    pub fn play(
        &mut self,
        rendered: Option<&Rendered<B::Visual, T>>,
    ) -> Result<PlayOutcome, ScoreViewError> {
        if self.state.is_active() {
            log::debug!("Play ignored: cycle {} is {:?}", self.cycle, self.state);
            return Ok(PlayOutcome::AlreadyActive(self.cycle));
        }
        let Some(rendered) = rendered else {
            log::warn!("Play ignored: nothing rendered");
            return Ok(PlayOutcome::NothingToPlay);
        };
        self.begin_cycle(rendered).map(PlayOutcome::Priming)
    }

    /// Explicit stop request
    pub fn stop(&mut self) {
        if self.state.is_active() {
            log::info!("Stopping cycle {}", self.cycle);
        }
        self.stop_and_reset();
    }

    /// Release the synthesizer and timing callbacks and settle in `Stopped`
    /// (or stay `Idle` if nothing was ever played). Idempotent.
    pub fn stop_and_reset(&mut self) {
        self.release_handles();
        if self.state != PlaybackState::Idle {
            self.state = PlaybackState::Stopped;
        }
    }

    /// View teardown: release everything including the audio context
    pub fn teardown(&mut self) {
        self.release_handles();
        self.backend.release();
        self.state = PlaybackState::Idle;
    }

    /// Apply an asynchronous outcome. Events from superseded cycles are ignored.
    pub fn handle_event(
        &mut self,
        event: PlaybackEvent,
        rendered: Option<&Rendered<B::Visual, T>>,
    ) -> Result<EventOutcome, ScoreViewError> {
        if event.cycle() != self.cycle {
            log::debug!("Stale event for cycle {} (current {})", event.cycle(), self.cycle);
            return Ok(EventOutcome::Ignored);
        }

        match event {
            PlaybackEvent::Primed { result, .. } => self.priming_finished(result),
            PlaybackEvent::Ended { .. } => self.playback_ended(rendered),
            PlaybackEvent::Failed { message, .. } => {
                if !self.state.is_active() {
                    return Ok(EventOutcome::Ignored);
                }
                Err(self.fail(ScoreViewError::PlaybackFailure(message)))
            }
        }
    }

    pub fn set_tempo(&mut self, tempo: Tempo) -> bool {
        self.update(|s| s.tempo = tempo)
    }

    pub fn set_transposition(&mut self, transposition: Transposition) -> bool {
        self.update(|s| s.transposition = transposition)
    }

    pub fn set_looping(&mut self, looping: bool) -> bool {
        self.update(|s| s.looping = looping)
    }

    pub fn set_program(&mut self, program: u8) -> bool {
        self.update(|s| s.program = program)
    }

    /// Replace all settings at once (e.g. when a new document seeds the tempo)
    pub fn replace_settings(&mut self, settings: PlaybackSettings) -> bool {
        self.update(|s| *s = settings)
    }

    /// Any parameter change invalidates in-flight playback. Playback is not
    /// resumed afterwards.
    fn update(&mut self, apply: impl FnOnce(&mut PlaybackSettings)) -> bool {
        let mut next = self.settings;
        apply(&mut next);
        if next == self.settings {
            return false;
        }
        self.settings = next;
        self.stop_and_reset();
        true
    }

    fn begin_cycle(&mut self, rendered: &Rendered<B::Visual, T>) -> Result<CycleId, ScoreViewError> {
        self.release_handles();
        self.cycle += 1;
        self.state = PlaybackState::Priming;
        let cycle = self.cycle;

        let mut synth = match self.backend.create_synth() {
            Ok(synth) => synth,
            Err(message) => return Err(self.fail(ScoreViewError::PrimingFailure(message))),
        };

        let request = SynthRequest {
            cycle,
            visual: &rendered.visual,
            millis_per_measure: self.settings.tempo.millis_per_measure(self.tempo_correction),
            program: self.settings.program,
            sound_font_url: &self.sound_font_url,
        };
        if let Err(message) = synth.prepare(&request) {
            synth.stop();
            return Err(self.fail(ScoreViewError::PrimingFailure(message)));
        }

        log::info!(
            "Priming cycle {} ({} bpm, program {}, loop {})",
            cycle,
            self.settings.tempo.bpm(),
            self.settings.program,
            self.settings.looping
        );
        self.synth = Some(synth);
        self.timing = Some(rendered.timing.clone());
        Ok(cycle)
    }

    fn priming_finished(&mut self, result: Result<(), String>) -> Result<EventOutcome, ScoreViewError> {
        if self.state != PlaybackState::Priming {
            return Ok(EventOutcome::Ignored);
        }
        if let Err(message) = result {
            return Err(self.fail(ScoreViewError::PrimingFailure(message)));
        }

        self.state = PlaybackState::Playing;
        if let Some(timing) = self.timing.as_mut() {
            timing.start();
        }
        let started = match self.synth.as_mut() {
            Some(synth) => synth.start(),
            None => Err("synthesizer released before start".to_string()),
        };
        if let Err(message) = started {
            return Err(self.fail(ScoreViewError::PlaybackFailure(message)));
        }

        log::info!("Cycle {} playing", self.cycle);
        Ok(EventOutcome::Started)
    }

    fn playback_ended(
        &mut self,
        rendered: Option<&Rendered<B::Visual, T>>,
    ) -> Result<EventOutcome, ScoreViewError> {
        if self.state != PlaybackState::Playing {
            return Ok(EventOutcome::Ignored);
        }
        if self.settings.looping {
            match rendered {
                Some(rendered) => return self.begin_cycle(rendered).map(EventOutcome::Restarted),
                None => log::warn!("Loop restart skipped: nothing rendered"),
            }
        }
        log::info!("Cycle {} finished", self.cycle);
        self.stop_and_reset();
        Ok(EventOutcome::Stopped)
    }

    /// Report, reset to `Stopped`, hand the error back
    fn fail(&mut self, error: ScoreViewError) -> ScoreViewError {
        log::error!("Cycle {}: {}", self.cycle, error);
        self.release_handles();
        self.state = PlaybackState::Stopped;
        error
    }

    fn release_handles(&mut self) {
        if let Some(mut synth) = self.synth.take() {
            synth.stop();
        }
        if let Some(mut timing) = self.timing.take() {
            timing.stop();
        }
    }
}

impl<B, T> Drop for PlaybackController<B, T>
where
    B: AudioBackend,
    T: TimingCallbacks + Clone,
{
    fn drop(&mut self) {
        self.release_handles();
    }
}
