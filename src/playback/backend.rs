//! Audio capability traits
//!
//! The controller only talks to these. Asynchronous work (init, prime,
//! start) is kicked off through them and its outcome comes back to the
//! controller as a `PlaybackEvent` tagged with the cycle that started it.

/// Identifies one play cycle. Events from older cycles are ignored.
pub type CycleId = u64;

/// Everything a synthesizer needs to prepare one cycle
#[derive(Debug)]
pub struct SynthRequest<'a, V> {
    pub cycle: CycleId,
    pub visual: &'a V,
    pub millis_per_measure: f64,
    pub program: u8,
    pub sound_font_url: &'a str,
}

/// A synthesizer instance. Used for exactly one cycle, then stopped and dropped.
pub trait Synthesizer {
    type Visual;

    /// Start init + prime for `request`. Report completion (or failure of
    /// the asynchronous part) as `PlaybackEvent::Primed`, and the end of
    /// audio as `PlaybackEvent::Ended`. An `Err` here means the request was
    /// rejected synchronously.
    fn prepare(&mut self, request: &SynthRequest<'_, Self::Visual>) -> Result<(), String>;

    /// Begin audible playback. Asynchronous failures are reported as
    /// `PlaybackEvent::Failed`.
    fn start(&mut self) -> Result<(), String>;

    /// Halt playback. Must be safe to call in any state.
    fn stop(&mut self);
}

/// Timing callbacks registered against a rendered score
pub trait TimingCallbacks {
    fn start(&mut self);
    fn stop(&mut self);
}

/// Allocates synthesizers and owns the audio context behind them
pub trait AudioBackend {
    type Visual;
    type Synth: Synthesizer<Visual = Self::Visual>;

    /// A fresh synthesizer for a new cycle. Implementations dispose of any
    /// audio context left over from the previous cycle first.
    fn create_synth(&mut self) -> Result<Self::Synth, String>;

    /// Release process-wide audio resources (view teardown)
    fn release(&mut self) {}
}

/// Asynchronous outcome reported back to the controller
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    /// Init + prime finished
    Primed {
        cycle: CycleId,
        result: Result<(), String>,
    },
    /// The synthesizer reached the end of the score
    Ended { cycle: CycleId },
    /// Playback failed after start
    Failed { cycle: CycleId, message: String },
}

impl PlaybackEvent {
    pub fn cycle(&self) -> CycleId {
        match self {
            PlaybackEvent::Primed { cycle, .. }
            | PlaybackEvent::Ended { cycle }
            | PlaybackEvent::Failed { cycle, .. } => *cycle,
        }
    }
}
