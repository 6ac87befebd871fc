//! Audio playback: settings, capability traits and the controller state machine

pub mod backend;
pub mod controller;
pub mod settings;

pub use backend::{AudioBackend, CycleId, PlaybackEvent, SynthRequest, Synthesizer, TimingCallbacks};
pub use controller::{EventOutcome, PlayOutcome, PlaybackController, PlaybackState};
pub use settings::{instrument_for_program, Instrument, PlaybackSettings, Tempo, Transposition, INSTRUMENTS};
