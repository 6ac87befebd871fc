//! Playback parameters: tempo, transposition, loop and instrument
//!
//! Every change to a `PlaybackSettings` field invalidates in-flight playback;
//! the controller owns that policy, this module only holds validated values.

use serde::{Deserialize, Serialize};

/// Tempo in quarter-note beats per minute, always within 40..=200
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(from = "u32", into = "u32")]
pub struct Tempo(u32);

impl Tempo {
    pub const MIN: u32 = 40;
    pub const MAX: u32 = 200;
    pub const DEFAULT: Tempo = Tempo(100);

    /// Clamp any bpm value into range
    pub fn new(bpm: u32) -> Self {
        Tempo(bpm.clamp(Self::MIN, Self::MAX))
    }

    pub fn bpm(self) -> u32 {
        self.0
    }

    pub fn step_up(self) -> Self {
        Tempo::new(self.0.saturating_add(1))
    }

    pub fn step_down(self) -> Self {
        Tempo::new(self.0.saturating_sub(1))
    }

    /// Commit a value typed into the tempo field.
    ///
    /// Digits only; anything else (including empty input) falls back to the
    /// slowest tempo.
    pub fn from_input(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Tempo(Self::MIN);
        }
        // All-digit strings only fail to parse on overflow
        match text.parse::<u32>() {
            Ok(bpm) => Tempo::new(bpm),
            Err(_) => Tempo(Self::MAX),
        }
    }

    /// Duration of a 4-beat measure in milliseconds.
    ///
    /// `correction` compensates for the synthesizer's own tempo assumptions.
    pub fn millis_per_measure(self, correction: f64) -> f64 {
        (60000.0 / (self.0 as f64 * correction)) * 4.0
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for Tempo {
    fn from(bpm: u32) -> Self {
        Tempo::new(bpm)
    }
}

impl From<Tempo> for u32 {
    fn from(tempo: Tempo) -> Self {
        tempo.0
    }
}

/// Transposition offset in semitones, always within -12..=12
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(from = "i32", into = "i32")]
pub struct Transposition(i32);

impl Transposition {
    pub const MIN: i32 = -12;
    pub const MAX: i32 = 12;

    pub fn new(semitones: i32) -> Self {
        Transposition(semitones.clamp(Self::MIN, Self::MAX))
    }

    pub fn semitones(self) -> i32 {
        self.0
    }

    pub fn is_identity(self) -> bool {
        self.0 == 0
    }

    pub fn step_up(self) -> Self {
        Transposition::new(self.0 + 1)
    }

    pub fn step_down(self) -> Self {
        Transposition::new(self.0 - 1)
    }
}

impl From<i32> for Transposition {
    fn from(semitones: i32) -> Self {
        Transposition::new(semitones)
    }
}

impl From<Transposition> for i32 {
    fn from(t: Transposition) -> Self {
        t.0
    }
}

/// A General MIDI program offered in the instrument selector
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instrument {
    pub program: u8,
    pub name: &'static str,
}

/// Instruments offered by the player, in selector order
pub const INSTRUMENTS: &[Instrument] = &[
    Instrument { program: 0, name: "Piano" },
    Instrument { program: 1, name: "Acoustic Guitar" },
    Instrument { program: 24, name: "Acoustic Guitar (nylon)" },
    Instrument { program: 40, name: "Violin" },
    Instrument { program: 42, name: "Cello" },
    Instrument { program: 52, name: "Choir Aahs" },
    Instrument { program: 56, name: "Trumpet" },
    Instrument { program: 73, name: "Flute" },
];

/// Default program (acoustic grand piano)
pub const DEFAULT_PROGRAM: u8 = 0;

/// Look up a program in the catalog
pub fn instrument_for_program(program: u8) -> Option<&'static Instrument> {
    INSTRUMENTS.iter().find(|i| i.program == program)
}

/// Parameters the next playback cycle is started with
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSettings {
    pub tempo: Tempo,
    pub transposition: Transposition,
    pub looping: bool,
    pub program: u8,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tempo: Tempo::DEFAULT,
            transposition: Transposition::default(),
            looping: false,
            program: DEFAULT_PROGRAM,
        }
    }
}
