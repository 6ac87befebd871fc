//! Recording test doubles for the renderer and audio capability traits

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use mozartify_score::playback::{AudioBackend, SynthRequest, Synthesizer, TimingCallbacks};
use mozartify_score::{NotationRenderer, RenderError, RenderOptions, Rendered};

/// Everything the doubles did, in order
#[derive(Default, Debug)]
pub struct Probe {
    pub log: Vec<String>,
    pub synths_created: usize,
    pub live_synths: usize,
    pub max_live_synths: usize,
    pub live_timings: usize,
    pub released: usize,
    pub fail_create: bool,
    pub fail_prepare: bool,
    pub fail_start: bool,
    pub fail_render: bool,
    pub last_measure_ms: Option<f64>,
    pub last_program: Option<u8>,
    pub renders: Vec<String>,
    pub draws: Vec<String>,
}

pub type Shared = Rc<RefCell<Probe>>;

pub fn probe() -> Shared {
    Rc::new(RefCell::new(Probe::default()))
}

pub struct MockSynth {
    id: usize,
    probe: Shared,
    stopped: bool,
}

impl Synthesizer for MockSynth {
    type Visual = String;

    fn prepare(&mut self, request: &SynthRequest<'_, String>) -> Result<(), String> {
        let mut p = self.probe.borrow_mut();
        p.log.push(format!("synth{} prepare cycle={}", self.id, request.cycle));
        p.last_measure_ms = Some(request.millis_per_measure);
        p.last_program = Some(request.program);
        if p.fail_prepare {
            return Err("init rejected".to_string());
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), String> {
        let mut p = self.probe.borrow_mut();
        p.log.push(format!("synth{} start", self.id));
        if p.fail_start {
            return Err("audio context suspended".to_string());
        }
        Ok(())
    }

    fn stop(&mut self) {
        let mut p = self.probe.borrow_mut();
        p.log.push(format!("synth{} stop", self.id));
        if !self.stopped {
            self.stopped = true;
            p.live_synths -= 1;
        }
    }
}

pub struct MockBackend {
    pub probe: Shared,
}

impl AudioBackend for MockBackend {
    type Visual = String;
    type Synth = MockSynth;

    fn create_synth(&mut self) -> Result<MockSynth, String> {
        let mut p = self.probe.borrow_mut();
        if p.fail_create {
            return Err("no audio device".to_string());
        }
        p.synths_created += 1;
        p.live_synths += 1;
        p.max_live_synths = p.max_live_synths.max(p.live_synths);
        let id = p.synths_created;
        p.log.push(format!("create synth{}", id));
        Ok(MockSynth {
            id,
            probe: self.probe.clone(),
            stopped: false,
        })
    }

    fn release(&mut self) {
        self.probe.borrow_mut().released += 1;
    }
}

#[derive(Clone)]
pub struct MockTiming {
    probe: Shared,
    running: bool,
}

impl MockTiming {
    pub fn new(probe: &Shared) -> Self {
        Self {
            probe: probe.clone(),
            running: false,
        }
    }
}

impl TimingCallbacks for MockTiming {
    fn start(&mut self) {
        let mut p = self.probe.borrow_mut();
        p.log.push("timing start".to_string());
        if !self.running {
            self.running = true;
            p.live_timings += 1;
        }
    }

    fn stop(&mut self) {
        let mut p = self.probe.borrow_mut();
        p.log.push("timing stop".to_string());
        if self.running {
            self.running = false;
            p.live_timings -= 1;
        }
    }
}

pub struct MockRenderer {
    pub probe: Shared,
}

impl NotationRenderer for MockRenderer {
    type Visual = String;
    type Timing = MockTiming;

    fn render(
        &mut self,
        abc: &str,
        _options: &RenderOptions,
    ) -> Result<Rendered<String, MockTiming>, RenderError> {
        if self.probe.borrow().fail_render {
            return Err(RenderError::Library("unterminated slur".to_string()));
        }
        self.probe.borrow_mut().renders.push(abc.to_string());
        Ok(Rendered {
            visual: abc.to_string(),
            timing: MockTiming::new(&self.probe),
        })
    }

    fn draw(&mut self, abc: &str, _options: &RenderOptions) -> Result<(), RenderError> {
        self.probe.borrow_mut().draws.push(abc.to_string());
        Ok(())
    }
}

pub fn rendered(probe: &Shared, abc: &str) -> Rendered<String, MockTiming> {
    Rendered {
        visual: abc.to_string(),
        timing: MockTiming::new(probe),
    }
}

/// `count` numbered body lines under a minimal header
pub fn score_with_lines(count: usize) -> String {
    let mut abc = String::from("X:1\nT:Test\nK:C\n");
    for i in 3..count {
        abc.push_str(&format!("CDEF GABc| % bar {}\n", i));
    }
    abc
}
