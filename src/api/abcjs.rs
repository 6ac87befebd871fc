//! abcjs bindings
//!
//! Imports the parts of the global `ABCJS` object the score view uses and
//! implements the renderer and audio capability traits on top of them.
//! Promises are awaited on the local executor and their outcomes are turned
//! into `PlaybackEvent`s for an `EventSink`, which routes them back into the
//! owning view.

use std::rc::Rc;

use js_sys::{Array, Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::AudioContext;

use crate::api::helpers::{describe_js_error, serialize};
use crate::error::RenderError;
use crate::playback::backend::{
    AudioBackend, CycleId, PlaybackEvent, SynthRequest, Synthesizer, TimingCallbacks,
};
use crate::render::{NotationRenderer, RenderOptions, Rendered};
use crate::wasm_warn;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ABCJS, js_name = renderAbc, catch)]
    fn render_abc(target: &str, abc: &str, options: &JsValue) -> Result<Array, JsValue>;
}

#[wasm_bindgen]
extern "C" {
    /// `ABCJS.TimingCallbacks`
    #[wasm_bindgen(js_namespace = ABCJS, js_name = TimingCallbacks)]
    #[derive(Clone, Debug)]
    pub type AbcTimingCallbacks;

    #[wasm_bindgen(constructor, js_namespace = ABCJS, js_class = "TimingCallbacks", catch)]
    fn new(visual: &JsValue, handlers: &JsValue) -> Result<AbcTimingCallbacks, JsValue>;

    #[wasm_bindgen(method)]
    fn start(this: &AbcTimingCallbacks);

    #[wasm_bindgen(method)]
    fn stop(this: &AbcTimingCallbacks);
}

#[wasm_bindgen]
extern "C" {
    /// `ABCJS.synth.CreateSynth`
    #[wasm_bindgen(js_namespace = ["ABCJS", "synth"], js_name = CreateSynth)]
    #[derive(Clone, Debug)]
    pub type AbcSynth;

    #[wasm_bindgen(constructor, js_namespace = ["ABCJS", "synth"], js_class = "CreateSynth")]
    fn new() -> AbcSynth;

    #[wasm_bindgen(method, catch)]
    fn init(this: &AbcSynth, params: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn prime(this: &AbcSynth) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn start(this: &AbcSynth) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method)]
    fn stop(this: &AbcSynth);
}

/// Receives asynchronous playback outcomes
pub type EventSink = Rc<dyn Fn(PlaybackEvent)>;

fn set_property(target: &JsValue, key: &str, value: &JsValue) -> Result<(), String> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|e| describe_js_error(&e))
}

/// Wait for a promise; a rejection becomes its message
pub async fn settle(promise: Promise) -> Result<JsValue, String> {
    JsFuture::from(promise).await.map_err(|e| describe_js_error(&e))
}

/// `onEnded` synth option for one cycle.
///
/// Owned by the synth that registered it and dropped with it, so cycles that
/// never reach the end do not leave callbacks behind.
pub struct EndedCallback {
    closure: Closure<dyn FnMut()>,
}

impl EndedCallback {
    pub fn new(cycle: CycleId, sink: EventSink) -> Self {
        let closure = Closure::<dyn FnMut()>::new(move || sink(PlaybackEvent::Ended { cycle }));
        Self { closure }
    }

    pub fn as_js(&self) -> &JsValue {
        self.closure.as_ref()
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Rendered tune object returned by `renderAbc`
#[derive(Clone, Debug)]
pub struct AbcVisual(JsValue);

#[derive(Clone, Debug)]
pub struct AbcTiming(AbcTimingCallbacks);

impl TimingCallbacks for AbcTiming {
    fn start(&mut self) {
        self.0.start();
    }

    fn stop(&mut self) {
        self.0.stop();
    }
}

/// Renders into one element of the page
pub struct AbcjsRenderer {
    container_id: String,
}

impl AbcjsRenderer {
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
        }
    }

    fn surface_exists(&self) -> bool {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(&self.container_id))
            .is_some()
    }

    fn render_tunes(&self, abc: &str, options: &RenderOptions) -> Result<Array, RenderError> {
        if !self.surface_exists() {
            return Err(RenderError::MissingSurface(self.container_id.clone()));
        }
        let options = serialize(options, "Render options")
            .map_err(|e| RenderError::Library(describe_js_error(&e)))?;
        render_abc(&self.container_id, abc, &options)
            .map_err(|e| RenderError::Library(describe_js_error(&e)))
    }
}

/// Handlers for `TimingCallbacks`. Highlighting is a no-op.
fn timing_handlers() -> Result<JsValue, RenderError> {
    let handlers = Object::new();
    let beat = Closure::<dyn FnMut()>::new(|| {}).into_js_value();
    let event = Closure::<dyn FnMut(JsValue)>::new(|_event: JsValue| {}).into_js_value();
    set_property(&handlers, "beatCallback", &beat).map_err(RenderError::Library)?;
    set_property(&handlers, "eventCallback", &event).map_err(RenderError::Library)?;
    Ok(handlers.into())
}

impl NotationRenderer for AbcjsRenderer {
    type Visual = AbcVisual;
    type Timing = AbcTiming;

    fn render(
        &mut self,
        abc: &str,
        options: &RenderOptions,
    ) -> Result<Rendered<AbcVisual, AbcTiming>, RenderError> {
        let visual = self.render_tunes(abc, options)?.get(0);
        if visual.is_undefined() {
            return Err(RenderError::NothingRendered);
        }

        let timing = AbcTimingCallbacks::new(&visual, &timing_handlers()?)
            .map_err(|e| RenderError::Library(describe_js_error(&e)))?;

        Ok(Rendered {
            visual: AbcVisual(visual),
            timing: AbcTiming(timing),
        })
    }

    fn draw(&mut self, abc: &str, options: &RenderOptions) -> Result<(), RenderError> {
        self.render_tunes(abc, options).map(|_| ())
    }
}

// ============================================================================
// Synthesizer
// ============================================================================

/// Allocates one `CreateSynth` and one `AudioContext` per cycle
pub struct AbcjsBackend {
    sink: EventSink,
    context: Option<AudioContext>,
}

impl AbcjsBackend {
    pub fn new(sink: EventSink) -> Self {
        Self {
            sink,
            context: None,
        }
    }

    fn close_context(&mut self) {
        if let Some(context) = self.context.take() {
            if let Err(e) = context.close() {
                wasm_warn!("Closing audio context failed: {}", describe_js_error(&e));
            }
        }
    }
}

impl AudioBackend for AbcjsBackend {
    type Visual = AbcVisual;
    type Synth = AbcjsSynth;

    fn create_synth(&mut self) -> Result<AbcjsSynth, String> {
        self.close_context();
        let context = AudioContext::new().map_err(|e| describe_js_error(&e))?;
        self.context = Some(context.clone());

        Ok(AbcjsSynth {
            synth: AbcSynth::new(),
            context,
            sink: self.sink.clone(),
            cycle: None,
            on_ended: None,
        })
    }

    fn release(&mut self) {
        self.close_context();
    }
}

pub struct AbcjsSynth {
    synth: AbcSynth,
    context: AudioContext,
    sink: EventSink,
    cycle: Option<CycleId>,
    on_ended: Option<EndedCallback>,
}

/// `init` then `prime`, reporting the first failure
async fn prime_after(initialized: Promise, synth: AbcSynth) -> Result<(), String> {
    settle(initialized).await?;
    let primed = synth.prime().map_err(|e| describe_js_error(&e))?;
    settle(primed).await.map(|_| ())
}

impl Synthesizer for AbcjsSynth {
    type Visual = AbcVisual;

    fn prepare(&mut self, request: &SynthRequest<'_, AbcVisual>) -> Result<(), String> {
        let cycle = request.cycle;
        self.cycle = Some(cycle);
        let on_ended = EndedCallback::new(cycle, self.sink.clone());

        let options = Object::new();
        set_property(&options, "soundFontUrl", &JsValue::from_str(request.sound_font_url))?;
        set_property(&options, "program", &JsValue::from(request.program))?;
        set_property(&options, "onEnded", on_ended.as_js())?;

        let params = Object::new();
        set_property(&params, "audioContext", &JsValue::from(self.context.clone()))?;
        set_property(&params, "visualObj", &request.visual.0)?;
        set_property(
            &params,
            "millisecondsPerMeasure",
            &JsValue::from_f64(request.millis_per_measure),
        )?;
        set_property(&params, "options", &options)?;

        let initialized = self.synth.init(&params).map_err(|e| describe_js_error(&e))?;
        self.on_ended = Some(on_ended);

        let synth = self.synth.clone();
        let sink = self.sink.clone();
        spawn_local(async move {
            let result = prime_after(initialized, synth).await;
            sink(PlaybackEvent::Primed { cycle, result });
        });
        Ok(())
    }

    fn start(&mut self) -> Result<(), String> {
        let started = self.synth.start().map_err(|e| describe_js_error(&e))?;

        if let (Ok(promise), Some(cycle)) = (started.dyn_into::<Promise>(), self.cycle) {
            let sink = self.sink.clone();
            spawn_local(async move {
                if let Err(message) = settle(promise).await {
                    sink(PlaybackEvent::Failed { cycle, message });
                }
            });
        }
        Ok(())
    }

    fn stop(&mut self) {
        // abcjs keeps its own reference to the callback; detach it before
        // the closure is dropped
        if let Err(e) = set_property(&self.synth, "onEnded", &JsValue::UNDEFINED) {
            wasm_warn!("Detaching onEnded failed: {}", e);
        }
        self.synth.stop();
        self.on_ended = None;
    }
}
