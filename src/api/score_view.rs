//! `MusicScoreView`: the JavaScript-facing score view
//!
//! One instance per mounted view. The page fetches `/abc-file/{id}` itself
//! and hands the response record in; rendering and audio go through abcjs.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;

use crate::api::abcjs::{AbcjsBackend, AbcjsRenderer, EventSink};
use crate::api::helpers::{deserialize, js_error, serialize};
use crate::config::ViewConfig;
use crate::notation::loader;
use crate::playback::backend::PlaybackEvent;
use crate::playback::controller::PlaybackState;
use crate::playback::settings::{Tempo, Transposition};
use crate::view::{ControlAccess, ScoreView};
use crate::{wasm_error, wasm_info, wasm_warn};

type WasmScoreView = ScoreView<AbcjsRenderer, AbcjsBackend>;
type StateListener = Rc<RefCell<Option<js_sys::Function>>>;

fn access_for(preview: bool) -> ControlAccess {
    if preview {
        ControlAccess::Preview
    } else {
        ControlAccess::Full
    }
}

fn notify_state(listener: &StateListener, state: PlaybackState) {
    if let Some(callback) = listener.borrow().as_ref() {
        if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from(state as u8)) {
            wasm_warn!("State listener threw: {:?}", e);
        }
    }
}

/// Routes synthesizer promise outcomes back into the view
fn event_sink(view: Weak<RefCell<WasmScoreView>>, listener: StateListener) -> EventSink {
    Rc::new(move |event: PlaybackEvent| {
        // View already dropped: the page unmounted
        let Some(view) = view.upgrade() else {
            return;
        };
        let state = {
            let Ok(mut view) = view.try_borrow_mut() else {
                wasm_warn!("Dropping playback event during another view call: {:?}", event);
                return;
            };
            if let Err(e) = view.handle_playback_event(event) {
                wasm_error!("{}", e);
            }
            view.playback_state()
        };
        notify_state(&listener, state);
    })
}

#[wasm_bindgen]
pub struct MusicScoreView {
    inner: Rc<RefCell<WasmScoreView>>,
    listener: StateListener,
}

impl MusicScoreView {
    /// Run `f` against the view and report a playback state change
    fn with_view<T>(&self, f: impl FnOnce(&mut WasmScoreView) -> T) -> Result<T, JsValue> {
        let (result, before, after) = {
            let mut view = self
                .inner
                .try_borrow_mut()
                .map_err(|_| js_error("MusicScoreView is busy"))?;
            let before = view.playback_state();
            let result = f(&mut view);
            (result, before, view.playback_state())
        };
        if before != after {
            notify_state(&self.listener, after);
        }
        Ok(result)
    }
}

#[wasm_bindgen]
impl MusicScoreView {
    /// Create a view. `config` may be `undefined` for defaults; `preview`
    /// locks tempo, transposition, loop and page navigation.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, preview: bool) -> Result<MusicScoreView, JsValue> {
        let config: ViewConfig = if config.is_undefined() || config.is_null() {
            ViewConfig::default()
        } else {
            deserialize(config, "Invalid view config")?
        };
        config.validate().map_err(js_error)?;

        let listener: StateListener = Rc::new(RefCell::new(None));
        let sink_listener = listener.clone();
        let inner = Rc::new_cyclic(move |weak: &Weak<RefCell<WasmScoreView>>| {
            let backend = AbcjsBackend::new(event_sink(weak.clone(), sink_listener));
            let renderer = AbcjsRenderer::new(config.container_id.clone());
            RefCell::new(ScoreView::new(config, renderer, backend, access_for(preview)))
        });

        wasm_info!("MusicScoreView created (preview: {})", preview);
        Ok(MusicScoreView { inner, listener })
    }

    /// Register a callback receiving the playback state (0 idle, 1 priming,
    /// 2 playing, 3 stopped) whenever it changes
    #[wasm_bindgen(js_name = onStateChange)]
    pub fn on_state_change(&self, callback: Option<js_sys::Function>) {
        *self.listener.borrow_mut() = callback;
    }

    #[wasm_bindgen(js_name = beginLoad)]
    pub fn begin_load(&self, id: &str) -> Result<(), JsValue> {
        self.with_view(|view| view.begin_load(id))
    }

    /// Install the record returned by `GET /abc-file/{id}`
    #[wasm_bindgen(js_name = loadScore)]
    pub fn load_score(&self, id: &str, record: JsValue) -> Result<(), JsValue> {
        let record: serde_json::Value = deserialize(record, "Invalid score record")?;
        let result = loader::load_from_value(id, record);
        self.with_view(|view| view.finish_load(id, result))?
            .map_err(js_error)
    }

    /// Report that fetching `id` failed
    #[wasm_bindgen(js_name = loadFailed)]
    pub fn load_failed(&self, id: &str, message: &str) -> Result<(), JsValue> {
        self.with_view(|view| view.fail_load(id, message))?
            .map_err(js_error)
    }

    pub fn play(&self) -> Result<u8, JsValue> {
        self.with_view(|view| view.play().map(|_| view.playback_state()))?
            .map(|state| state as u8)
            .map_err(js_error)
    }

    pub fn stop(&self) -> Result<(), JsValue> {
        self.with_view(|view| view.stop())
    }

    #[wasm_bindgen(js_name = togglePlayback)]
    pub fn toggle_playback(&self) -> Result<u8, JsValue> {
        self.with_view(|view| view.toggle_playback())?
            .map(|state| state as u8)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = setTempo)]
    pub fn set_tempo(&self, bpm: u32) -> Result<u32, JsValue> {
        self.with_view(|view| view.set_tempo(Tempo::new(bpm)))?
            .map(Tempo::bpm)
            .map_err(js_error)
    }

    /// Commit the text of the tempo input field
    #[wasm_bindgen(js_name = commitTempoInput)]
    pub fn commit_tempo_input(&self, text: &str) -> Result<u32, JsValue> {
        self.with_view(|view| view.set_tempo_input(text))?
            .map(Tempo::bpm)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = stepTempo)]
    pub fn step_tempo(&self, up: bool) -> Result<u32, JsValue> {
        self.with_view(|view| view.step_tempo(up))?
            .map(Tempo::bpm)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = setTransposition)]
    pub fn set_transposition(&self, semitones: i32) -> Result<i32, JsValue> {
        self.with_view(|view| view.set_transposition(Transposition::new(semitones)))?
            .map(Transposition::semitones)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = stepTransposition)]
    pub fn step_transposition(&self, up: bool) -> Result<i32, JsValue> {
        self.with_view(|view| view.step_transposition(up))?
            .map(Transposition::semitones)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = setLooping)]
    pub fn set_looping(&self, looping: bool) -> Result<(), JsValue> {
        self.with_view(|view| view.set_looping(looping))?
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = setInstrument)]
    pub fn set_instrument(&self, program: u8) -> Result<u8, JsValue> {
        self.with_view(|view| view.set_program(program))?
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = setPreview)]
    pub fn set_preview(&self, preview: bool) -> Result<(), JsValue> {
        self.with_view(|view| view.set_access(access_for(preview)))
    }

    /// Show a 1-based page; returns the page actually shown
    #[wasm_bindgen(js_name = showPage)]
    pub fn show_page(&self, page: usize) -> Result<usize, JsValue> {
        self.with_view(|view| view.show_page(page))?
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> usize {
        self.inner.borrow().pagination().page_count()
    }

    #[wasm_bindgen(js_name = currentPage)]
    pub fn current_page(&self) -> usize {
        self.inner.borrow().pagination().current_page()
    }

    #[wasm_bindgen(js_name = playbackState)]
    pub fn playback_state(&self) -> u8 {
        self.inner.borrow().playback_state() as u8
    }

    /// `{ status: "loading" | "ready" | "failed", message? }`
    pub fn status(&self) -> Result<JsValue, JsValue> {
        serialize(self.inner.borrow().status(), "View status")
    }

    /// `{ tempo, transposition, looping, program }`
    pub fn settings(&self) -> Result<JsValue, JsValue> {
        serialize(self.inner.borrow().settings(), "Playback settings")
    }

    /// `[{ label, value }]` rows for the metadata panel
    #[wasm_bindgen(js_name = metadataRows)]
    pub fn metadata_rows(&self) -> Result<JsValue, JsValue> {
        serialize(&self.inner.borrow().metadata_rows(), "Metadata rows")
    }

    /// Stop playback and release audio; call from the component cleanup
    pub fn unmount(&self) -> Result<(), JsValue> {
        self.with_view(|view| view.unmount())?;
        wasm_info!("MusicScoreView unmounted");
        Ok(())
    }
}
