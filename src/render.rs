//! Renderer Adapter
//!
//! Wraps a notation renderer behind a narrow capability trait. The adapter
//! holds the most recent render (visual handle plus its timing callbacks)
//! and replaces it wholesale on every call.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::playback::backend::TimingCallbacks;

/// Layout options passed through to the rendering library.
///
/// Field names on the wire match the library's option keys.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RenderOptions {
    #[serde(rename = "add_classes")]
    pub add_classes: bool,
    pub responsive: Option<String>,
    #[serde(rename = "paddingbottom")]
    pub padding_bottom: u32,
    #[serde(rename = "paddingright")]
    pub padding_right: u32,
    #[serde(rename = "staffwidth", skip_serializing_if = "Option::is_none")]
    pub staff_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(rename = "selectionColor", skip_serializing_if = "Option::is_none")]
    pub selection_color: Option<String>,
}

impl RenderOptions {
    /// Full-score render used for playback
    pub fn score() -> Self {
        Self {
            add_classes: true,
            responsive: Some("resize".to_string()),
            padding_bottom: 30,
            padding_right: 30,
            staff_width: None,
            scale: None,
            selection_color: Some("#ff6b6b".to_string()),
        }
    }

    /// Single page of the paginated display
    pub fn page() -> Self {
        Self {
            add_classes: true,
            responsive: Some("resize".to_string()),
            padding_bottom: 20,
            padding_right: 20,
            staff_width: Some(740),
            scale: Some(1.2),
            selection_color: None,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::score()
    }
}

/// Output of a full render: the visual handle and the timing callbacks
/// registered against it
#[derive(Clone, Debug)]
pub struct Rendered<V, T> {
    pub visual: V,
    pub timing: T,
}

/// Rendering library capability
pub trait NotationRenderer {
    type Visual: Clone;
    type Timing: TimingCallbacks + Clone;

    /// Lay out `abc` on the display surface and register timing callbacks
    /// for it. Highlighting hooks are no-ops.
    fn render(
        &mut self,
        abc: &str,
        options: &RenderOptions,
    ) -> Result<Rendered<Self::Visual, Self::Timing>, RenderError>;

    /// Draw `abc` on the display surface without producing a playback handle
    fn draw(&mut self, abc: &str, options: &RenderOptions) -> Result<(), RenderError>;
}

/// Owns the current render. A failed render leaves no render behind.
pub struct RendererAdapter<R: NotationRenderer> {
    renderer: R,
    current: Option<Rendered<R::Visual, R::Timing>>,
    generation: u64,
}

impl<R: NotationRenderer> RendererAdapter<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            current: None,
            generation: 0,
        }
    }

    /// Render `abc`, replacing whatever was rendered before
    pub fn render(
        &mut self,
        abc: &str,
        options: &RenderOptions,
    ) -> Result<&Rendered<R::Visual, R::Timing>, RenderError> {
        // Dropped before the library call so a failure cannot leave a stale
        // handle that no longer matches the surface
        self.current = None;

        let rendered = self.renderer.render(abc, options).map_err(|e| {
            log::error!("Render failed: {}", e);
            e
        })?;
        self.generation += 1;
        log::debug!("Render #{} complete ({} bytes of notation)", self.generation, abc.len());

        Ok(&*self.current.insert(rendered))
    }

    pub fn draw(&mut self, abc: &str, options: &RenderOptions) -> Result<(), RenderError> {
        self.renderer.draw(abc, options)
    }

    pub fn current(&self) -> Option<&Rendered<R::Visual, R::Timing>> {
        self.current.as_ref()
    }

    /// Number of successful renders so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}
