//! paramview in the browser.
//!
//! The page owns the DOM: it forwards resize, key, pointer, wheel and file
//! events into a [`WebViewer`] and calls [`WebViewer::frame`] from
//! `requestAnimationFrame`.

pub mod canvas;
pub mod draw_list;

use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;

use paramview_core::loader::loader_for;
use paramview_core::{
    Control, EditKey, LoadTicket, ParamInput, PointerButton, RenderBackend, ShapeRegistry,
    ViewerConfig, ViewerShell,
};
use tracing::debug;
use wasm_bindgen::prelude::*;

use crate::canvas::CanvasRenderer;

/// Pixels of `WheelEvent.deltaY` per wheel notch
const WHEEL_PIXELS_PER_NOTCH: f32 = 100.0;

fn js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Edit(EditKey),
    ToggleWireframe,
    ToggleFaces,
}

fn key_action(key: &str) -> Option<KeyAction> {
    match key {
        "w" | "W" => Some(KeyAction::ToggleWireframe),
        "f" | "F" => Some(KeyAction::ToggleFaces),
        other => EditKey::from_key_name(other).map(KeyAction::Edit),
    }
}

/// Map `MouseEvent.button` (and the shift modifier) to an orbit gesture.
fn pointer_button(button: i16, shift: bool) -> Option<PointerButton> {
    match (button, shift) {
        (0, false) => Some(PointerButton::Primary),
        (0, true) | (2, _) => Some(PointerButton::Secondary),
        _ => None,
    }
}

/// Page-visible ids for in-flight loads. Only the newest id is kept,
/// matching the shell's cancel-previous tickets.
#[derive(Debug, Default)]
struct LoadIds {
    next: u32,
    pending: HashMap<u32, LoadTicket>,
}

impl LoadIds {
    fn issue(&mut self, ticket: LoadTicket) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        self.pending.clear();
        self.pending.insert(id, ticket);
        id
    }

    fn take(&mut self, id: u32) -> Option<LoadTicket> {
        self.pending.remove(&id)
    }

    fn clear(&mut self) {
        self.pending.clear();
    }
}

fn controls_json(controls: &[Control]) -> Result<String, serde_json::Error> {
    serde_json::to_string(controls)
}

/// JSON array of the built-in shape kinds.
#[wasm_bindgen]
pub fn shape_kinds() -> String {
    let kinds: Vec<&str> = ShapeRegistry::builtin().kinds().collect();
    serde_json::Value::from(kinds).to_string()
}

#[wasm_bindgen]
pub struct WebViewer {
    shell: ViewerShell<CanvasRenderer>,
    loads: LoadIds,
}

#[wasm_bindgen]
impl WebViewer {
    /// Attach to `canvas_id`. With a `shape` this is the geometry demo,
    /// without one it is the model editor waiting for a file.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        shape: Option<String>,
        config_json: Option<String>,
    ) -> Result<WebViewer, JsValue> {
        let config = match (&config_json, &shape) {
            (Some(text), _) => ViewerConfig::from_json(text).map_err(js_error)?,
            (None, Some(_)) => ViewerConfig::geometry_demo(),
            (None, None) => ViewerConfig::model_editor(),
        };

        let renderer = CanvasRenderer::from_element_id(canvas_id).map_err(js_error)?;
        let (width, height) = renderer.size();
        let mut shell = ViewerShell::new(renderer, config, width, height).map_err(js_error)?;
        if let Some(kind) = shape {
            let factory = ShapeRegistry::builtin().get(&kind).map_err(js_error)?;
            shell.set_shape(factory).map_err(js_error)?;
        }
        shell.start();

        Ok(WebViewer {
            shell,
            loads: LoadIds::default(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.shell.resize(width, height);
    }

    /// Draw one frame; `time_ms` is the `requestAnimationFrame` timestamp.
    pub fn frame(&mut self, time_ms: f64) -> Result<(), JsValue> {
        self.shell.frame((time_ms / 1000.0) as f32).map_err(js_error)
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, button: i16, shift: bool) {
        if let Some(button) = pointer_button(button, shift) {
            self.shell.pointer_down(x, y, button);
        }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.shell.pointer_move(x, y);
    }

    pub fn pointer_up(&mut self) {
        self.shell.pointer_up();
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.shell.wheel(delta_y / WHEEL_PIXELS_PER_NOTCH);
    }

    /// Handle a `KeyboardEvent.key`. Returns `true` when the key was used,
    /// so the page can call `preventDefault`.
    pub fn key_down(&mut self, key: &str) -> bool {
        match key_action(key) {
            Some(KeyAction::Edit(edit)) => self.shell.handle_key(edit),
            Some(KeyAction::ToggleWireframe) => {
                let renderer = self.shell.backend_mut();
                renderer.show_wireframe = !renderer.show_wireframe;
                true
            }
            Some(KeyAction::ToggleFaces) => {
                let renderer = self.shell.backend_mut();
                renderer.show_faces = !renderer.show_faces;
                true
            }
            None => false,
        }
    }

    pub fn set_number(&mut self, name: &str, value: f32) -> Result<bool, JsValue> {
        self.shell
            .set_param(name, ParamInput::Number(value))
            .map_err(js_error)
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<bool, JsValue> {
        self.shell
            .set_param(name, ParamInput::Bool(value))
            .map_err(js_error)
    }

    pub fn set_text(&mut self, name: &str, value: String) -> Result<bool, JsValue> {
        self.shell
            .set_param(name, ParamInput::Text(value))
            .map_err(js_error)
    }

    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.shell.reset_params().map_err(js_error)
    }

    /// The panel's controls as a JSON array for the page to render.
    pub fn controls_json(&self) -> Result<String, JsValue> {
        controls_json(&self.shell.controls()).map_err(js_error)
    }

    pub fn shape_kind(&self) -> Option<String> {
        self.shell.shape_kind().map(str::to_string)
    }

    /// Start a load before reading the file; pass the returned id to
    /// [`finish_load`](Self::finish_load). Starting another load cancels this one.
    pub fn begin_load(&mut self) -> u32 {
        let ticket = self.shell.begin_load();
        self.loads.issue(ticket)
    }

    /// Parse the file contents read for load `id`. Returns `false` if a newer
    /// load superseded it.
    pub fn finish_load(
        &mut self,
        id: u32,
        bytes: &[u8],
        file_name: Option<String>,
    ) -> Result<bool, JsValue> {
        let Some(ticket) = self.loads.take(id) else {
            debug!(id, "unknown load id");
            return Ok(false);
        };
        let name = file_name.unwrap_or_default();
        let result = loader_for(Path::new(&name)).parse(bytes, None);
        self.shell.finish_load(ticket, result).map_err(|err| {
            web_sys::console::warn_1(&format!("{name}: {err}").into());
            js_error(err)
        })
    }

    /// Abandon load `id`, e.g. when the `FileReader` reports an error.
    pub fn fail_load(&mut self, id: u32) -> bool {
        match self.loads.take(id) {
            Some(ticket) => self.shell.cancel_load(ticket),
            None => false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.shell.is_loading()
    }

    pub fn dispose(&mut self) {
        self.loads.clear();
        self.shell.dispose();
    }
}

#[cfg(feature = "console-panic")]
#[wasm_bindgen(start)]
pub fn init_console_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramview_core::shapes::TorusFactory;
    use paramview_core::{GeometryFactory, LoadTracker, ParameterPanel};

    #[test]
    fn test_key_actions() {
        assert_eq!(key_action("ArrowUp"), Some(KeyAction::Edit(EditKey::Up)));
        assert_eq!(key_action("+"), Some(KeyAction::Edit(EditKey::Grow)));
        assert_eq!(key_action("W"), Some(KeyAction::ToggleWireframe));
        assert_eq!(key_action("f"), Some(KeyAction::ToggleFaces));
        assert_eq!(key_action("Enter"), None);
    }

    #[test]
    fn test_pointer_buttons() {
        assert_eq!(pointer_button(0, false), Some(PointerButton::Primary));
        assert_eq!(pointer_button(0, true), Some(PointerButton::Secondary));
        assert_eq!(pointer_button(2, false), Some(PointerButton::Secondary));
        assert_eq!(pointer_button(1, false), None);
    }

    #[test]
    fn test_newer_load_id_drops_older() {
        let mut tracker = LoadTracker::new();
        let mut ids = LoadIds::default();
        let first = ids.issue(tracker.begin());
        let second_ticket = tracker.begin();
        let second = ids.issue(second_ticket);

        assert_ne!(first, second);
        assert_eq!(ids.pending.len(), 1);
        assert_eq!(ids.take(first), None);
        assert_eq!(ids.take(second), Some(second_ticket));
        assert_eq!(ids.take(second), None);
    }

    #[test]
    fn test_controls_json() {
        let panel = ParameterPanel::new(TorusFactory.schema()).unwrap();
        let json = controls_json(&panel.controls()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let controls = value.as_array().unwrap();
        assert_eq!(controls.len(), panel.record().len());
        assert_eq!(controls[0]["kind"], "slider");
        assert!(controls[0]["name"].is_string());
    }

    #[test]
    fn test_shape_kinds() {
        let value: serde_json::Value = serde_json::from_str(&shape_kinds()).unwrap();
        let kinds = value.as_array().unwrap();
        assert!(kinds.iter().any(|k| k == "box"));
        assert_eq!(kinds.len(), ShapeRegistry::builtin().len());
    }
}
