//! The viewer shell: one backend, one camera, one model slot.
//!
//! Hosts construct a [`ViewerShell`], optionally attach a shape (the
//! parameter-panel variant) or feed it model files (the editor variant),
//! then call [`ViewerShell::frame`] once per display refresh.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::{Frame, RenderBackend};
use crate::config::ViewerConfig;
use crate::controls::{OrbitControls, PointerButton};
use crate::error::{GeometryError, LoadError, ParamError, SetupError, ViewerError};
use crate::geometry::Surface;
use crate::loader::{LoadTicket, LoadTracker, ModelLoader};
use crate::panel::{Control, ParameterPanel};
use crate::params::{ParamInput, ParameterRecord};
use crate::projection::Camera;
use crate::scene::Scene;
use crate::shapes::GeometryFactory;
use crate::slot::{ModelSlot, SceneNode};
use crate::transform::NodeTransform;
use crate::updates::{FrameTime, FrameUpdate, Spin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    Ready,
    Running,
    Disposed,
}

/// Model-editor keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Up,
    Down,
    Left,
    Right,
    Grow,
    Shrink,
}

impl EditKey {
    /// Map a DOM-style key name (`"ArrowUp"`, `"+"`, ...).
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "ArrowUp" => Some(EditKey::Up),
            "ArrowDown" => Some(EditKey::Down),
            "ArrowLeft" => Some(EditKey::Left),
            "ArrowRight" => Some(EditKey::Right),
            "+" | "=" => Some(EditKey::Grow),
            "-" | "_" => Some(EditKey::Shrink),
            _ => None,
        }
    }
}

struct ShapeBinding {
    factory: Arc<dyn GeometryFactory>,
    panel: ParameterPanel,
}

pub struct ViewerShell<B: RenderBackend> {
    backend: B,
    config: ViewerConfig,
    camera: Camera,
    controls: OrbitControls,
    scene: Scene,
    slot: ModelSlot<B::Handle>,
    shape: Option<ShapeBinding>,
    updates: Vec<Box<dyn FrameUpdate>>,
    loads: LoadTracker,
    state: ShellState,
    last_time: Option<f32>,
}

impl<B: RenderBackend> ViewerShell<B> {
    /// Bring up a viewer on `backend` sized `width` x `height`.
    pub fn new(
        mut backend: B,
        config: ViewerConfig,
        width: u32,
        height: u32,
    ) -> Result<Self, SetupError> {
        if width == 0 || height == 0 {
            return Err(SetupError::EmptyViewport { width, height });
        }
        config.validate()?;

        backend.resize(width, height);
        let camera = config.camera(width, height);
        let controls = config.orbit_controls();
        let scene = config.scene();

        let mut updates: Vec<Box<dyn FrameUpdate>> = Vec::new();
        if let Some(spin) = Spin::from_config(config.spin) {
            updates.push(Box::new(spin));
        }

        info!(width, height, fov = config.camera.fov_degrees, "viewer ready");
        Ok(Self {
            backend,
            config,
            camera,
            controls,
            scene,
            slot: ModelSlot::new(),
            shape: None,
            updates,
            loads: LoadTracker::new(),
            state: ShellState::Ready,
            last_time: None,
        })
    }

    /// Builder form of [`set_shape`](Self::set_shape).
    pub fn with_shape(mut self, factory: Arc<dyn GeometryFactory>) -> Result<Self, ViewerError> {
        self.set_shape(factory)?;
        Ok(self)
    }

    /// Attach a shape with a fresh panel seeded from its schema and show it.
    pub fn set_shape(&mut self, factory: Arc<dyn GeometryFactory>) -> Result<(), ViewerError> {
        let panel = ParameterPanel::new(factory.schema())?;
        let surface = factory.build(panel.record())?;
        info!(kind = factory.kind(), fields = panel.record().len(), "shape attached");
        self.shape = Some(ShapeBinding { factory, panel });
        self.install(surface, None);
        Ok(())
    }

    pub fn start(&mut self) {
        if self.state == ShellState::Ready {
            self.state = ShellState::Running;
            debug!("viewer running");
        }
    }

    /// Advance one frame at `time` seconds and draw it. Does nothing unless
    /// the shell is running.
    pub fn frame(&mut self, time: f32) -> Result<(), ViewerError> {
        if self.state != ShellState::Running {
            return Ok(());
        }

        let delta = self.last_time.map_or(0.0, |last| (time - last).max(0.0));
        self.last_time = Some(time);
        self.controls.update(&mut self.camera);

        if let Some(node) = self.slot.current_mut() {
            let clock = FrameTime {
                elapsed: time,
                delta,
            };
            for update in &mut self.updates {
                update.update(&mut node.transform, clock);
            }
        }

        let frame = Frame {
            scene: &self.scene,
            camera: &self.camera,
            item: self.slot.draw_item(),
        };
        self.backend.draw(&frame)?;
        Ok(())
    }

    /// Resize the drawing surface and camera before returning, so the next
    /// frame is drawn at the new size. Zero-area sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            debug!(width, height, "ignoring empty resize");
            return;
        }
        self.camera.set_viewport(width, height);
        self.backend.resize(width, height);
    }

    /// Release the model and stop drawing. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.state == ShellState::Disposed {
            return;
        }
        self.slot.teardown(&mut self.backend);
        self.state = ShellState::Disposed;
        info!("viewer disposed");
    }

    pub fn state(&self) -> ShellState {
        self.state
    }

    /// Rebuild from the panel's current record.
    pub fn regenerate(&mut self) -> Result<(), ViewerError> {
        let binding = self.shape.as_ref().ok_or(ViewerError::NoShape)?;
        let built = binding.factory.build(binding.panel.record());
        self.finish_build(built).map(|_| ())
    }

    /// Set one parameter. Returns whether a new model was installed.
    ///
    /// If the factory rejects the edited record, the edit is rolled back so
    /// the panel keeps describing the model on screen.
    pub fn set_param(&mut self, name: &str, input: ParamInput) -> Result<bool, ViewerError> {
        self.edit_params(|panel, factory| panel.set(name, input, |record| factory.build(record)))
    }

    /// Set one parameter from text, parsed by the field's type.
    pub fn set_param_str(&mut self, name: &str, raw: &str) -> Result<bool, ViewerError> {
        self.edit_params(|panel, factory| {
            panel.set_from_str(name, raw, |record| factory.build(record))
        })
    }

    /// Nudge one parameter by its step.
    pub fn step_param(&mut self, name: &str, direction: i32) -> Result<bool, ViewerError> {
        self.edit_params(|panel, factory| {
            panel.step(name, direction, |record| factory.build(record))
        })
    }

    /// Nudge the panel's selected parameter.
    pub fn step_selected(&mut self, direction: i32) -> Result<bool, ViewerError> {
        let name = self
            .shape
            .as_ref()
            .and_then(|b| b.panel.selected())
            .map(str::to_string)
            .ok_or(ViewerError::NoShape)?;
        self.step_param(&name, direction)
    }

    /// Restore every default and regenerate once.
    pub fn reset_params(&mut self) -> Result<(), ViewerError> {
        let ShapeBinding { factory, panel } = self.shape.as_mut().ok_or(ViewerError::NoShape)?;
        let built = panel.reset(|record| factory.build(record));
        self.finish_build(built).map(|_| ())
    }

    pub fn select_next_param(&mut self) {
        if let Some(binding) = &mut self.shape {
            binding.panel.select_next();
        }
    }

    pub fn select_prev_param(&mut self) {
        if let Some(binding) = &mut self.shape {
            binding.panel.select_prev();
        }
    }

    fn edit_params<F>(&mut self, edit: F) -> Result<bool, ViewerError>
    where
        F: FnOnce(
            &mut ParameterPanel,
            &dyn GeometryFactory,
        ) -> Result<Option<Result<Surface, GeometryError>>, ParamError>,
    {
        let ShapeBinding { factory, panel } = self.shape.as_mut().ok_or(ViewerError::NoShape)?;
        let previous = panel.record().clone();
        let built = match edit(panel, &**factory)? {
            Some(built) => built,
            None => return Ok(false),
        };
        if built.is_err() {
            panel.restore(previous);
        }
        self.finish_build(built)
    }

    fn finish_build(
        &mut self,
        built: Result<Surface, GeometryError>,
    ) -> Result<bool, ViewerError> {
        match built {
            Ok(surface) => {
                // Keep the spin/edit state across regenerations.
                let transform = self.slot.current().map(|node| node.transform);
                Ok(self.install(surface, transform))
            }
            Err(err) => {
                warn!(%err, "regeneration failed, keeping previous model");
                Err(err.into())
            }
        }
    }

    /// Put `surface` in the slot. Returns `false` once disposed.
    fn install(&mut self, surface: Surface, transform: Option<NodeTransform>) -> bool {
        if self.state == ShellState::Disposed {
            debug!("viewer disposed, dropping surface");
            return false;
        }
        self.slot.replace_with(
            &mut self.backend,
            surface,
            transform.unwrap_or_else(NodeTransform::identity),
        );
        true
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, button: PointerButton) {
        self.controls.pointer_down(x, y, button);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let (_, height) = self.backend.size();
        self.controls.pointer_move(x, y, &self.camera, height);
    }

    pub fn pointer_up(&mut self) {
        self.controls.pointer_up();
    }

    /// Wheel notches; positive moves away from the target.
    pub fn wheel(&mut self, notches: f32) {
        self.controls.wheel(notches);
    }

    /// Apply an editor key to the loaded model. Returns `false` when there is
    /// no model to move.
    pub fn handle_key(&mut self, key: EditKey) -> bool {
        let steps = &self.config.edit;
        let Some(node) = self.slot.current_mut() else {
            return false;
        };
        let t = &mut node.transform;
        match key {
            EditKey::Up => t.translate(0.0, steps.move_step, 0.0),
            EditKey::Down => t.translate(0.0, -steps.move_step, 0.0),
            EditKey::Left => t.rotation.rotate(0.0, -steps.rotate_step, 0.0),
            EditKey::Right => t.rotation.rotate(0.0, steps.rotate_step, 0.0),
            EditKey::Grow => t.scale_by(steps.grow),
            EditKey::Shrink => t.scale_by(steps.shrink),
        }
        true
    }

    /// Announce a model load; any earlier load still in flight is cancelled.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.loads.begin()
    }

    /// Install the result of a load. Returns `Ok(false)` for a cancelled
    /// ticket or a disposed shell. A failed load keeps whatever was shown before.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Surface, LoadError>,
    ) -> Result<bool, ViewerError> {
        if !self.loads.complete(ticket) {
            return Ok(false);
        }
        match result {
            Ok(surface) => {
                info!(
                    ticket = ticket.id(),
                    triangles = surface.triangle_count(),
                    "model loaded"
                );
                Ok(self.install(surface, None))
            }
            Err(err) => {
                warn!(ticket = ticket.id(), %err, "model load failed, keeping previous model");
                Err(ViewerError::ModelLoad(err))
            }
        }
    }

    /// Give up on a load whose bytes never arrived. The current model stays.
    /// Returns `false` if the ticket was already stale.
    pub fn cancel_load(&mut self, ticket: LoadTicket) -> bool {
        let current = self.loads.complete(ticket);
        if current {
            debug!(ticket = ticket.id(), "load cancelled");
        }
        current
    }

    /// Parse `bytes` with `loader` and install the result in one step.
    pub fn load_bytes(
        &mut self,
        loader: &dyn ModelLoader,
        bytes: &[u8],
        base_path: Option<&Path>,
    ) -> Result<bool, ViewerError> {
        let ticket = self.begin_load();
        let result = loader.parse(bytes, base_path);
        self.finish_load(ticket, result)
    }

    pub fn is_loading(&self) -> bool {
        self.loads.is_loading()
    }

    /// Register a per-frame update; updates run in registration order.
    pub fn add_update(&mut self, update: Box<dyn FrameUpdate>) {
        self.updates.push(update);
    }

    pub fn clear_updates(&mut self) {
        self.updates.clear();
    }

    pub fn panel(&self) -> Option<&ParameterPanel> {
        self.shape.as_ref().map(|b| &b.panel)
    }

    pub fn params(&self) -> Option<&ParameterRecord> {
        self.panel().map(ParameterPanel::record)
    }

    pub fn controls(&self) -> Vec<Control> {
        self.panel().map(ParameterPanel::controls).unwrap_or_default()
    }

    pub fn shape_kind(&self) -> Option<&'static str> {
        self.shape.as_ref().map(|b| b.factory.kind())
    }

    pub fn model(&self) -> Option<&SceneNode<B::Handle>> {
        self.slot.current()
    }

    /// Number of surfaces installed so far.
    pub fn generation(&self) -> u64 {
        self.slot.generation()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
