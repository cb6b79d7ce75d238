//! [`RenderBackend`] over an HTML canvas 2D context.

use std::collections::HashMap;

use paramview_core::{Frame, RenderBackend, RenderError, SetupError, Surface};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::draw_list::{shade_css, DrawList, Line2d, LineKind};

const BACKGROUND: &str = "#101010";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    surfaces: HashMap<SurfaceId, Surface>,
    next_id: u64,
    pub show_faces: bool,
    pub show_wireframe: bool,
}

impl CanvasRenderer {
    /// Attach to the `<canvas>` with the given element id.
    pub fn from_element_id(canvas_id: &str) -> Result<Self, SetupError> {
        let missing = || SetupError::MissingTarget(canvas_id.to_string());
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(missing)?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(missing)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| missing())?;
        let context = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or_else(missing)?;

        Ok(Self {
            canvas,
            context,
            surfaces: HashMap::new(),
            next_id: 0,
            show_faces: true,
            show_wireframe: true,
        })
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    fn stroke(&self, line: &Line2d) {
        let ctx = &self.context;
        ctx.set_stroke_style_str(line.kind.css_color());
        ctx.begin_path();
        ctx.move_to(line.from.0 as f64, line.from.1 as f64);
        ctx.line_to(line.to.0 as f64, line.to.1 as f64);
        ctx.stroke();
    }

    fn paint(&self, list: &DrawList) {
        let ctx = &self.context;
        let (width, height) = self.size();
        ctx.set_fill_style_str(BACKGROUND);
        ctx.fill_rect(0.0, 0.0, width as f64, height as f64);
        ctx.set_line_width(1.0);

        let (wire, helpers): (Vec<&Line2d>, Vec<&Line2d>) =
            list.lines.iter().partition(|l| l.kind == LineKind::Wire);
        for line in helpers {
            self.stroke(line);
        }

        if self.show_faces {
            for face in &list.faces {
                let [a, b, c] = face.points;
                ctx.set_fill_style_str(&shade_css(face.brightness));
                ctx.begin_path();
                ctx.move_to(a.0 as f64, a.1 as f64);
                ctx.line_to(b.0 as f64, b.1 as f64);
                ctx.line_to(c.0 as f64, c.1 as f64);
                ctx.close_path();
                ctx.fill();
            }
        }

        if self.show_wireframe {
            for line in wire {
                self.stroke(line);
            }
        }
    }
}

impl RenderBackend for CanvasRenderer {
    type Handle = SurfaceId;

    fn upload(&mut self, surface: &Surface) -> SurfaceId {
        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        self.surfaces.insert(id, surface.clone());
        id
    }

    fn release(&mut self, handle: SurfaceId) {
        self.surfaces.remove(&handle);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn draw(&mut self, frame: &Frame<'_, SurfaceId>) -> Result<(), RenderError> {
        let (width, height) = self.size();
        let model = match &frame.item {
            Some(item) => {
                let surface = self.surfaces.get(item.handle).ok_or_else(|| {
                    RenderError::Backend(format!("surface {:?} was released", item.handle))
                })?;
                Some((surface, &item.model))
            }
            None => None,
        };
        let list = DrawList::build(frame.scene, frame.camera, model, width, height);
        self.paint(&list);
        Ok(())
    }
}
