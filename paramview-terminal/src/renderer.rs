//! ASCII rasterizer for terminal rendering

use std::collections::HashMap;
use std::io::Write;

use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3, Vector3};
use paramview_core::{Camera, Frame, RenderBackend, RenderError, Segment, Surface, Triangle};
use tracing::trace;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Light that reaches faces turned away from the key light.
const AMBIENT: f32 = 0.15;

/// Lines win depth ties against the faces they outline.
const LINE_DEPTH_BIAS: f32 = 1e-3;

/// A character cell is roughly twice as tall as it is wide, so each row
/// covers this many logical pixels.
pub const ROW_SCALE: u32 = 2;

/// Handle to a surface uploaded into the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    character: char,
    color: Color,
}

const BLANK: Cell = Cell {
    character: ' ',
    color: Color::Reset,
};

/// ASCII renderer that converts 3D meshes to terminal characters
///
/// The logical viewport is `columns x rows * ROW_SCALE`; projection uses the
/// logical size so the camera aspect matches what the eye sees.
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<Cell>,
    buffers: HashMap<BufferId, Surface>,
    next_id: u64,
    pub show_wireframe: bool,
    pub show_faces: bool,
}

impl AsciiRenderer {
    /// Renderer for a terminal of `columns` x `rows` characters.
    pub fn new(columns: usize, rows: usize) -> Self {
        let size = columns * rows;
        Self {
            width: columns,
            height: rows,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![BLANK; size],
            buffers: HashMap::new(),
            next_id: 0,
            show_wireframe: true,
            show_faces: true,
        }
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(BLANK);
    }

    /// Number of surfaces currently uploaded
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Character at a cell, for inspection.
    pub fn char_at(&self, column: usize, row: usize) -> Option<char> {
        if column >= self.width || row >= self.height {
            return None;
        }
        Some(self.char_buffer[row * self.width + column].character)
    }

    /// Rows of the current frame as plain text.
    pub fn lines(&self) -> Vec<String> {
        self.char_buffer
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|c| c.character).collect())
            .collect()
    }

    fn logical_size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32 * ROW_SCALE)
    }

    /// Project to character-cell coordinates.
    fn project(
        &self,
        camera: &Camera,
        point: &Point3<f32>,
        mvp: &Matrix4<f32>,
    ) -> Option<(f32, f32, f32)> {
        let (w, h) = self.logical_size();
        camera
            .project_to_screen(point, mvp, w, h)
            .map(|(x, y, z)| (x, y / ROW_SCALE as f32, z))
    }

    fn render_surface(
        &mut self,
        surface: &Surface,
        model: &Matrix4<f32>,
        camera: &Camera,
        light: &Vector3<f32>,
    ) {
        let mvp = camera.view_projection() * model;
        if self.show_faces {
            for triangle in &surface.mesh.triangles {
                self.render_triangle(triangle, model, &mvp, camera, light);
            }
        }
        if self.show_wireframe {
            for segment in &surface.wireframe.segments {
                self.render_segment(segment, &mvp, camera, None);
            }
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model: &Matrix4<f32>,
        mvp: &Matrix4<f32>,
        camera: &Camera,
        light: &Vector3<f32>,
    ) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            match self.project(camera, &vertex.position, mvp) {
                Some(p) => *slot = p,
                None => return, // Triangle is clipped
            }
        }

        // Shade both sides from the world-space face normal
        let world = Triangle::new(
            transformed(&triangle.vertices[0], model),
            transformed(&triangle.vertices[1], model),
            transformed(&triangle.vertices[2], model),
        );
        if world.is_degenerate() {
            return;
        }
        let brightness = AMBIENT + (1.0 - AMBIENT) * world.calculate_normal().dot(light).abs();

        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
        let char_index = char_index.min(LUMINOSITY_RAMP.len() - 1);
        let character = LUMINOSITY_RAMP[char_index];

        // Rasterize triangle using scanline algorithm
        self.rasterize_triangle(&screen_coords, character);
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        let color = shade_color(character);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates
                if let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        // Interpolate depth
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                        self.plot(x, y, depth, Cell { character, color }, 0.0);
                    }
                }
            }
        }
    }

    /// Draw a depth-tested line. `style` fixes the character and color;
    /// otherwise the character follows the slope.
    fn render_segment(
        &mut self,
        segment: &Segment,
        mvp: &Matrix4<f32>,
        camera: &Camera,
        style: Option<Cell>,
    ) {
        let (Some(a), Some(b)) = (
            self.project(camera, &segment.start, mvp),
            self.project(camera, &segment.end, mvp),
        ) else {
            return;
        };

        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let cell = style.unwrap_or(Cell {
            character: slope_char(dx, dy),
            color: Color::Green,
        });

        // Skip absurdly long lines from points right at the near plane
        let steps = dx.abs().max(dy.abs()).ceil().min(4096.0) as usize;
        for i in 0..=steps {
            let t = if steps == 0 { 0.0 } else { i as f32 / steps as f32 };
            let x = (a.0 + dx * t).floor() as i32;
            let y = (a.1 + dy * t).floor() as i32;
            let depth = a.2 + (b.2 - a.2) * t;
            self.plot(x, y, depth, cell, LINE_DEPTH_BIAS);
        }
    }

    fn plot(&mut self, x: i32, y: i32, depth: f32, cell: Cell, bias: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if depth - bias < self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.char_buffer[idx] = cell;
        }
    }

    fn render_helpers(&mut self, frame: &Frame<'_, BufferId>) {
        let vp = frame.camera.view_projection();
        if let Some(grid) = &frame.scene.grid {
            let style = Cell {
                character: '.',
                color: Color::DarkGrey,
            };
            for segment in grid.segments() {
                self.render_segment(&segment, &vp, frame.camera, Some(style));
            }
        }
        if let Some(axes) = &frame.scene.axes {
            let colors = [Color::Red, Color::Green, Color::Blue];
            for (segment, color) in axes.segments().iter().zip(colors) {
                let style = Cell {
                    character: '*',
                    color,
                };
                self.render_segment(segment, &vp, frame.camera, Some(style));
            }
        }
    }

    /// Write the frame buffer to the terminal, one row per line.
    pub fn present<W: Write>(&self, writer: &mut W) -> Result<(), RenderError> {
        let mut current = None;
        for (y, row) in self.char_buffer.chunks(self.width.max(1)).enumerate() {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for cell in row {
                // Only switch colors when the run changes
                if current != Some(cell.color) {
                    writer.queue(SetForegroundColor(cell.color))?;
                    current = Some(cell.color);
                }
                writer.queue(Print(cell.character))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl RenderBackend for AsciiRenderer {
    type Handle = BufferId;

    fn upload(&mut self, surface: &Surface) -> BufferId {
        self.next_id += 1;
        let id = BufferId(self.next_id);
        self.buffers.insert(id, surface.clone());
        trace!(?id, triangles = surface.triangle_count(), "uploaded surface");
        id
    }

    fn release(&mut self, handle: BufferId) {
        if self.buffers.remove(&handle).is_none() {
            trace!(?handle, "release of unknown buffer");
        }
    }

    /// `width` is in columns, `height` in logical pixels (`rows * ROW_SCALE`).
    fn resize(&mut self, width: u32, height: u32) {
        let columns = width as usize;
        let rows = (height / ROW_SCALE).max(1) as usize;
        if columns == self.width && rows == self.height {
            return;
        }
        self.width = columns;
        self.height = rows;
        self.depth_buffer = vec![f32::INFINITY; columns * rows];
        self.char_buffer = vec![BLANK; columns * rows];
    }

    fn size(&self) -> (u32, u32) {
        self.logical_size()
    }

    fn draw(&mut self, frame: &Frame<'_, BufferId>) -> Result<(), RenderError> {
        self.clear();
        self.render_helpers(frame);

        if let Some(item) = &frame.item {
            // Take the surface out while drawing so the buffers can be borrowed mutably
            let surface = self
                .buffers
                .remove(item.handle)
                .ok_or_else(|| RenderError::Backend(format!("unknown buffer {:?}", item.handle)))?;
            let light = frame.scene.key_light();
            self.render_surface(&surface, &item.model, frame.camera, &light);
            self.buffers.insert(*item.handle, surface);
        }
        Ok(())
    }
}

fn transformed(vertex: &paramview_core::Vertex, model: &Matrix4<f32>) -> paramview_core::Vertex {
    paramview_core::Vertex::from_parts(model.transform_point(&vertex.position), vertex.normal)
}

/// Color based on character intensity
fn shade_color(c: char) -> Color {
    match c {
        '.' | ':' => Color::DarkGrey,
        '-' | '=' => Color::Grey,
        '+' | '*' => Color::White,
        '#' | '%' | '@' => Color::Cyan,
        _ => Color::White,
    }
}

/// Line character for a screen-space direction (y grows downward).
fn slope_char(dx: f32, dy: f32) -> char {
    let (ax, ay) = (dx.abs(), dy.abs());
    if ax > 2.0 * ay {
        '-'
    } else if ay > 2.0 * ax {
        '|'
    } else if (dx > 0.0) == (dy > 0.0) {
        '\\'
    } else {
        '/'
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramview_core::config::SpinConfig;
    use paramview_core::shapes::BoxFactory;
    use paramview_core::{GeometryFactory, Scene, ViewerConfig, ViewerShell};
    use std::sync::Arc;

    fn still() -> ViewerConfig {
        ViewerConfig {
            spin: SpinConfig::None,
            ..ViewerConfig::default()
        }
    }

    #[test]
    fn test_barycentric_inside_and_degenerate() {
        let (w0, w1, w2) =
            barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (1.0, 1.0)).unwrap();
        assert!(w0 > 0.0 && w1 > 0.0 && w2 > 0.0);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 0.0)).is_none());
    }

    #[test]
    fn test_slope_chars() {
        assert_eq!(slope_char(5.0, 0.0), '-');
        assert_eq!(slope_char(0.0, 5.0), '|');
        assert_eq!(slope_char(3.0, 3.0), '\\');
        assert_eq!(slope_char(3.0, -3.0), '/');
    }

    #[test]
    fn test_resize_uses_half_height_rows() {
        let mut renderer = AsciiRenderer::new(10, 10);
        renderer.resize(80, 48);
        assert_eq!(renderer.size(), (80, 48));
        assert_eq!(renderer.lines().len(), 24);
        assert_eq!(renderer.lines()[0].len(), 80);
    }

    #[test]
    fn test_box_covers_center() {
        let mut shell = ViewerShell::new(AsciiRenderer::new(1, 1), still(), 80, 48)
            .unwrap()
            .with_shape(Arc::new(BoxFactory))
            .unwrap();
        shell.start();
        shell.frame(0.0).unwrap();
        let renderer = shell.backend();
        assert_ne!(renderer.char_at(40, 12), Some(' '));
        assert_eq!(renderer.char_at(0, 0), Some(' '));
        assert_eq!(renderer.buffer_count(), 1);
    }

    #[test]
    fn test_release_frees_buffer() {
        let mut renderer = AsciiRenderer::new(20, 10);
        let surface = BoxFactory.build_default().unwrap();
        let id = renderer.upload(&surface);
        assert_eq!(renderer.buffer_count(), 1);
        renderer.release(id);
        assert_eq!(renderer.buffer_count(), 0);

        let scene = Scene::default();
        let camera = Camera::new(20, 20);
        let frame = Frame {
            scene: &scene,
            camera: &camera,
            item: Some(paramview_core::DrawItem {
                handle: &id,
                model: Matrix4::identity(),
            }),
        };
        assert!(matches!(
            renderer.draw(&frame),
            Err(RenderError::Backend(_))
        ));
    }

    #[test]
    fn test_present_writes_every_row() {
        let renderer = AsciiRenderer::new(4, 3);
        let mut out = Vec::new();
        renderer.present(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("    ").count(), 3);
    }
}
