//! Screen-space draw list for the 2D canvas: faces sorted back to front,
//! then lines on top.

use nalgebra::{Matrix4, Point3, Vector3};
use paramview_core::{Camera, Scene, Segment, Surface, Triangle, Vertex};

/// Light reaching faces turned away from the key light.
const AMBIENT: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face2d {
    pub points: [(f32, f32); 3],
    /// Mean NDC depth; larger is farther
    pub depth: f32,
    /// Shade in `[0, 1]`
    pub brightness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Grid,
    AxisX,
    AxisY,
    AxisZ,
    Wire,
}

impl LineKind {
    pub fn css_color(self) -> &'static str {
        match self {
            LineKind::Grid => "#444444",
            LineKind::AxisX => "#ff4040",
            LineKind::AxisY => "#40ff40",
            LineKind::AxisZ => "#4080ff",
            LineKind::Wire => "#e0e0e0",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line2d {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub kind: LineKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub faces: Vec<Face2d>,
    pub lines: Vec<Line2d>,
}

impl DrawList {
    /// Project the helpers and (optionally) one model into a `width` x
    /// `height` canvas.
    pub fn build(
        scene: &Scene,
        camera: &Camera,
        model: Option<(&Surface, &Matrix4<f32>)>,
        width: u32,
        height: u32,
    ) -> Self {
        let mut list = DrawList::default();
        let vp = camera.view_projection();
        let project = |p: &Point3<f32>, mvp: &Matrix4<f32>| {
            camera.project_to_screen(p, mvp, width, height)
        };

        if let Some(grid) = &scene.grid {
            for segment in grid.segments() {
                list.push_line(&segment, &vp, LineKind::Grid, &project);
            }
        }
        if let Some(axes) = &scene.axes {
            let kinds = [LineKind::AxisX, LineKind::AxisY, LineKind::AxisZ];
            for (segment, kind) in axes.segments().iter().zip(kinds) {
                list.push_line(segment, &vp, kind, &project);
            }
        }

        if let Some((surface, model)) = model {
            let mvp = vp * model;
            let light = scene.key_light();
            for triangle in &surface.mesh.triangles {
                let mut points = [(0.0, 0.0); 3];
                let mut depth = 0.0;
                let mut clipped = false;
                for (slot, vertex) in points.iter_mut().zip(&triangle.vertices) {
                    match project(&vertex.position, &mvp) {
                        Some((x, y, z)) => {
                            *slot = (x, y);
                            depth += z / 3.0;
                        }
                        None => clipped = true,
                    }
                }
                if clipped {
                    continue;
                }
                let Some(normal) = world_normal(triangle, model) else {
                    continue;
                };
                list.faces.push(Face2d {
                    points,
                    depth,
                    brightness: AMBIENT + (1.0 - AMBIENT) * normal.dot(&light).abs(),
                });
            }
            for segment in &surface.wireframe.segments {
                list.push_line(segment, &mvp, LineKind::Wire, &project);
            }
        }

        // Painter's order: farthest first
        list.faces.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        list
    }

    fn push_line<F>(&mut self, segment: &Segment, mvp: &Matrix4<f32>, kind: LineKind, project: &F)
    where
        F: Fn(&Point3<f32>, &Matrix4<f32>) -> Option<(f32, f32, f32)>,
    {
        if let (Some(a), Some(b)) = (project(&segment.start, mvp), project(&segment.end, mvp)) {
            self.lines.push(Line2d {
                from: (a.0, a.1),
                to: (b.0, b.1),
                kind,
            });
        }
    }
}

fn world_normal(triangle: &Triangle, model: &Matrix4<f32>) -> Option<Vector3<f32>> {
    let moved = |v: &Vertex| Vertex::from_parts(model.transform_point(&v.position), v.normal);
    let world = Triangle::new(
        moved(&triangle.vertices[0]),
        moved(&triangle.vertices[1]),
        moved(&triangle.vertices[2]),
    );
    (!world.is_degenerate()).then(|| world.calculate_normal())
}

/// `rgb(...)` gray for a brightness in `[0, 1]`.
pub fn shade_css(brightness: f32) -> String {
    let level = (brightness.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("rgb({level}, {level}, {level})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramview_core::scene::{AxesHelper, GridHelper};
    use paramview_core::shapes::BoxFactory;
    use paramview_core::GeometryFactory;

    #[test]
    fn test_box_draw_list() {
        let surface = BoxFactory.build_default().unwrap();
        let camera = Camera::new(400, 300);
        let scene = Scene::default();
        let model = Matrix4::identity();
        let list = DrawList::build(&scene, &camera, Some((&surface, &model)), 400, 300);

        assert_eq!(list.faces.len(), 12);
        assert_eq!(list.lines.len(), 18);
        assert!(list.lines.iter().all(|l| l.kind == LineKind::Wire));
        assert!(list.faces.windows(2).all(|w| w[0].depth >= w[1].depth));
        assert!(list
            .faces
            .iter()
            .all(|f| f.brightness >= AMBIENT && f.brightness <= 1.0 + 1e-6));
    }

    #[test]
    fn test_helpers_without_model() {
        let camera = Camera::new(400, 300);
        let scene = Scene {
            grid: Some(GridHelper::new(2.0, 2)),
            axes: Some(AxesHelper { size: 1.0 }),
            ..Scene::default()
        };
        let list = DrawList::build(&scene, &camera, None, 400, 300);
        assert!(list.faces.is_empty());
        assert_eq!(list.lines.len(), 6 + 3);
        assert_eq!(list.lines[6].kind, LineKind::AxisX);
    }

    #[test]
    fn test_shade_css() {
        assert_eq!(shade_css(0.0), "rgb(0, 0, 0)");
        assert_eq!(shade_css(2.0), "rgb(255, 255, 255)");
    }
}
