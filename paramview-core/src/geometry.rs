//! Geometry primitives shared by every shape factory and loader

use std::collections::HashSet;

use nalgebra::{Point3, Vector3};

/// A triangle is degenerate when its squared cross product falls below this
/// fraction of its longest edge to the fourth power.
const DEGENERATE_RATIO: f32 = 1e-10;

/// Wireframe endpoints are deduplicated on a grid of this resolution.
const EDGE_QUANTUM: f32 = 1e-4;

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }

    pub fn from_parts(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    fn cross(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let edge1 = self.vertices[1].position - v0;
        let edge2 = self.vertices[2].position - v0;
        edge1.cross(&edge2)
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        self.cross().normalize()
    }

    pub fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.vertices.map(|v| v.position);
        let longest = (b - a)
            .norm_squared()
            .max((c - a).norm_squared())
            .max((c - b).norm_squared());
        self.cross().norm_squared() <= DEGENERATE_RATIO * longest * longest
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let mut points = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter().map(|v| v.position));
        let first = points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| {
            (
                Point3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Point3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        }))
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Indexed vertex buffer that shape factories fill before flattening into a [`Mesh`].
///
/// Triangles whose corners collapse (sphere poles, cone tips) are dropped on
/// [`MeshBuilder::finish`].
#[derive(Debug, Default)]
pub struct MeshBuilder {
    vertices: Vec<Vertex>,
    indices: Vec<[u32; 3]>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a vertex and return its index.
    pub fn vertex(&mut self, position: Point3<f32>, normal: Vector3<f32>) -> u32 {
        self.vertices.push(Vertex::from_parts(position, normal));
        (self.vertices.len() - 1) as u32
    }

    pub fn triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.push([a, b, c]);
    }

    /// Two triangles `a b d` and `b c d` covering the quad `a b c d`.
    pub fn quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.triangle(a, b, d);
        self.triangle(b, c, d);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Offset every vertex added so far.
    pub fn translate(&mut self, offset: Vector3<f32>) {
        for vertex in &mut self.vertices {
            vertex.position += offset;
        }
    }

    /// Append another builder's contents, re-basing its indices.
    pub fn append(&mut self, other: MeshBuilder) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices
            .extend(other.indices.into_iter().map(|[a, b, c]| [a + base, b + base, c + base]));
    }

    pub fn finish(self) -> Mesh {
        let mut mesh = Mesh::with_capacity(self.indices.len());
        for [a, b, c] in self.indices {
            let triangle = Triangle::new(
                self.vertices[a as usize],
                self.vertices[b as usize],
                self.vertices[c as usize],
            );
            if !triangle.is_degenerate() {
                mesh.add_triangle(triangle);
            }
        }
        mesh
    }
}

/// A single line segment of a wireframe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point3<f32>,
    pub end: Point3<f32>,
}

/// Line-segment companion to a mesh: every distinct triangle edge once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wireframe {
    pub segments: Vec<Segment>,
}

impl Wireframe {
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let mut seen = HashSet::new();
        let mut segments = Vec::new();

        for triangle in &mesh.triangles {
            for i in 0..3 {
                let start = triangle.vertices[i].position;
                let end = triangle.vertices[(i + 1) % 3].position;
                let (a, b) = (quantize(&start), quantize(&end));
                let key = if a <= b { (a, b) } else { (b, a) };
                if seen.insert(key) {
                    segments.push(Segment { start, end });
                }
            }
        }

        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn quantize(p: &Point3<f32>) -> [i64; 3] {
    [
        (p.x / EDGE_QUANTUM).round() as i64,
        (p.y / EDGE_QUANTUM).round() as i64,
        (p.z / EDGE_QUANTUM).round() as i64,
    ]
}

/// A drawable surface: the shaded mesh and its wireframe overlay.
///
/// Produced by a shape factory or a model loader and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub mesh: Mesh,
    pub wireframe: Wireframe,
}

impl Surface {
    pub fn new(mesh: Mesh) -> Self {
        let wireframe = Wireframe::from_mesh(&mesh);
        Self { mesh, wireframe }
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> Mesh {
        let mut builder = MeshBuilder::new();
        let n = Vector3::z();
        let a = builder.vertex(Point3::new(0.0, 0.0, 0.0), n);
        let b = builder.vertex(Point3::new(1.0, 0.0, 0.0), n);
        let c = builder.vertex(Point3::new(1.0, 1.0, 0.0), n);
        let d = builder.vertex(Point3::new(0.0, 1.0, 0.0), n);
        builder.quad(a, b, c, d);
        builder.finish()
    }

    #[test]
    fn test_quad_is_two_triangles() {
        let mesh = unit_quad();
        assert_eq!(mesh.len(), 2);
        let normal = mesh.triangles[0].calculate_normal();
        assert!((normal - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn test_degenerate_triangles_dropped() {
        let mut builder = MeshBuilder::new();
        let n = Vector3::y();
        let a = builder.vertex(Point3::origin(), n);
        let b = builder.vertex(Point3::origin(), n);
        let c = builder.vertex(Point3::new(1.0, 0.0, 0.0), n);
        builder.triangle(a, b, c);
        assert!(builder.finish().is_empty());
    }

    #[test]
    fn test_wireframe_shares_diagonal() {
        // 4 outline edges + 1 shared diagonal
        let wire = Wireframe::from_mesh(&unit_quad());
        assert_eq!(wire.len(), 5);
    }

    #[test]
    fn test_bounds() {
        let (lo, hi) = unit_quad().bounds().unwrap();
        assert_eq!(lo, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(hi, Point3::new(1.0, 1.0, 0.0));
        assert!(Mesh::new().bounds().is_none());
    }

    #[test]
    fn test_append_rebases_indices() {
        let mut first = MeshBuilder::new();
        let n = Vector3::z();
        let a = first.vertex(Point3::new(0.0, 0.0, 0.0), n);
        let b = first.vertex(Point3::new(1.0, 0.0, 0.0), n);
        let c = first.vertex(Point3::new(0.0, 1.0, 0.0), n);
        first.triangle(a, b, c);

        let mut second = MeshBuilder::new();
        let a = second.vertex(Point3::new(0.0, 0.0, 1.0), n);
        let b = second.vertex(Point3::new(1.0, 0.0, 1.0), n);
        let c = second.vertex(Point3::new(0.0, 1.0, 1.0), n);
        second.triangle(a, b, c);

        first.append(second);
        let mesh = first.finish();
        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh.triangles[1].vertices[0].position.z, 1.0);
    }
}
