//! Procedural shape factories and the registry that names them.

use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::fmt;
use std::sync::Arc;

use nalgebra::{Point3, Vector3};

use crate::error::GeometryError;
use crate::geometry::{MeshBuilder, Surface};
use crate::params::ParameterRecord;

const MIN_SWEEP: f32 = 0.1;

mod box_geometry;
mod circle;
mod cylinder;
mod extrude;
mod lathe;
mod parametric;
mod sphere;
mod text;
mod torus;

pub use box_geometry::BoxFactory;
pub use circle::CircleFactory;
pub use cylinder::{ConeFactory, CylinderFactory};
pub use extrude::ExtrudeFactory;
pub use lathe::LatheFactory;
pub use parametric::ParametricFactory;
pub use sphere::SphereFactory;
pub use text::TextFactory;
pub use torus::TorusFactory;

/// Builds a [`Surface`] from a parameter record.
///
/// `build` is pure: the same record always yields the same surface. It fails
/// with [`GeometryError::InvalidParameter`] when a field is missing, has the
/// wrong type or lies outside the declared domain.
pub trait GeometryFactory: Send + Sync {
    /// Registry key, e.g. `"box"`.
    fn kind(&self) -> &'static str;

    /// Field list with defaults, in display order.
    fn schema(&self) -> ParameterRecord;

    fn build(&self, params: &ParameterRecord) -> Result<Surface, GeometryError>;

    fn build_default(&self) -> Result<Surface, GeometryError> {
        self.build(&self.schema())
    }
}

impl fmt::Debug for dyn GeometryFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryFactory")
            .field("kind", &self.kind())
            .finish()
    }
}

/// Factories keyed by shape name
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    factories: BTreeMap<&'static str, Arc<dyn GeometryFactory>>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in shape.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BoxFactory));
        registry.register(Arc::new(SphereFactory));
        registry.register(Arc::new(TorusFactory));
        registry.register(Arc::new(CylinderFactory));
        registry.register(Arc::new(ConeFactory));
        registry.register(Arc::new(CircleFactory));
        registry.register(Arc::new(LatheFactory));
        registry.register(Arc::new(ExtrudeFactory));
        registry.register(Arc::new(TextFactory));
        registry.register(Arc::new(ParametricFactory));
        registry
    }

    /// Add a factory, replacing any previous one of the same kind.
    pub fn register(&mut self, factory: Arc<dyn GeometryFactory>) {
        self.factories.insert(factory.kind(), factory);
    }

    pub fn get(&self, kind: &str) -> Result<Arc<dyn GeometryFactory>, GeometryError> {
        self.factories
            .get(kind)
            .cloned()
            .ok_or_else(|| GeometryError::UnknownShape(kind.to_string()))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Start angle in radians over `[0, 2π]`.
fn angle_field(record: ParameterRecord, name: &str, default: f32) -> ParameterRecord {
    record.number(name, default, 0.0, TAU, 0.01)
}

/// Sweep length in radians; never zero so the sweep always has area.
fn sweep_field(record: ParameterRecord, name: &str, default: f32, max: f32) -> ParameterRecord {
    record.number(name, default, MIN_SWEEP, max, 0.01)
}

/// Fill a `(cols + 1) x (rows + 1)` vertex grid from `f(col, row)` and stitch
/// it into quads.
fn grid<F>(builder: &mut MeshBuilder, cols: u32, rows: u32, f: F)
where
    F: Fn(u32, u32) -> (Point3<f32>, Vector3<f32>),
{
    let mut indices = Vec::with_capacity(((cols + 1) * (rows + 1)) as usize);
    for row in 0..=rows {
        for col in 0..=cols {
            let (position, normal) = f(col, row);
            indices.push(builder.vertex(position, normal));
        }
    }

    let stride = cols + 1;
    let at = |col: u32, row: u32| indices[(row * stride + col) as usize];
    for row in 0..rows {
        for col in 0..cols {
            let a = at(col + 1, row);
            let b = at(col, row);
            let c = at(col, row + 1);
            let d = at(col + 1, row + 1);
            builder.quad(a, b, c, d);
        }
    }
}

/// Normalize or fall back to `fallback` for zero-length input.
fn unit_or(v: Vector3<f32>, fallback: Vector3<f32>) -> Vector3<f32> {
    v.try_normalize(1e-12).unwrap_or(fallback)
}

/// Convert a finished builder into a surface, refusing empty output.
fn finish(builder: MeshBuilder, kind: &str) -> Result<Surface, GeometryError> {
    let mesh = builder.finish();
    if mesh.is_empty() {
        return Err(GeometryError::invalid(kind, "parameters produce no drawable faces"));
    }
    Ok(Surface::new(mesh))
}
