//! Ring torus around the Z axis

use std::f32::consts::TAU;

use nalgebra::{Point3, Vector3};

use super::{finish, grid, sweep_field, unit_or, GeometryFactory};
use crate::error::GeometryError;
use crate::geometry::{MeshBuilder, Surface};
use crate::params::ParameterRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct TorusFactory;

impl GeometryFactory for TorusFactory {
    fn kind(&self) -> &'static str {
        "torus"
    }

    fn schema(&self) -> ParameterRecord {
        let record = ParameterRecord::new()
            .number("radius", 1.0, 0.1, 10.0, 0.1)
            .number("tube", 0.4, 0.05, 5.0, 0.05)
            .count("radialSegments", 12, 2, 30)
            .count("tubularSegments", 48, 3, 200);
        sweep_field(record, "arc", TAU, TAU)
    }

    fn build(&self, params: &ParameterRecord) -> Result<Surface, GeometryError> {
        let radius = params.get_number("radius")?;
        let tube = params.get_number("tube")?;
        let radial_segments = params.get_count("radialSegments")?;
        let tubular_segments = params.get_count("tubularSegments")?;
        let arc = params.get_number("arc")?;

        let mut builder = MeshBuilder::new();
        grid(&mut builder, tubular_segments, radial_segments, |col, row| {
            let u = col as f32 / tubular_segments as f32 * arc;
            let v = row as f32 / radial_segments as f32 * TAU;
            let ring = radius + tube * v.cos();
            let position = Point3::new(ring * u.cos(), ring * u.sin(), tube * v.sin());
            let center = Point3::new(radius * u.cos(), radius * u.sin(), 0.0);
            (position, unit_or(position - center, Vector3::z()))
        });
        finish(builder, self.kind())
    }
}
