//! Flat disc (or sector) in the XY plane

use std::f32::consts::TAU;

use nalgebra::{Point3, Vector3};

use super::{angle_field, finish, sweep_field, GeometryFactory};
use crate::error::GeometryError;
use crate::geometry::{MeshBuilder, Surface};
use crate::params::ParameterRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct CircleFactory;

impl GeometryFactory for CircleFactory {
    fn kind(&self) -> &'static str {
        "circle"
    }

    fn schema(&self) -> ParameterRecord {
        let record = ParameterRecord::new()
            .number("radius", 1.0, 0.1, 10.0, 0.1)
            .count("segments", 24, 3, 128);
        let record = angle_field(record, "thetaStart", 0.0);
        sweep_field(record, "thetaLength", TAU, TAU)
    }

    fn build(&self, params: &ParameterRecord) -> Result<Surface, GeometryError> {
        let radius = params.get_number("radius")?;
        let segments = params.get_count("segments")?;
        let theta_start = params.get_number("thetaStart")?;
        let theta_length = params.get_number("thetaLength")?;

        let normal = Vector3::z();
        let mut builder = MeshBuilder::new();
        let center = builder.vertex(Point3::origin(), normal);
        let mut previous = None;
        for i in 0..=segments {
            let theta = theta_start + i as f32 / segments as f32 * theta_length;
            let (sin, cos) = theta.sin_cos();
            let current = builder.vertex(Point3::new(radius * cos, radius * sin, 0.0), normal);
            if let Some(previous) = previous {
                builder.triangle(center, previous, current);
            }
            previous = Some(current);
        }
        finish(builder, self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_triangle_per_segment() {
        let surface = CircleFactory.build_default().unwrap();
        assert_eq!(surface.triangle_count(), 24);
        // spokes + rim, with the closing spoke shared by first and last
        assert_eq!(surface.wireframe.len(), 24 + 24);
        assert!(surface
            .mesh
            .triangles
            .iter()
            .all(|t| t.calculate_normal().z > 0.99));
    }
}
