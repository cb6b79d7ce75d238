//! UV sphere, optionally cut to a partial sweep

use std::f32::consts::{PI, TAU};

use nalgebra::{Point3, Vector3};

use super::{angle_field, finish, grid, sweep_field, unit_or, GeometryFactory};
use crate::error::GeometryError;
use crate::geometry::{MeshBuilder, Surface};
use crate::params::ParameterRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct SphereFactory;

impl GeometryFactory for SphereFactory {
    fn kind(&self) -> &'static str {
        "sphere"
    }

    fn schema(&self) -> ParameterRecord {
        let record = ParameterRecord::new()
            .number("radius", 1.0, 0.1, 10.0, 0.1)
            .count("widthSegments", 32, 3, 64)
            .count("heightSegments", 16, 2, 32);
        let record = angle_field(record, "phiStart", 0.0);
        let record = sweep_field(record, "phiLength", TAU, TAU);
        let record = angle_field(record, "thetaStart", 0.0);
        sweep_field(record, "thetaLength", PI, PI)
    }

    fn build(&self, params: &ParameterRecord) -> Result<Surface, GeometryError> {
        let radius = params.get_number("radius")?;
        let width_segments = params.get_count("widthSegments")?;
        let height_segments = params.get_count("heightSegments")?;
        let phi_start = params.get_number("phiStart")?;
        let phi_length = params.get_number("phiLength")?;
        let theta_start = params.get_number("thetaStart")?;
        let theta_length = params.get_number("thetaLength")?;

        let mut builder = MeshBuilder::new();
        grid(&mut builder, width_segments, height_segments, |col, row| {
            let u = col as f32 / width_segments as f32;
            let v = row as f32 / height_segments as f32;
            let phi = phi_start + u * phi_length;
            let theta = theta_start + v * theta_length;
            let direction = Vector3::new(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            );
            (
                Point3::from(direction * radius),
                unit_or(direction, Vector3::y()),
            )
        });
        finish(builder, self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamInput;

    #[test]
    fn test_vertices_lie_on_radius() {
        let mut params = SphereFactory.schema();
        params.set("radius", ParamInput::Number(2.0)).unwrap();
        let surface = SphereFactory.build(&params).unwrap();
        for triangle in &surface.mesh.triangles {
            for vertex in &triangle.vertices {
                assert!((vertex.position.coords.norm() - 2.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_pole_triangles_collapse() {
        let surface = SphereFactory.build_default().unwrap();
        // one triangle per segment in each polar row, two elsewhere
        assert_eq!(surface.triangle_count(), 32 * 2 * (16 - 2) + 32 * 2);
    }
}
