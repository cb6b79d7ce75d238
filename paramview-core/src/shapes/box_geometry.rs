//! Axis-aligned box with per-face subdivision

use nalgebra::{Point3, Vector3};

use super::{finish, GeometryFactory};
use crate::error::GeometryError;
use crate::geometry::{MeshBuilder, Surface};
use crate::params::ParameterRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct BoxFactory;

impl GeometryFactory for BoxFactory {
    fn kind(&self) -> &'static str {
        "box"
    }

    fn schema(&self) -> ParameterRecord {
        ParameterRecord::new()
            .number("width", 1.0, 0.1, 10.0, 0.1)
            .number("height", 1.0, 0.1, 10.0, 0.1)
            .number("depth", 1.0, 0.1, 10.0, 0.1)
            .count("widthSegments", 1, 1, 10)
            .count("heightSegments", 1, 1, 10)
            .count("depthSegments", 1, 1, 10)
    }

    fn build(&self, params: &ParameterRecord) -> Result<Surface, GeometryError> {
        let size = Vector3::new(
            params.get_number("width")?,
            params.get_number("height")?,
            params.get_number("depth")?,
        );
        let segments = [
            params.get_count("widthSegments")?,
            params.get_count("heightSegments")?,
            params.get_count("depthSegments")?,
        ];

        let mut builder = MeshBuilder::new();
        cuboid(&mut builder, Point3::origin(), size, segments);
        finish(builder, self.kind())
    }
}

/// Append a box centered on `center`. `segments` are per axis (x, y, z).
pub(crate) fn cuboid(
    builder: &mut MeshBuilder,
    center: Point3<f32>,
    size: Vector3<f32>,
    segments: [u32; 3],
) {
    let half = size / 2.0;
    let x = Vector3::x();
    let y = Vector3::y();
    let z = Vector3::z();

    // (normal, u axis, v axis) with u x v == normal, plus the matching
    // extents and segment counts along u and v.
    let faces = [
        (x, -z, y, half.x, size.z, size.y, segments[2], segments[1]),
        (-x, z, y, half.x, size.z, size.y, segments[2], segments[1]),
        (y, x, -z, half.y, size.x, size.z, segments[0], segments[2]),
        (-y, x, z, half.y, size.x, size.z, segments[0], segments[2]),
        (z, x, y, half.z, size.x, size.y, segments[0], segments[1]),
        (-z, -x, y, half.z, size.x, size.y, segments[0], segments[1]),
    ];

    for (normal, u, v, offset, su, sv, cols, rows) in faces {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let origin = center + normal * offset;
        let mut indices = Vec::with_capacity(((cols + 1) * (rows + 1)) as usize);
        for row in 0..=rows {
            let t = row as f32 / rows as f32 - 0.5;
            for col in 0..=cols {
                let s = col as f32 / cols as f32 - 0.5;
                let position = origin + u * (s * su) + v * (t * sv);
                indices.push(builder.vertex(position, normal));
            }
        }
        let stride = cols + 1;
        for row in 0..rows {
            for col in 0..cols {
                let a = indices[(row * stride + col) as usize];
                let b = indices[(row * stride + col + 1) as usize];
                let c = indices[((row + 1) * stride + col + 1) as usize];
                let d = indices[((row + 1) * stride + col) as usize];
                builder.quad(a, b, c, d);
            }
        }
    }
}
