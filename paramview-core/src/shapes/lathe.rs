//! Surface of revolution of a vase-like profile around the Y axis

use std::f32::consts::{PI, TAU};

use nalgebra::{Point3, Vector2, Vector3};

use super::{angle_field, finish, grid, sweep_field, unit_or, GeometryFactory};
use crate::error::GeometryError;
use crate::geometry::{MeshBuilder, Surface};
use crate::params::ParameterRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct LatheFactory;

/// `count` samples of a vase wall two units tall, centered on y = 0.
fn profile(count: u32) -> Vec<Vector2<f32>> {
    let last = (count - 1).max(1) as f32;
    (0..count)
        .map(|i| {
            let t = i as f32 / last;
            Vector2::new((t * PI * 1.5).sin() * 0.3 + 0.4, (t - 0.5) * 2.0)
        })
        .collect()
}

/// Outward 2D normal of the profile at sample `i`.
fn profile_normal(points: &[Vector2<f32>], i: usize) -> Vector2<f32> {
    let prev = points[i.saturating_sub(1)];
    let next = points[(i + 1).min(points.len() - 1)];
    let tangent = next - prev;
    let normal = Vector2::new(tangent.y, -tangent.x);
    normal.try_normalize(1e-12).unwrap_or_else(Vector2::x)
}

impl GeometryFactory for LatheFactory {
    fn kind(&self) -> &'static str {
        "lathe"
    }

    fn schema(&self) -> ParameterRecord {
        let record = ParameterRecord::new()
            .count("segments", 12, 3, 64)
            .count("points", 10, 2, 32);
        let record = angle_field(record, "phiStart", 0.0);
        sweep_field(record, "phiLength", TAU, TAU)
    }

    fn build(&self, params: &ParameterRecord) -> Result<Surface, GeometryError> {
        let segments = params.get_count("segments")?;
        let count = params.get_count("points")?;
        let phi_start = params.get_number("phiStart")?;
        let phi_length = params.get_number("phiLength")?;

        let points = profile(count);
        let normals: Vec<_> = (0..points.len()).map(|i| profile_normal(&points, i)).collect();

        let mut builder = MeshBuilder::new();
        grid(&mut builder, segments, count - 1, |col, row| {
            let phi = phi_start + col as f32 / segments as f32 * phi_length;
            let (sin, cos) = phi.sin_cos();
            let p = points[row as usize];
            let n = normals[row as usize];
            (
                Point3::new(p.x * sin, p.y, p.x * cos),
                unit_or(Vector3::new(n.x * sin, n.y, n.x * cos), Vector3::y()),
            )
        });
        finish(builder, self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_is_centered() {
        let points = profile(10);
        assert!((points[0].y + points[9].y).abs() < 1e-6);
        assert!(points.iter().all(|p| p.x > 0.0));
    }

    #[test]
    fn test_default_lathe_counts() {
        let surface = LatheFactory.build_default().unwrap();
        assert_eq!(surface.triangle_count(), 12 * 9 * 2);
    }
}
