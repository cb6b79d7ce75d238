//! Surfaces defined by a function of `(u, v)` over the unit square

use std::f32::consts::{PI, TAU};

use nalgebra::{Point3, Vector3};

use super::{finish, grid, unit_or, GeometryFactory};
use crate::error::GeometryError;
use crate::geometry::{MeshBuilder, Surface};
use crate::params::ParameterRecord;

/// Step used for finite-difference normals.
const NORMAL_EPSILON: f32 = 1e-3;

const SURFACES: &[&str] = &["klein", "mobius", "plane"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceFn {
    Klein,
    Mobius,
    Plane,
}

impl SurfaceFn {
    fn parse(name: &str) -> Result<Self, GeometryError> {
        match name {
            "klein" => Ok(SurfaceFn::Klein),
            "mobius" => Ok(SurfaceFn::Mobius),
            "plane" => Ok(SurfaceFn::Plane),
            other => Err(GeometryError::invalid(
                "surface",
                format!("`{other}` is not one of {SURFACES:?}"),
            )),
        }
    }

    fn eval(self, u: f32, v: f32) -> Vector3<f32> {
        match self {
            SurfaceFn::Klein => klein(u, v) * 0.1,
            SurfaceFn::Mobius => mobius(u, v) * 0.5,
            SurfaceFn::Plane => Vector3::new(u - 0.5, 0.0, v - 0.5) * 2.0,
        }
    }

    fn normal(self, u: f32, v: f32) -> Vector3<f32> {
        let (u0, u1) = ((u - NORMAL_EPSILON).max(0.0), (u + NORMAL_EPSILON).min(1.0));
        let (v0, v1) = ((v - NORMAL_EPSILON).max(0.0), (v + NORMAL_EPSILON).min(1.0));
        let du = self.eval(u1, v) - self.eval(u0, v);
        let dv = self.eval(u, v1) - self.eval(u, v0);
        unit_or(du.cross(&dv), Vector3::y())
    }
}

fn klein(u: f32, v: f32) -> Vector3<f32> {
    let u = u * TAU;
    let v = v * TAU;
    let r = 2.0 * (1.0 - u.cos() / 2.0);
    let (x, z) = if u < PI {
        (
            3.0 * u.cos() * (1.0 + u.sin()) + r * u.cos() * v.cos(),
            -8.0 * u.sin() - r * u.sin() * v.cos(),
        )
    } else {
        (
            3.0 * u.cos() * (1.0 + u.sin()) + r * (v + PI).cos(),
            -8.0 * u.sin(),
        )
    };
    let y = -r * v.sin();
    Vector3::new(x, y, z)
}

fn mobius(u: f32, v: f32) -> Vector3<f32> {
    let u = u - 0.5;
    let v = v * TAU;
    let a = 2.0;
    Vector3::new(
        v.cos() * (a + u * (v / 2.0).cos()),
        v.sin() * (a + u * (v / 2.0).cos()),
        u * (v / 2.0).sin(),
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParametricFactory;

impl GeometryFactory for ParametricFactory {
    fn kind(&self) -> &'static str {
        "parametric"
    }

    fn schema(&self) -> ParameterRecord {
        ParameterRecord::new()
            .choice("surface", "klein", SURFACES)
            .count("slices", 25, 3, 64)
            .count("stacks", 25, 3, 64)
    }

    fn build(&self, params: &ParameterRecord) -> Result<Surface, GeometryError> {
        let surface = SurfaceFn::parse(params.get_text("surface")?)?;
        let slices = params.get_count("slices")?;
        let stacks = params.get_count("stacks")?;

        let mut builder = MeshBuilder::new();
        grid(&mut builder, slices, stacks, |col, row| {
            let u = col as f32 / slices as f32;
            let v = row as f32 / stacks as f32;
            (Point3::from(surface.eval(u, v)), surface.normal(u, v))
        });
        finish(builder, self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamInput;

    #[test]
    fn test_every_surface_builds() {
        for name in SURFACES {
            let mut params = ParametricFactory.schema();
            params.set("surface", ParamInput::Text(name.to_string())).unwrap();
            let surface = ParametricFactory.build(&params).unwrap();
            assert!(!surface.is_empty(), "{name}");
        }
    }

    #[test]
    fn test_plane_is_flat() {
        let mut params = ParametricFactory.schema();
        params.set("surface", "plane".into()).unwrap();
        params.set("slices", ParamInput::Number(4.0)).unwrap();
        params.set("stacks", ParamInput::Number(4.0)).unwrap();
        let surface = ParametricFactory.build(&params).unwrap();
        assert_eq!(surface.triangle_count(), 32);
        assert!(surface
            .mesh
            .triangles
            .iter()
            .all(|t| t.vertices.iter().all(|v| v.position.y == 0.0)));
    }

    #[test]
    fn test_unknown_surface_is_invalid() {
        assert!(SurfaceFn::parse("teapot").is_err());
    }
}
